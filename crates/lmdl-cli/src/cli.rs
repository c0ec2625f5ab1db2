//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LinkedMusic data lake search: index JSON-LD into Solr and query it.
#[derive(Parser, Debug)]
#[command(name = "lmdl", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true, env = "LMDL_CONFIG")]
    pub config: Option<String>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index an expanded JSON-LD file.
    Index {
        /// Path to the expanded JSON-LD document list.
        file: PathBuf,

        /// Also index labels for every referenced property and entity.
        #[arg(long)]
        labels: bool,
    },

    /// Index the configured similar-terms groups.
    SimilarTerms,

    /// Delete every document in the core.
    Reset {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Search the index.
    Search {
        /// Free text; empty lists the selectable fields and types.
        #[arg(default_value = "")]
        text: String,

        /// Field selector (`P86`, `wdt_P86`); repeatable.
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Type selector (`Q5`, `wd_Q5`).
        #[arg(short = 't', long = "type")]
        type_filter: Option<String>,

        /// Offset of the first result.
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Print the whole page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the configuration file.
    Config {
        /// Config action.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `lmdl config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config file path.
    Path,

    /// Print a value by dotted key (`solr.core`).
    Get {
        /// Dotted key.
        key: String,
    },

    /// Set a value by dotted key in the config file.
    Set {
        /// Dotted key.
        key: String,
        /// New value.
        value: String,
    },

    /// Write a default config file.
    Init {
        /// Where to write it instead of the default location.
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Print overridable settings as environment variables.
    Export {
        /// Format as `--env KEY=VALUE` for docker.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
