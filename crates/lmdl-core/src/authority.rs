//! Authority resolution: IRI namespaces to field-name prefixes.
//!
//! Every field name in the index starts with a short prefix token that stands
//! for the namespace its property IRI lives in. The mapping is a fixed table;
//! an IRI whose namespace is not in the table cannot be given a field name
//! without risking collisions, so resolution fails instead of guessing.
//!
//! ```
//! use lmdl_core::AuthorityResolver;
//!
//! let authorities = AuthorityResolver::new();
//! let resolved = authorities
//!     .resolve("http://www.wikidata.org/prop/direct/P86")
//!     .unwrap();
//! assert_eq!(resolved.authority.prefix, "wdt");
//! assert_eq!(resolved.local, "P86");
//! assert_eq!(resolved.field_base(), "wdt_P86");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::labels::LabelKind;

/// Namespace of Wikidata entities (items and properties as entities).
pub const ENTITY_NAMESPACE: &str = "http://www.wikidata.org/entity/";

/// Namespace of Wikidata direct properties.
pub const PROPERTY_NAMESPACE: &str = "http://www.wikidata.org/prop/direct/";

/// What kind of namespace an authority is.
///
/// Only `Entity` and `Property` authorities have labels in the external
/// label service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityRole {
    /// Entity namespace (Wikidata items).
    Entity,
    /// Direct-property namespace (Wikidata properties).
    Property,
    /// Shared vocabulary such as schema.org.
    Vocabulary,
    /// A source database's own namespace.
    Source,
}

impl AuthorityRole {
    /// Whether identifiers under this authority can be labelled.
    pub fn is_labelled(&self) -> bool {
        matches!(self, Self::Entity | Self::Property)
    }
}

/// One row of the authority table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Namespace stem including its trailing `/`.
    pub namespace: String,
    /// Field-name prefix token.
    pub prefix: String,
    /// Kind of namespace.
    pub role: AuthorityRole,
}

impl Authority {
    /// Create an authority entry.
    pub fn new(namespace: impl Into<String>, prefix: impl Into<String>, role: AuthorityRole) -> Self {
        Self {
            namespace: namespace.into(),
            prefix: prefix.into(),
            role,
        }
    }

    /// Full IRI for a local name under this authority.
    pub fn iri(&self, local: &str) -> String {
        format!("{}{local}", self.namespace)
    }

    /// Field base name (`<prefix>_<local>`) for a local name.
    pub fn field_base(&self, local: &str) -> String {
        format!("{}_{local}", self.prefix)
    }
}

const BUILTIN_AUTHORITIES: &[(&str, &str, AuthorityRole)] = &[
    (ENTITY_NAMESPACE, "wd", AuthorityRole::Entity),
    (PROPERTY_NAMESPACE, "wdt", AuthorityRole::Property),
    ("https://schema.org/", "schema", AuthorityRole::Vocabulary),
    ("https://cantusdatabase.org/chant/", "cdb_chant", AuthorityRole::Source),
    ("https://cantusdatabase.org/source/", "cdb_source", AuthorityRole::Source),
    ("https://cantusdatabase.org/about/", "cdb", AuthorityRole::Source),
    ("https://cantusindex.org/id/", "cid", AuthorityRole::Source),
    ("https://db.simssa.ca/files/", "simssadb_file", AuthorityRole::Source),
    (
        "https://db.simssa.ca/musicalworks/",
        "simssadb_musicalwork",
        AuthorityRole::Source,
    ),
    ("https://thesession.org/tunes/", "thesession_tune", AuthorityRole::Source),
    (
        "https://thesession.org/tunes/popular/",
        "thesession_popular",
        AuthorityRole::Source,
    ),
];

/// Shape of a bare identifier, used to pick an authority for selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierShape {
    /// `P` followed by digits.
    Property,
    /// `Q` followed by digits.
    Entity,
    /// Anything else.
    Other,
}

impl IdentifierShape {
    /// Classify a bare identifier.
    pub fn of(id: &str) -> Self {
        let mut chars = id.chars();
        let head = chars.next();
        let rest = chars.as_str();
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Other;
        }
        match head {
            Some('P') => Self::Property,
            Some('Q') => Self::Entity,
            _ => Self::Other,
        }
    }
}

/// An IRI split into its authority and local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIri<'a> {
    /// Matching authority table entry.
    pub authority: &'a Authority,
    /// Last path segment of the IRI.
    pub local: &'a str,
}

impl ResolvedIri<'_> {
    /// Field base name (`<prefix>_<local>`).
    pub fn field_base(&self) -> String {
        self.authority.field_base(self.local)
    }

    /// Label partition this identifier belongs to, if it is labelled at all.
    pub fn label_kind(&self) -> Option<LabelKind> {
        label_kind(self.authority, self.local)
    }
}

/// Label partition for a local identifier under an authority.
///
/// Property-authority identifiers and property-shaped entity identifiers
/// (`wd:P2561`) are properties; other entity identifiers are items.
pub fn label_kind(authority: &Authority, local: &str) -> Option<LabelKind> {
    match authority.role {
        AuthorityRole::Property => Some(LabelKind::Property),
        AuthorityRole::Entity if IdentifierShape::of(local) == IdentifierShape::Property => {
            Some(LabelKind::Property)
        }
        AuthorityRole::Entity => Some(LabelKind::Item),
        _ => None,
    }
}

/// Lookup table from IRI namespaces to field-name prefixes.
#[derive(Debug, Clone)]
pub struct AuthorityResolver {
    authorities: Vec<Authority>,
    by_namespace: HashMap<String, usize>,
    by_prefix: HashMap<String, usize>,
}

impl AuthorityResolver {
    /// Resolver with the built-in authority table.
    pub fn new() -> Self {
        let mut resolver = Self {
            authorities: Vec::with_capacity(BUILTIN_AUTHORITIES.len()),
            by_namespace: HashMap::new(),
            by_prefix: HashMap::new(),
        };
        for (namespace, prefix, role) in BUILTIN_AUTHORITIES {
            resolver.insert(Authority::new(*namespace, *prefix, *role));
        }
        resolver
    }

    /// Register an additional authority.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the namespace or prefix is already
    /// taken, or the namespace does not end with `/`.
    pub fn with_authority(mut self, authority: Authority) -> Result<Self> {
        if !authority.namespace.ends_with('/') {
            return Err(Error::config(format!(
                "Authority namespace '{}' must end with '/'",
                authority.namespace
            )));
        }
        if authority.prefix.is_empty() {
            return Err(Error::config(format!(
                "Authority '{}' has an empty prefix",
                authority.namespace
            )));
        }
        if self.by_namespace.contains_key(&authority.namespace) {
            return Err(Error::config(format!(
                "Authority namespace '{}' is already registered",
                authority.namespace
            )));
        }
        if self.by_prefix.contains_key(&authority.prefix) {
            return Err(Error::config(format!(
                "Authority prefix '{}' is already registered",
                authority.prefix
            )));
        }
        self.insert(authority);
        Ok(self)
    }

    fn insert(&mut self, authority: Authority) {
        let idx = self.authorities.len();
        self.by_namespace.insert(authority.namespace.clone(), idx);
        self.by_prefix.insert(authority.prefix.clone(), idx);
        self.authorities.push(authority);
    }

    /// All registered authorities, built-ins first.
    pub fn authorities(&self) -> &[Authority] {
        &self.authorities
    }

    /// Split an IRI at its last path segment and look up the namespace.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAuthority`] when the namespace is not in the table,
    /// [`Error::InvalidDocument`] when the IRI has no local name.
    pub fn resolve<'a>(&'a self, iri: &'a str) -> Result<ResolvedIri<'a>> {
        let Some(pos) = iri.rfind('/') else {
            return Err(Error::unknown_authority(iri, ""));
        };
        let (stem, local) = iri.split_at(pos + 1);
        let idx = self
            .by_namespace
            .get(stem)
            .ok_or_else(|| Error::unknown_authority(iri, stem))?;
        if local.is_empty() {
            return Err(Error::invalid_document(format!(
                "IRI '{iri}' has no local name"
            )));
        }
        Ok(ResolvedIri {
            authority: &self.authorities[*idx],
            local,
        })
    }

    /// Prefix token for an IRI's namespace.
    pub fn prefix<'a>(&'a self, iri: &'a str) -> Result<&'a str> {
        Ok(self.resolve(iri)?.authority.prefix.as_str())
    }

    /// Authority registered under a prefix token.
    pub fn by_prefix(&self, prefix: &str) -> Option<&Authority> {
        self.by_prefix.get(prefix).map(|idx| &self.authorities[*idx])
    }

    /// First authority with the given role.
    pub fn by_role(&self, role: AuthorityRole) -> Option<&Authority> {
        self.authorities.iter().find(|a| a.role == role)
    }

    fn required_role(&self, role: AuthorityRole) -> Result<&Authority> {
        self.by_role(role)
            .ok_or_else(|| Error::config(format!("No {role:?} authority registered")))
    }

    /// The entity authority (`wd`).
    pub fn entity(&self) -> Result<&Authority> {
        self.required_role(AuthorityRole::Entity)
    }

    /// The direct-property authority (`wdt`).
    pub fn property(&self) -> Result<&Authority> {
        self.required_role(AuthorityRole::Property)
    }

    /// Split a field base name back into its authority and local name.
    ///
    /// Prefixes may contain underscores (`cdb_chant`), so the longest
    /// registered prefix wins.
    pub fn split_field_base<'a>(&self, base: &'a str) -> Option<(&Authority, &'a str)> {
        self.authorities
            .iter()
            .filter_map(|authority| {
                let local = base
                    .strip_prefix(authority.prefix.as_str())?
                    .strip_prefix('_')?;
                (!local.is_empty()).then_some((authority, local))
            })
            .max_by_key(|(authority, _)| authority.prefix.len())
    }

    /// Authority for a bare selector identifier, chosen by its shape.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] for identifiers that are neither
    /// property-shaped nor entity-shaped.
    pub fn selector_authority(&self, selector: &str) -> Result<&Authority> {
        match IdentifierShape::of(selector) {
            IdentifierShape::Property => self.property(),
            IdentifierShape::Entity => self.entity(),
            IdentifierShape::Other => Err(Error::invalid_selector(selector)),
        }
    }

    /// Field base name for a bare selector identifier (`P86` → `wdt_P86`).
    pub fn selector_base(&self, selector: &str) -> Result<String> {
        Ok(self.selector_authority(selector)?.field_base(selector))
    }

    /// Full IRI for a bare selector identifier.
    pub fn selector_iri(&self, selector: &str) -> Result<String> {
        Ok(self.selector_authority(selector)?.iri(selector))
    }
}

impl Default for AuthorityResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // resolve tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_property() {
        let resolver = AuthorityResolver::new();
        let resolved = resolver
            .resolve("http://www.wikidata.org/prop/direct/P136")
            .unwrap();
        assert_eq!(resolved.authority.prefix, "wdt");
        assert_eq!(resolved.local, "P136");
        assert_eq!(resolved.field_base(), "wdt_P136");
        assert_eq!(resolved.label_kind(), Some(LabelKind::Property));
    }

    #[test]
    fn test_resolve_source_namespace() {
        let resolver = AuthorityResolver::new();
        assert_eq!(
            resolver.prefix("https://cantusdatabase.org/chant/123456").unwrap(),
            "cdb_chant"
        );
        assert_eq!(
            resolver.prefix("https://thesession.org/tunes/popular/12").unwrap(),
            "thesession_popular"
        );
        assert_eq!(
            resolver.prefix("https://thesession.org/tunes/12").unwrap(),
            "thesession_tune"
        );
    }

    #[test]
    fn test_prefix_for_built_iri() {
        let resolver = AuthorityResolver::new();
        let iri = resolver.entity().unwrap().iri("Q1339");
        let prefix = resolver.prefix(&iri).unwrap();
        assert_eq!(prefix, "wd");
        assert!(resolver.prefix("https://example.org/x").is_err());
    }

    #[test]
    fn test_resolve_unknown_authority() {
        let resolver = AuthorityResolver::new();
        let err = resolver.resolve("https://example.org/vocab/thing").unwrap_err();
        match err {
            Error::UnknownAuthority { iri, stem } => {
                assert_eq!(iri, "https://example.org/vocab/thing");
                assert_eq!(stem, "https://example.org/vocab/");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_without_slash() {
        let resolver = AuthorityResolver::new();
        assert!(matches!(
            resolver.resolve("urn:isbn:123"),
            Err(Error::UnknownAuthority { .. })
        ));
    }

    #[test]
    fn test_resolve_empty_local_name() {
        let resolver = AuthorityResolver::new();
        assert!(matches!(
            resolver.resolve("https://schema.org/"),
            Err(Error::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_label_kind_partitions() {
        let resolver = AuthorityResolver::new();
        let item = resolver.resolve("http://www.wikidata.org/entity/Q1339").unwrap();
        assert_eq!(item.label_kind(), Some(LabelKind::Item));

        let display = resolver.resolve("http://www.wikidata.org/entity/P2561").unwrap();
        assert_eq!(display.label_kind(), Some(LabelKind::Property));

        let schema = resolver.resolve("https://schema.org/name").unwrap();
        assert_eq!(schema.label_kind(), None);
    }

    // ------------------------------------------------------------------------
    // Registration tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_with_authority() {
        let resolver = AuthorityResolver::new()
            .with_authority(Authority::new(
                "https://musicbrainz.org/work/",
                "mb_work",
                AuthorityRole::Source,
            ))
            .unwrap();
        assert_eq!(
            resolver.prefix("https://musicbrainz.org/work/abc").unwrap(),
            "mb_work"
        );
        assert_eq!(
            resolver.by_prefix("mb_work").unwrap().namespace,
            "https://musicbrainz.org/work/"
        );
    }

    #[test]
    fn test_with_authority_rejects_duplicates() {
        let dup_ns = AuthorityResolver::new().with_authority(Authority::new(
            ENTITY_NAMESPACE,
            "other",
            AuthorityRole::Entity,
        ));
        assert!(dup_ns.unwrap_err().to_string().contains("already registered"));

        let dup_prefix = AuthorityResolver::new().with_authority(Authority::new(
            "https://example.org/",
            "wd",
            AuthorityRole::Source,
        ));
        assert!(dup_prefix.is_err());
    }

    #[test]
    fn test_with_authority_requires_trailing_slash() {
        let result = AuthorityResolver::new().with_authority(Authority::new(
            "https://example.org/ns",
            "ex",
            AuthorityRole::Source,
        ));
        assert!(result.is_err());
    }

    // ------------------------------------------------------------------------
    // Field base / selector tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_split_field_base_longest_prefix() {
        let resolver = AuthorityResolver::new();
        let (authority, local) = resolver.split_field_base("cdb_chant_genre").unwrap();
        assert_eq!(authority.prefix, "cdb_chant");
        assert_eq!(local, "genre");

        let (authority, local) = resolver.split_field_base("wdt_P86").unwrap();
        assert_eq!(authority.prefix, "wdt");
        assert_eq!(local, "P86");

        assert!(resolver.split_field_base("unknown_field").is_none());
        assert!(resolver.split_field_base("wd_").is_none());
    }

    #[test]
    fn test_identifier_shape() {
        assert_eq!(IdentifierShape::of("P86"), IdentifierShape::Property);
        assert_eq!(IdentifierShape::of("Q1339"), IdentifierShape::Entity);
        assert_eq!(IdentifierShape::of("Q"), IdentifierShape::Other);
        assert_eq!(IdentifierShape::of("P8a"), IdentifierShape::Other);
        assert_eq!(IdentifierShape::of("name"), IdentifierShape::Other);
        assert_eq!(IdentifierShape::of(""), IdentifierShape::Other);
    }

    #[test]
    fn test_selector_base_and_iri() {
        let resolver = AuthorityResolver::new();
        assert_eq!(resolver.selector_base("P86").unwrap(), "wdt_P86");
        assert_eq!(resolver.selector_base("Q5").unwrap(), "wd_Q5");
        assert_eq!(
            resolver.selector_iri("P826").unwrap(),
            "http://www.wikidata.org/prop/direct/P826"
        );
        assert_eq!(
            resolver.selector_iri("Q731978").unwrap(),
            "http://www.wikidata.org/entity/Q731978"
        );
        assert!(matches!(
            resolver.selector_base("genre"),
            Err(Error::InvalidSelector { .. })
        ));
    }
}
