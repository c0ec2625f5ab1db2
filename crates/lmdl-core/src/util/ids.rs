//! Identifier utilities.
//!
//! Small string helpers shared by the encoder, the expander and the
//! related-terms lookup: taking IRIs apart, synthesizing identifiers for
//! anonymous nested nodes, and turning field names into fallback labels.

/// Last path segment of an IRI.
///
/// # Examples
///
/// ```
/// use lmdl_core::util::ids::local_name;
///
/// assert_eq!(local_name("http://www.wikidata.org/entity/Q1339"), "Q1339");
/// assert_eq!(local_name("Q1339"), "Q1339");
/// assert_eq!(local_name("https://schema.org/"), "");
/// ```
pub fn local_name(iri: &str) -> &str {
    iri.rsplit_once('/').map_or(iri, |(_, local)| local)
}

/// Identifier for a nested element without one of its own.
///
/// # Examples
///
/// ```
/// use lmdl_core::util::ids::nested_id;
///
/// assert_eq!(
///     nested_id("https://thesession.org/tunes/2", "schema_keywords", 1),
///     "https://thesession.org/tunes/2#schema_keywords-1"
/// );
/// ```
pub fn nested_id(parent: &str, base: &str, index: usize) -> String {
    format!("{parent}#{base}-{index}")
}

/// Readable fallback label for a field base name.
///
/// Underscores become spaces and surrounding whitespace is dropped.
///
/// # Examples
///
/// ```
/// use lmdl_core::util::ids::humanize_field;
///
/// assert_eq!(humanize_field("wdt_P86"), "wdt P86");
/// assert_eq!(humanize_field("cdb_chant_incipit"), "cdb chant incipit");
/// ```
pub fn humanize_field(base: &str) -> String {
    base.split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // local_name tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_local_name_entity() {
        assert_eq!(local_name("http://www.wikidata.org/entity/P2561"), "P2561");
    }

    #[test]
    fn test_local_name_nested_path() {
        assert_eq!(local_name("https://thesession.org/tunes/popular/12"), "12");
    }

    #[test]
    fn test_local_name_bare() {
        assert_eq!(local_name("_:b0"), "_:b0");
    }

    // -------------------------------------------------------------------------
    // nested_id tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_nested_id_blank_parent() {
        assert_eq!(nested_id("_:b3", "wdt_P86", 0), "_:b3#wdt_P86-0");
    }

    // -------------------------------------------------------------------------
    // humanize_field tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_humanize_field_single_token() {
        assert_eq!(humanize_field("name"), "name");
    }

    #[test]
    fn test_humanize_field_collapses_underscores() {
        assert_eq!(humanize_field("_wdt__P86_"), "wdt P86");
    }

    #[test]
    fn test_humanize_field_empty() {
        assert_eq!(humanize_field(""), "");
    }
}
