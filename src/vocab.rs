//! Well-known wn30 schema terms.
//!
//! Every predicate and class the pipeline touches is declared here once as a
//! `NamedNodeRef` constant, so pattern queries are assembled from typed terms
//! instead of interpolated query strings.

use oxigraph::model::NamedNodeRef;

pub use oxigraph::model::vocab::rdf::TYPE as HAS_TYPE;
pub use oxigraph::model::vocab::rdfs::LABEL as HAS_LABEL;

/// Namespace of the wn30 schema shared by every language profile.
pub const SCHEMA_NS: &str = "https://w3id.org/own-pt/wn30/schema/";

/// Namespace of the NomLex morphosemantic schema.
pub const NOMLEX_NS: &str = "https://w3id.org/own-pt/nomlex/schema/";

const fn schema(iri: &'static str) -> NamedNodeRef<'static> {
    NamedNodeRef::new_unchecked(iri)
}

// Structural relations
pub const CONTAINS_WORD_SENSE: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/containsWordSense");
pub const WORD: NamedNodeRef<'static> = schema("https://w3id.org/own-pt/wn30/schema/word");
pub const LEXICAL_FORM: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/lexicalForm");
pub const WORD_NUMBER: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/wordNumber");
pub const SYNSET_ID: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/synsetId");
pub const POS: NamedNodeRef<'static> = schema("https://w3id.org/own-pt/wn30/schema/pos");

// Synset content
pub const GLOSS: NamedNodeRef<'static> = schema("https://w3id.org/own-pt/wn30/schema/gloss");
pub const EXAMPLE: NamedNodeRef<'static> = schema("https://w3id.org/own-pt/wn30/schema/example");

// Pointers
pub const ANTONYM_OF: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/antonymOf");

// NomLex links that keep a word connected without a sense.
pub const NOMLEX_NOUN: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/nomlex/schema/noun");
pub const NOMLEX_VERB: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/nomlex/schema/verb");

// Classes
pub const TYPE_WORD: NamedNodeRef<'static> = schema("https://w3id.org/own-pt/wn30/schema/Word");
pub const TYPE_WORD_SENSE: NamedNodeRef<'static> =
    schema("https://w3id.org/own-pt/wn30/schema/WordSense");

/// Every class a word sense node may be typed with.
pub const SENSE_TYPES: [NamedNodeRef<'static>; 6] = [
    TYPE_WORD_SENSE,
    schema("https://w3id.org/own-pt/wn30/schema/NounWordSense"),
    schema("https://w3id.org/own-pt/wn30/schema/VerbWordSense"),
    schema("https://w3id.org/own-pt/wn30/schema/AdverbWordSense"),
    schema("https://w3id.org/own-pt/wn30/schema/AdjectiveWordSense"),
    schema("https://w3id.org/own-pt/wn30/schema/AdjectiveSatelliteWordSense"),
];

/// Predicates whose objects are language-tagged lexical literals.
pub const LEXICAL_PREDICATES: [NamedNodeRef<'static>; 4] = [HAS_LABEL, LEXICAL_FORM, GLOSS, EXAMPLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_terms_share_namespace() {
        for term in [CONTAINS_WORD_SENSE, WORD, LEXICAL_FORM, WORD_NUMBER, GLOSS, EXAMPLE] {
            assert!(term.as_str().starts_with(SCHEMA_NS), "{term}");
        }
        assert!(NOMLEX_NOUN.as_str().starts_with(NOMLEX_NS));
        assert!(NOMLEX_VERB.as_str().starts_with(NOMLEX_NS));
    }

    #[test]
    fn sense_types_include_base_class() {
        assert!(SENSE_TYPES.contains(&TYPE_WORD_SENSE));
    }
}
