//! Rich diagnostic error types for the ownpt pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Referential problems in the input
//! documents (unknown synsets, unknown votes, unrecognized actions) are *not*
//! errors: the engines log and count them instead. The types below cover the
//! failures that do stop a run: storage, unreadable inputs, and bad config.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the ownpt pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum OwnError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compare(#[from] CompareError),
}

/// Result type for top-level pipeline operations.
pub type OwnResult<T> = std::result::Result<T, OwnError>;

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("graph storage error: {message}")]
    #[diagnostic(
        code(ownpt::graph::storage),
        help(
            "The embedded oxigraph store rejected an operation. \
             This usually means the process ran out of memory or the store was corrupted."
        )
    )]
    Storage { message: String },

    #[error("failed to load graph from {path}: {message}")]
    #[diagnostic(
        code(ownpt::graph::load),
        help(
            "The RDF file could not be parsed. Check that the file extension matches \
             its syntax (.nt, .ttl, .rdf/.xml/.owl, .n3)."
        )
    )]
    Load { path: String, message: String },

    #[error("failed to serialize graph to {path}: {message}")]
    #[diagnostic(
        code(ownpt::graph::dump),
        help("Ensure the output directory exists and is writable.")
    )]
    Dump { path: String, message: String },

    #[error("cannot guess the RDF syntax of {path}")]
    #[diagnostic(
        code(ownpt::graph::unsupported_format),
        help("Use one of the extensions .nt, .ttl, .rdf, .xml, .owl or .n3.")
    )]
    UnsupportedFormat { path: String },

    #[error("I/O error on {path}")]
    #[diagnostic(
        code(ownpt::graph::io),
        help("A filesystem operation failed. Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SPARQL query error: {message}")]
    #[diagnostic(
        code(ownpt::graph::sparql),
        help("The statistics query failed to evaluate against the store.")
    )]
    Sparql { message: String },
}

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

impl From<oxigraph::store::StorageError> for GraphError {
    fn from(e: oxigraph::store::StorageError) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(ownpt::document::io),
        help("Check that the JSON lines file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    #[diagnostic(
        code(ownpt::document::parse),
        help(
            "Every non-empty line must hold one JSON object, optionally wrapped \
             in a {{\"_source\": ...}} envelope."
        )
    )]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("synset {doc_id}: pointer list '{pointer}' is malformed: {message}")]
    #[diagnostic(
        code(ownpt::document::pointers),
        help(
            "Pointer lists are arrays of objects with a 'target_synset' and optional \
             'source_word' / 'target_word' fields."
        )
    )]
    MalformedPointers {
        doc_id: String,
        pointer: String,
        message: String,
    },
}

/// Result type for document parsing.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(ownpt::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(ownpt::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("unknown wordnet language \"{lang}\"")]
    #[diagnostic(
        code(ownpt::config::language),
        help("Supported language profiles are \"pt\" and \"en\".")
    )]
    UnknownLanguage { lang: String },

    #[error("pointer '{name}' maps to an invalid predicate IRI: {iri}")]
    #[diagnostic(
        code(ownpt::config::pointer),
        help("Pointer predicates must be absolute IRIs, e.g. https://w3id.org/own-pt/wn30/schema/antonymOf.")
    )]
    InvalidPredicate { name: String, iri: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Compare errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CompareError {
    #[error("synset {doc_id}: pointer '{pointer}' targets unknown synset {target}")]
    #[diagnostic(
        code(ownpt::compare::unknown_target),
        help(
            "The dump index is built once from every loaded document. Load the dump \
             file that contains the target synset, or fix the pointer."
        )
    )]
    UnknownTargetSynset {
        doc_id: String,
        pointer: String,
        target: String,
    },
}
