// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # ownpt
//!
//! Reconciliation pipeline for an RDF wordnet: keeps a triple-store wordnet
//! consistent with an external document store of synsets, user suggestions
//! and votes.
//!
//! ## Architecture
//!
//! - **Graph** (`graph`): oxigraph store with counted, logged, idempotent mutations and a triple-pattern query engine
//! - **Node factory** (`node`): canonical identifiers for words, senses and synsets
//! - **Compare** (`compare`): multiset diff of a document dump against the graph
//! - **Update** (`update`): vote admission and the six-action mutation state machine
//! - **Repair** (`repair`): ordered, idempotent rules restoring structural invariants
//! - **Statistics** (`stats`): SPARQL aggregate counts
//!
//! ## Library usage
//!
//! ```no_run
//! use ownpt::config::{LangProfile, WordIdentity};
//! use ownpt::graph::WordnetGraph;
//! use ownpt::node::NodeFactory;
//! use ownpt::repair::Repair;
//!
//! let graph = WordnetGraph::new().unwrap();
//! graph.load(std::path::Path::new("own-pt.nt")).unwrap();
//! let profile = LangProfile::portuguese();
//! let factory = NodeFactory::new(&graph, &profile, WordIdentity::Flat);
//! let report = Repair::new(factory).repair().unwrap();
//! println!("added {}, removed {}", report.added(), report.removed());
//! ```

pub mod compare;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod node;
pub mod repair;
pub mod stats;
pub mod update;
pub mod vocab;

pub use error::{OwnError, OwnResult};
