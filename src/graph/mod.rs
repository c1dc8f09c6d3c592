//! Wordnet graph: the triple store every engine reads and mutates.
//!
//! [`WordnetGraph`] wraps an embedded oxigraph [`Store`] (default graph only)
//! and exposes the small collaborator surface the pipeline needs: add, remove,
//! membership, pattern queries and single-position lookups. All mutations go
//! through [`WordnetGraph::add`] / [`WordnetGraph::remove`], which are
//! idempotent, log each triple at `debug`, and feed the added/removed counters
//! used for per-rule and per-action audit counts.
//!
//! - **Pattern queries** ([`pattern`]): typed triple patterns instead of query strings
//! - **File I/O** ([`io`]): RDF syntax chosen from the file extension

pub mod io;
pub mod pattern;

use std::sync::atomic::{AtomicUsize, Ordering};

use oxigraph::model::{
    GraphNameRef, Literal, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef,
    Term, TermRef,
};
use oxigraph::store::Store;

pub use crate::error::{GraphError, GraphResult};
pub use pattern::{Bindings, Query, Slot, TriplePattern, var};

/// Snapshot of the mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mutations {
    /// Triples added.
    pub added: usize,
    /// Triples removed.
    pub removed: usize,
}

impl Mutations {
    /// Mutations performed since an earlier snapshot.
    pub fn since(self, before: Mutations) -> Mutations {
        Mutations {
            added: self.added - before.added,
            removed: self.removed - before.removed,
        }
    }
}

/// The wordnet graph backed by oxigraph.
pub struct WordnetGraph {
    store: Store,
    added: AtomicUsize,
    removed: AtomicUsize,
}

impl WordnetGraph {
    /// Create an empty in-memory graph.
    pub fn new() -> GraphResult<Self> {
        let store = Store::new().map_err(|e| GraphError::Storage {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self::from_store(store))
    }

    /// Wrap an existing store.
    pub fn from_store(store: Store) -> Self {
        Self {
            store,
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        }
    }

    /// Underlying store (for SPARQL and bulk I/O).
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Number of triples in the default graph.
    pub fn len(&self) -> GraphResult<usize> {
        Ok(self.store.len()?)
    }

    /// Whether the graph holds no triples.
    pub fn is_empty(&self) -> GraphResult<bool> {
        Ok(self.store.is_empty()?)
    }

    /// Current mutation counters.
    pub fn mutations(&self) -> Mutations {
        Mutations {
            added: self.added.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }

    /// Add a triple. Returns `false` when it was already present.
    pub fn add<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: impl Into<TermRef<'a>>,
        context: &str,
    ) -> GraphResult<bool> {
        let quad = QuadRef::new(subject, predicate, object, GraphNameRef::DefaultGraph);
        if self.store.insert(quad)? {
            self.added.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(context, triple = %quad, "added triple");
            Ok(true)
        } else {
            tracing::debug!(context, triple = %quad, "triple already in graph");
            Ok(false)
        }
    }

    /// Remove a triple. Returns `false` when it was not present.
    pub fn remove<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: impl Into<TermRef<'a>>,
        context: &str,
    ) -> GraphResult<bool> {
        let quad = QuadRef::new(subject, predicate, object, GraphNameRef::DefaultGraph);
        if self.store.remove(quad)? {
            self.removed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(context, triple = %quad, "removed triple");
            Ok(true)
        } else {
            tracing::debug!(context, triple = %quad, "triple not in graph");
            Ok(false)
        }
    }

    /// Whether the exact triple is present.
    pub fn contains<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: impl Into<TermRef<'a>>,
    ) -> GraphResult<bool> {
        let quad = QuadRef::new(subject, predicate, object, GraphNameRef::DefaultGraph);
        Ok(self.store.contains(quad)?)
    }

    /// All triples matching the given positions (`None` is a wildcard).
    pub fn matching(
        &self,
        subject: Option<NamedOrBlankNodeRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> GraphResult<Vec<Quad>> {
        self.store
            .quads_for_pattern(subject, predicate, object, Some(GraphNameRef::DefaultGraph))
            .map(|quad| quad.map_err(GraphError::from))
            .collect()
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
    ) -> GraphResult<Vec<Term>> {
        Ok(self
            .matching(Some(subject.into()), Some(predicate.into()), None)?
            .into_iter()
            .map(|quad| quad.object)
            .collect())
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects<'a>(
        &self,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: impl Into<TermRef<'a>>,
    ) -> GraphResult<Vec<NamedOrBlankNode>> {
        Ok(self
            .matching(None, Some(predicate.into()), Some(object.into()))?
            .into_iter()
            .map(|quad| quad.subject)
            .collect())
    }

    /// A single object of `(subject, predicate, ?)`, if any.
    ///
    /// When several objects exist the lexically smallest is returned so that
    /// callers see the same value on every run.
    pub fn value<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
    ) -> GraphResult<Option<Term>> {
        Ok(self
            .objects(subject, predicate)?
            .into_iter()
            .min_by_key(|term| term.to_string()))
    }

    /// Literal value of `(subject, predicate, ?)`, if the object is a literal.
    pub fn literal_value<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
    ) -> GraphResult<Option<Literal>> {
        Ok(self
            .objects(subject, predicate)?
            .into_iter()
            .filter_map(|term| match term {
                Term::Literal(literal) => Some(literal),
                _ => None,
            })
            .min_by(|a, b| a.value().cmp(b.value())))
    }

    /// Triples where `node` is the subject.
    pub fn triples_from(&self, node: NamedOrBlankNodeRef<'_>) -> GraphResult<Vec<Quad>> {
        self.matching(Some(node), None, None)
    }

    /// Triples where `node` is the object.
    pub fn triples_to(&self, node: NamedOrBlankNodeRef<'_>) -> GraphResult<Vec<Quad>> {
        self.matching(None, None, Some(node.into()))
    }

    /// Whether `node` occurs in any triple, as subject or object.
    pub fn has_node(&self, node: NamedOrBlankNodeRef<'_>) -> GraphResult<bool> {
        let as_subject = self
            .store
            .quads_for_pattern(Some(node), None, None, Some(GraphNameRef::DefaultGraph))
            .next()
            .is_some();
        if as_subject {
            return Ok(true);
        }
        Ok(self
            .store
            .quads_for_pattern(None, None, Some(node.into()), Some(GraphNameRef::DefaultGraph))
            .next()
            .is_some())
    }

    /// Remove every `(subject, predicate, ?)` triple. Returns how many went.
    pub fn remove_all<'a>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
        context: &str,
    ) -> GraphResult<usize> {
        let quads = self.matching(Some(subject.into()), Some(predicate.into()), None)?;
        let mut count = 0;
        for quad in &quads {
            if self.remove(&quad.subject, &quad.predicate, &quad.object, context)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Move every edge of `old` onto `new`, leaving `old` out of the graph.
    ///
    /// Triples pointing at `old` are re-added pointing at `new`, and triples
    /// leaving `old` are re-added leaving `new`. Self-loops follow the node.
    pub fn replace_node(
        &self,
        old: NamedOrBlankNodeRef<'_>,
        new: NamedOrBlankNodeRef<'_>,
        context: &str,
    ) -> GraphResult<()> {
        if old == new {
            return Ok(());
        }
        tracing::debug!(context, old = %old, new = %new, "replacing node");

        let old_term: TermRef<'_> = old.into();
        for quad in self.triples_to(old)? {
            self.remove(&quad.subject, &quad.predicate, &quad.object, context)?;
            if quad.subject.as_ref() == old {
                self.add(new, &quad.predicate, new, context)?;
            } else {
                self.add(&quad.subject, &quad.predicate, new, context)?;
            }
        }
        for quad in self.triples_from(old)? {
            self.remove(&quad.subject, &quad.predicate, &quad.object, context)?;
            if quad.object.as_ref() == old_term {
                self.add(new, &quad.predicate, new, context)?;
            } else {
                self.add(new, &quad.predicate, &quad.object, context)?;
            }
        }
        Ok(())
    }

    /// Remove every triple mentioning `node`. Returns how many went.
    pub fn drop_node(&self, node: NamedOrBlankNodeRef<'_>, context: &str) -> GraphResult<usize> {
        tracing::debug!(context, node = %node, "dropping node");
        let mut count = 0;
        for quad in self.triples_from(node)? {
            if self.remove(&quad.subject, &quad.predicate, &quad.object, context)? {
                count += 1;
            }
        }
        for quad in self.triples_to(node)? {
            if self.remove(&quad.subject, &quad.predicate, &quad.object, context)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl std::fmt::Debug for WordnetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordnetGraph")
            .field("triples", &self.store.len().unwrap_or_default())
            .field("mutations", &self.mutations())
            .finish()
    }
}

/// View a term as a node usable in subject position.
pub fn term_to_node(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(NamedOrBlankNode::NamedNode(node.clone())),
        Term::BlankNode(node) => Some(NamedOrBlankNode::BlankNode(node.clone())),
        _ => None,
    }
}

/// View a node as a term usable in object position.
pub fn node_to_term(node: &NamedOrBlankNode) -> Term {
    match node {
        NamedOrBlankNode::NamedNode(node) => Term::NamedNode(node.clone()),
        NamedOrBlankNode::BlankNode(node) => Term::BlankNode(node.clone()),
    }
}

/// The literal inside a term, if it is one.
pub fn term_literal(term: &Term) -> Option<&Literal> {
    match term {
        Term::Literal(literal) => Some(literal),
        _ => None,
    }
}
