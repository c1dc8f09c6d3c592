//! Structured pattern queries over the wordnet graph.
//!
//! A [`Query`] is a conjunction of [`TriplePattern`]s plus optional
//! `NOT EXISTS` groups and predicate filters. Queries are evaluated by a
//! nested-loop join that feeds each partial binding into the next pattern's
//! store lookup, so the graph never sees an interpolated query string.
//!
//! ```ignore
//! let q = Query::new()
//!     .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
//!     .not_exists([TriplePattern::new(var("sense"), vocab::WORD, var("word"))]);
//! ```

use std::collections::{BTreeMap, HashSet};

use oxigraph::model::{
    Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, Term,
    TermRef,
};

use super::{WordnetGraph, term_to_node};
use crate::error::GraphResult;

/// A position in a triple pattern: a variable or a fixed term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Var(&'static str),
    Term(Term),
}

/// Shorthand for [`Slot::Var`].
pub fn var(name: &'static str) -> Slot {
    Slot::Var(name)
}

impl From<NamedNodeRef<'_>> for Slot {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Slot::Term(Term::NamedNode(node.into_owned()))
    }
}

impl From<&NamedNode> for Slot {
    fn from(node: &NamedNode) -> Self {
        Slot::Term(Term::NamedNode(node.clone()))
    }
}

impl From<&NamedOrBlankNode> for Slot {
    fn from(node: &NamedOrBlankNode) -> Self {
        Slot::Term(super::node_to_term(node))
    }
}

impl From<Literal> for Slot {
    fn from(literal: Literal) -> Self {
        Slot::Term(Term::Literal(literal))
    }
}

impl From<Term> for Slot {
    fn from(term: Term) -> Self {
        Slot::Term(term)
    }
}

/// A triple with variable or fixed positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Slot,
    pub predicate: Slot,
    pub object: Slot,
}

impl TriplePattern {
    pub fn new(subject: impl Into<Slot>, predicate: impl Into<Slot>, object: impl Into<Slot>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Extend `bindings` with every match of this pattern in the graph.
    fn extend(&self, graph: &WordnetGraph, bindings: &Bindings) -> GraphResult<Vec<Bindings>> {
        let subject = match bindings.resolve(&self.subject) {
            Resolved::Free => None,
            Resolved::Bound(term) => match term_to_node(&term) {
                Some(node) => Some(node),
                None => return Ok(Vec::new()),
            },
        };
        let predicate = match bindings.resolve(&self.predicate) {
            Resolved::Free => None,
            Resolved::Bound(Term::NamedNode(node)) => Some(node),
            Resolved::Bound(_) => return Ok(Vec::new()),
        };
        let object = match bindings.resolve(&self.object) {
            Resolved::Free => None,
            Resolved::Bound(term) => Some(term),
        };

        let quads = graph.matching(
            subject.as_ref().map(NamedOrBlankNodeRef::from),
            predicate.as_ref().map(NamedNodeRef::from),
            object.as_ref().map(TermRef::from),
        )?;

        Ok(quads
            .into_iter()
            .filter_map(|quad| self.bind(bindings, quad))
            .collect())
    }

    fn bind(&self, bindings: &Bindings, quad: Quad) -> Option<Bindings> {
        let mut next = bindings.clone();
        next.unify(&self.subject, super::node_to_term(&quad.subject))?;
        next.unify(&self.predicate, Term::NamedNode(quad.predicate))?;
        next.unify(&self.object, quad.object)?;
        Some(next)
    }
}

enum Resolved {
    Free,
    Bound(Term),
}

/// One solution: variable name → bound term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<&'static str, Term>);

impl Bindings {
    /// The term bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.0.get(name)
    }

    /// The bound term as a node, if it is an IRI or blank node.
    pub fn node(&self, name: &str) -> Option<NamedOrBlankNode> {
        self.get(name).and_then(term_to_node)
    }

    /// The bound term as a literal.
    pub fn literal(&self, name: &str) -> Option<&Literal> {
        self.get(name).and_then(super::term_literal)
    }

    /// Whether the bound term is a blank node.
    pub fn is_blank(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Term::BlankNode(_)))
    }

    fn resolve(&self, slot: &Slot) -> Resolved {
        match slot {
            Slot::Term(term) => Resolved::Bound(term.clone()),
            Slot::Var(name) => match self.0.get(name) {
                Some(term) => Resolved::Bound(term.clone()),
                None => Resolved::Free,
            },
        }
    }

    fn unify(&mut self, slot: &Slot, term: Term) -> Option<()> {
        match slot {
            Slot::Term(fixed) => (fixed == &term).then_some(()),
            Slot::Var(name) => match self.0.get(name) {
                Some(bound) => (bound == &term).then_some(()),
                None => {
                    self.0.insert(*name, term);
                    Some(())
                }
            },
        }
    }
}

type Filter = Box<dyn Fn(&Bindings) -> bool>;

/// A conjunctive pattern query with negation and filters.
#[derive(Default)]
pub struct Query {
    patterns: Vec<TriplePattern>,
    absent: Vec<Vec<TriplePattern>>,
    filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a triple.
    pub fn pattern(
        mut self,
        subject: impl Into<Slot>,
        predicate: impl Into<Slot>,
        object: impl Into<Slot>,
    ) -> Self {
        self.patterns.push(TriplePattern::new(subject, predicate, object));
        self
    }

    /// Reject solutions for which the whole group matches.
    pub fn not_exists(mut self, group: impl IntoIterator<Item = TriplePattern>) -> Self {
        self.absent.push(group.into_iter().collect());
        self
    }

    /// Keep only solutions accepted by `filter`.
    pub fn filter(mut self, filter: impl Fn(&Bindings) -> bool + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// All solutions, in store order.
    pub fn evaluate(&self, graph: &WordnetGraph) -> GraphResult<Vec<Bindings>> {
        let mut solutions = join(graph, &self.patterns, vec![Bindings::default()])?;

        if !self.absent.is_empty() {
            let mut kept = Vec::with_capacity(solutions.len());
            for solution in solutions {
                let mut blocked = false;
                for group in &self.absent {
                    if !join(graph, group, vec![solution.clone()])?.is_empty() {
                        blocked = true;
                        break;
                    }
                }
                if !blocked {
                    kept.push(solution);
                }
            }
            solutions = kept;
        }

        solutions.retain(|solution| self.filters.iter().all(|f| f(solution)));
        Ok(solutions)
    }

    /// Distinct terms bound to `name`, in order of first appearance.
    pub fn select(&self, graph: &WordnetGraph, name: &str) -> GraphResult<Vec<Term>> {
        let mut seen = HashSet::new();
        Ok(self
            .evaluate(graph)?
            .into_iter()
            .filter_map(|solution| solution.get(name).cloned())
            .filter(|term| seen.insert(term.clone()))
            .collect())
    }

    /// Distinct nodes bound to `name`.
    pub fn select_nodes(&self, graph: &WordnetGraph, name: &str) -> GraphResult<Vec<NamedOrBlankNode>> {
        Ok(self
            .select(graph, name)?
            .iter()
            .filter_map(term_to_node)
            .collect())
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("patterns", &self.patterns)
            .field("absent", &self.absent)
            .field("filters", &self.filters.len())
            .finish()
    }
}

fn join(
    graph: &WordnetGraph,
    patterns: &[TriplePattern],
    mut solutions: Vec<Bindings>,
) -> GraphResult<Vec<Bindings>> {
    for pattern in patterns {
        let mut next = Vec::new();
        for solution in &solutions {
            next.extend(pattern.extend(graph, solution)?);
        }
        if next.is_empty() {
            return Ok(next);
        }
        solutions = next;
    }
    Ok(solutions)
}
