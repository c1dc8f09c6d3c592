//! Compare engine: diff the graph against a dump snapshot.
//!
//! For every dump synset, each lexical attribute (words, glosses, examples) is
//! split into a three-way [`Partition`] by single-consumption multiset
//! matching: a dump value pairs with at most one equal graph value, and the
//! leftovers on either side are reported. Pointer lists are compared the same
//! way, as (source, target) pairs whose ends are either a synset or a word in
//! a synset.
//!
//! [`unify_actions`] turns a report into the edit actions that would make the
//! graph agree with the dump.

use std::collections::BTreeMap;

use oxigraph::model::{NamedNode, NamedNodeRef, NamedOrBlankNodeRef, Term};
use serde::Serialize;

use crate::document::{Action, Attribute, DumpSynset};
use crate::error::{CompareError, GraphResult};
use crate::graph::{Query, var};
use crate::node::{NodeFactory, format_lexical};
use crate::vocab;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Three-way split of two multisets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition<T> {
    /// Values matched on both sides.
    pub both: Vec<T>,
    /// Dump values with no graph counterpart.
    pub only_dump: Vec<T>,
    /// Graph values with no dump counterpart.
    pub only_graph: Vec<T>,
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Self {
            both: Vec::new(),
            only_dump: Vec::new(),
            only_graph: Vec::new(),
        }
    }
}

impl<T: PartialEq> Partition<T> {
    /// Match each graph value against at most one remaining dump value.
    pub fn split(dump: Vec<T>, graph: impl IntoIterator<Item = T>) -> Self {
        let mut remaining = dump;
        let mut both = Vec::new();
        let mut only_graph = Vec::new();
        for value in graph {
            match remaining.iter().position(|d| *d == value) {
                Some(i) => {
                    remaining.remove(i);
                    both.push(value);
                }
                None => only_graph.push(value),
            }
        }
        Self {
            both,
            only_dump: remaining,
            only_graph,
        }
    }
}

impl<T> Partition<T> {
    /// No value is unique to either side.
    pub fn is_equal(&self) -> bool {
        self.only_dump.is_empty() && self.only_graph.is_empty()
    }

    pub fn counts(&self) -> Counts {
        Counts {
            both: self.both.len(),
            only_dump: self.only_dump.len(),
            only_graph: self.only_graph.len(),
        }
    }
}

/// Sizes of a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub both: usize,
    pub only_dump: usize,
    pub only_graph: usize,
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, other: Counts) {
        self.both += other.both;
        self.only_dump += other.only_dump;
        self.only_graph += other.only_graph;
    }
}

/// One end of a pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEnd {
    Synset(String),
    Word { synset: String, word: String },
}

/// A pointer between two ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PointerPair {
    pub source: PointerEnd,
    pub target: PointerEnd,
}

/// Comparison of one dump synset with the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynsetReport {
    pub doc_id: String,
    /// Whether the synset exists in the graph.
    pub found: bool,
    pub attributes: BTreeMap<Attribute, Partition<String>>,
    pub pointers: BTreeMap<String, Partition<PointerPair>>,
    /// Dump pointers that could not be resolved.
    pub unresolved: Vec<String>,
}

impl SynsetReport {
    pub fn is_equal(&self) -> bool {
        self.attributes.values().all(Partition::is_equal)
            && self.pointers.values().all(Partition::is_equal)
    }
}

/// Comparison of a whole dump with the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub synsets: BTreeMap<String, SynsetReport>,
}

impl Report {
    pub fn is_equal(&self) -> bool {
        self.synsets.values().all(SynsetReport::is_equal)
    }

    /// Totals per attribute across synsets.
    pub fn attribute_totals(&self) -> BTreeMap<Attribute, Counts> {
        let mut totals = BTreeMap::new();
        for report in self.synsets.values() {
            for (attribute, partition) in &report.attributes {
                *totals.entry(*attribute).or_insert_with(Counts::default) += partition.counts();
            }
        }
        totals
    }

    /// Totals per pointer across synsets.
    pub fn pointer_totals(&self) -> BTreeMap<String, Counts> {
        let mut totals = BTreeMap::new();
        for report in self.synsets.values() {
            for (pointer, partition) in &report.pointers {
                *totals.entry(pointer.clone()).or_insert_with(Counts::default) += partition.counts();
            }
        }
        totals
    }
}

/// Edit actions per synset identifier.
pub type UnifyActions = BTreeMap<String, Vec<Action>>;

/// Actions that make the graph agree with the dump, per differing synset.
///
/// Values only in the dump become additions; values only in the graph become
/// removals. Synsets that compare equal produce no entry.
pub fn unify_actions(report: &Report) -> UnifyActions {
    let mut actions = UnifyActions::new();
    for (doc_id, synset) in &report.synsets {
        if synset.is_equal() {
            continue;
        }
        let mut edits = Vec::new();
        for (attribute, partition) in &synset.attributes {
            edits.extend(partition.only_dump.iter().cloned().map(|v| attribute.add(v)));
            edits.extend(partition.only_graph.iter().cloned().map(|v| attribute.remove(v)));
        }
        if !edits.is_empty() {
            actions.insert(doc_id.clone(), edits);
        }
    }
    actions
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Diffs dump documents against the graph.
pub struct Compare<'g> {
    factory: NodeFactory<'g>,
    pointers: BTreeMap<String, NamedNode>,
}

impl<'g> Compare<'g> {
    /// Compare engine checking the antonym pointer list.
    pub fn new(factory: NodeFactory<'g>) -> Self {
        Self {
            factory,
            pointers: BTreeMap::from([(
                "wn30_pt_antonymOf".to_string(),
                vocab::ANTONYM_OF.into_owned(),
            )]),
        }
    }

    /// Replace the dump pointer name → predicate table.
    pub fn with_pointers(mut self, pointers: BTreeMap<String, NamedNode>) -> Self {
        self.pointers = pointers;
        self
    }

    /// Compare every dump synset with the graph.
    pub fn compare(&self, dump: &[DumpSynset]) -> GraphResult<Report> {
        let mut index: BTreeMap<&str, &DumpSynset> = BTreeMap::new();
        for doc in dump {
            if index.insert(doc.doc_id.as_str(), doc).is_some() {
                tracing::warn!(doc_id = %doc.doc_id, "duplicate synset in dump, keeping the last one");
            }
        }

        let mut report = Report::default();
        for doc in index.values() {
            let synset_report = self.compare_synset(doc, &index)?;
            if !synset_report.is_equal() {
                tracing::debug!(
                    doc_id = %doc.doc_id,
                    report = ?synset_report,
                    "synset differs from dump"
                );
            }
            report.synsets.insert(doc.doc_id.clone(), synset_report);
        }

        for (attribute, counts) in report.attribute_totals() {
            tracing::info!(
                attribute = attribute.field(),
                equal = counts.only_dump == 0 && counts.only_graph == 0,
                both = counts.both,
                only_dump = counts.only_dump,
                only_graph = counts.only_graph,
                "compared attribute"
            );
        }
        for (pointer, counts) in report.pointer_totals() {
            tracing::info!(
                pointer = %pointer,
                both = counts.both,
                only_dump = counts.only_dump,
                only_graph = counts.only_graph,
                "compared pointer"
            );
        }
        Ok(report)
    }

    fn compare_synset(
        &self,
        doc: &DumpSynset,
        index: &BTreeMap<&str, &DumpSynset>,
    ) -> GraphResult<SynsetReport> {
        let synset = self.factory.synset_by_id(&doc.doc_id)?;
        let mut report = SynsetReport {
            doc_id: doc.doc_id.clone(),
            found: synset.is_some(),
            ..Default::default()
        };

        for attribute in Attribute::ALL {
            let dump_values = non_empty(doc.values(attribute).iter().map(|v| format_lexical(v)));
            let graph_values = match &synset {
                Some(synset) => self.graph_values(synset.as_ref(), attribute)?,
                None => Vec::new(),
            };
            report
                .attributes
                .insert(attribute, Partition::split(dump_values, graph_values));
        }

        for (name, predicate) in &self.pointers {
            let dump_pairs = self.dump_pairs(doc, name, index, &mut report.unresolved);
            let graph_pairs = match &synset {
                Some(synset) => self.graph_pairs(&doc.doc_id, synset.as_ref(), predicate.as_ref())?,
                None => Vec::new(),
            };
            report
                .pointers
                .insert(name.clone(), Partition::split(dump_pairs, graph_pairs));
        }
        Ok(report)
    }

    /// Normalized lexical values of an attribute, one per query solution.
    fn graph_values(&self, synset: NamedOrBlankNodeRef<'_>, attribute: Attribute) -> GraphResult<Vec<String>> {
        let synset = synset.into_owned();
        let graph = self.factory.graph();
        let literals: Vec<String> = match attribute {
            Attribute::Word => Query::new()
                .pattern(&synset, vocab::CONTAINS_WORD_SENSE, var("sense"))
                .pattern(var("sense"), vocab::WORD, var("word"))
                .pattern(var("word"), vocab::LEXICAL_FORM, var("lexical"))
                .evaluate(graph)?
                .iter()
                .filter_map(|b| b.literal("lexical").map(|l| l.value().to_string()))
                .collect(),
            Attribute::Gloss => literal_values(graph.objects(&synset, vocab::GLOSS)?),
            Attribute::Example => literal_values(graph.objects(&synset, vocab::EXAMPLE)?),
        };
        Ok(non_empty(literals.iter().map(|v| format_lexical(v))))
    }

    fn dump_pairs(
        &self,
        doc: &DumpSynset,
        name: &str,
        index: &BTreeMap<&str, &DumpSynset>,
        unresolved: &mut Vec<String>,
    ) -> Vec<PointerPair> {
        let pointers = match doc.pointers(name) {
            Ok(pointers) => pointers,
            Err(e) => {
                tracing::warn!(doc_id = %doc.doc_id, pointer = name, error = %e, "skipping malformed pointer list");
                unresolved.push(e.to_string());
                return Vec::new();
            }
        };

        let mut pairs = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            let Some(target_doc) = index.get(pointer.target_synset.as_str()) else {
                let e = CompareError::UnknownTargetSynset {
                    doc_id: doc.doc_id.clone(),
                    pointer: name.to_string(),
                    target: pointer.target_synset.clone(),
                };
                tracing::warn!(error = %e, "unresolved pointer");
                unresolved.push(e.to_string());
                continue;
            };
            pairs.push(PointerPair {
                source: dump_end(doc, pointer.source_word.as_deref()),
                target: dump_end(target_doc, pointer.target_word.as_deref()),
            });
        }
        pairs
    }

    fn graph_pairs(
        &self,
        doc_id: &str,
        synset: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> GraphResult<Vec<PointerPair>> {
        let synset = synset.into_owned();
        let graph = self.factory.graph();
        let mut pairs = Vec::new();

        let sense_links = Query::new()
            .pattern(&synset, vocab::CONTAINS_WORD_SENSE, var("source"))
            .pattern(var("source"), predicate, var("target"))
            .pattern(var("source"), vocab::WORD, var("source_word"))
            .pattern(var("source_word"), vocab::LEXICAL_FORM, var("source_lexical"))
            .pattern(var("target"), vocab::WORD, var("target_word"))
            .pattern(var("target_word"), vocab::LEXICAL_FORM, var("target_lexical"))
            .pattern(var("target_synset"), vocab::CONTAINS_WORD_SENSE, var("target"))
            .evaluate(graph)?;
        for b in &sense_links {
            let (Some(source), Some(target), Some(target_synset)) = (
                b.literal("source_lexical"),
                b.literal("target_lexical"),
                b.node("target_synset"),
            ) else {
                continue;
            };
            let Some(target_id) = self.factory.synset_id(target_synset.as_ref()) else {
                continue;
            };
            pairs.push(PointerPair {
                source: word_end(doc_id, source.value()),
                target: word_end(&target_id, target.value()),
            });
        }

        for target in graph.objects(&synset, predicate)? {
            let Some(target) = crate::graph::term_to_node(&target) else {
                continue;
            };
            if let Some(target_id) = self.factory.synset_id(target.as_ref()) {
                pairs.push(PointerPair {
                    source: PointerEnd::Synset(canonical_id(doc_id)),
                    target: PointerEnd::Synset(canonical_id(&target_id)),
                });
            }
        }
        Ok(pairs)
    }
}

fn literal_values(terms: Vec<Term>) -> Vec<String> {
    terms
        .iter()
        .filter_map(crate::graph::term_literal)
        .map(|l| l.value().to_string())
        .collect()
}

/// Values that normalize to nothing are never compared.
fn non_empty(values: impl Iterator<Item = String>) -> Vec<String> {
    values.filter(|v| !v.is_empty()).collect()
}

/// Satellite adjectives are compared as adjectives.
fn canonical_id(id: &str) -> String {
    match id.strip_suffix("-s") {
        Some(stem) => format!("{stem}-a"),
        None => id.to_string(),
    }
}

fn word_end(synset_id: &str, lexical: &str) -> PointerEnd {
    PointerEnd::Word {
        synset: canonical_id(synset_id),
        word: format_lexical(lexical),
    }
}

/// A pointer end in the dump: the word when the synset lists it, else the synset.
fn dump_end(doc: &DumpSynset, word: Option<&str>) -> PointerEnd {
    match word {
        Some(word) => {
            let word = format_lexical(word);
            if doc.word_pt.iter().any(|w| format_lexical(w) == word) {
                word_end(&doc.doc_id, &word)
            } else {
                PointerEnd::Synset(canonical_id(&doc.doc_id))
            }
        }
        None => PointerEnd::Synset(canonical_id(&doc.doc_id)),
    }
}
