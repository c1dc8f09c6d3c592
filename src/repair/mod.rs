//! Repair engine: restore the graph's structural invariants.
//!
//! Repair runs a fixed sequence of [`RepairRule`]s. Each rule finds its cases
//! with a pattern query, fixes them through the node factory, and reports how
//! many cases it handled and how many triples it added and removed. Later rules
//! assume earlier ones ran: word identities are settled before labels are
//! rewritten, and duplicates are merged before orphans are swept.
//!
//! Running [`Repair::repair`] on an already repaired graph performs no
//! mutation.
//!
//! Rule bodies live in three submodules:
//!
//! - [`words`]: typing, blank words, void and double words, word dedup, orphan words
//! - [`senses`]: blank senses, sense words, split senses, numbering, sense dedup
//! - [`lexical`]: literal normalization and label alignment

mod lexical;
mod senses;
mod words;

use serde::Serialize;

use crate::error::GraphResult;
use crate::node::NodeFactory;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One structural repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairRule {
    /// Type every word reachable from a sense.
    AddWordTypes,
    /// Type every sense contained in a synset.
    AddSenseTypes,
    /// Give blank words their canonical identifier.
    ResolveBlankWords,
    /// Give blank senses a minted identifier.
    ResolveBlankSenses,
    /// Unlink words that have no lexical form.
    RemoveVoidWords,
    /// Split words carrying several distinct lexical forms.
    ExpandDoubleWords,
    /// Link a word to every labelled sense that lacks one.
    ExpandSenseWords,
    /// Give each extra word of a sense its own sense.
    SplitMultiWordSenses,
    /// Label senses from their word; drop senses with neither.
    AddSenseLabels,
    /// Give senses the ordinal their identifier carries.
    AddSenseNumbers,
    /// Normalize lexical literals and tag them with the graph language.
    FormatLexicals,
    /// Align sense labels with their word's lexical form.
    ReplaceSenseLabels,
    /// Merge words with the same identity.
    RemoveWordDuplicates,
    /// Merge senses of a synset with the same label.
    RemoveSenseDuplicates,
    /// Drop senses no synset contains.
    RemoveDisconnectedSenses,
    /// Drop words no sense or NomLex entry uses.
    RemoveDisconnectedWords,
}

impl RepairRule {
    /// The full repair sequence.
    pub const PIPELINE: [RepairRule; 16] = [
        RepairRule::AddWordTypes,
        RepairRule::AddSenseTypes,
        RepairRule::ResolveBlankWords,
        RepairRule::ResolveBlankSenses,
        RepairRule::RemoveVoidWords,
        RepairRule::ExpandDoubleWords,
        RepairRule::ExpandSenseWords,
        RepairRule::SplitMultiWordSenses,
        RepairRule::AddSenseLabels,
        RepairRule::AddSenseNumbers,
        RepairRule::FormatLexicals,
        RepairRule::ReplaceSenseLabels,
        RepairRule::RemoveWordDuplicates,
        RepairRule::RemoveSenseDuplicates,
        RepairRule::RemoveDisconnectedSenses,
        RepairRule::RemoveDisconnectedWords,
    ];

    /// The word-focused subset run after updates.
    pub const WORDS: [RepairRule; 9] = [
        RepairRule::AddWordTypes,
        RepairRule::ResolveBlankWords,
        RepairRule::RemoveVoidWords,
        RepairRule::ExpandDoubleWords,
        RepairRule::ExpandSenseWords,
        RepairRule::FormatLexicals,
        RepairRule::ReplaceSenseLabels,
        RepairRule::RemoveWordDuplicates,
        RepairRule::RemoveDisconnectedWords,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RepairRule::AddWordTypes => "add_word_types",
            RepairRule::AddSenseTypes => "add_sense_types",
            RepairRule::ResolveBlankWords => "resolve_blank_words",
            RepairRule::ResolveBlankSenses => "resolve_blank_senses",
            RepairRule::RemoveVoidWords => "remove_void_words",
            RepairRule::ExpandDoubleWords => "expand_double_words",
            RepairRule::ExpandSenseWords => "expand_sense_words",
            RepairRule::SplitMultiWordSenses => "split_multi_word_senses",
            RepairRule::AddSenseLabels => "add_sense_labels",
            RepairRule::AddSenseNumbers => "add_sense_numbers",
            RepairRule::FormatLexicals => "format_lexicals",
            RepairRule::ReplaceSenseLabels => "replace_sense_labels",
            RepairRule::RemoveWordDuplicates => "remove_word_duplicates",
            RepairRule::RemoveSenseDuplicates => "remove_sense_duplicates",
            RepairRule::RemoveDisconnectedSenses => "remove_disconnected_senses",
            RepairRule::RemoveDisconnectedWords => "remove_disconnected_words",
        }
    }
}

impl std::fmt::Display for RepairRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of running one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule: &'static str,
    /// Cases the rule found.
    pub cases: usize,
    pub added: usize,
    pub removed: usize,
}

/// Result of a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub rules: Vec<RuleOutcome>,
}

impl RepairReport {
    pub fn added(&self) -> usize {
        self.rules.iter().map(|r| r.added).sum()
    }

    pub fn removed(&self) -> usize {
        self.rules.iter().map(|r| r.removed).sum()
    }

    /// Whether the run left the graph untouched.
    pub fn is_clean(&self) -> bool {
        self.added() == 0 && self.removed() == 0
    }

    pub fn outcome(&self, rule: RepairRule) -> Option<&RuleOutcome> {
        self.rules.iter().find(|r| r.rule == rule.name())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies repair rules to a graph.
pub struct Repair<'g> {
    factory: NodeFactory<'g>,
}

impl<'g> Repair<'g> {
    pub fn new(factory: NodeFactory<'g>) -> Self {
        Self { factory }
    }

    /// Run the full rule sequence.
    pub fn repair(&self) -> GraphResult<RepairReport> {
        self.run(&RepairRule::PIPELINE)
    }

    /// Run the word-focused subset.
    pub fn repair_words(&self) -> GraphResult<RepairReport> {
        self.run(&RepairRule::WORDS)
    }

    /// Run `rules` in order.
    pub fn run(&self, rules: &[RepairRule]) -> GraphResult<RepairReport> {
        let mut report = RepairReport::default();
        for &rule in rules {
            report.rules.push(self.apply(rule)?);
        }
        tracing::info!(
            rules = report.rules.len(),
            added = report.added(),
            removed = report.removed(),
            "repair finished"
        );
        Ok(report)
    }

    /// Run a single rule.
    pub fn apply(&self, rule: RepairRule) -> GraphResult<RuleOutcome> {
        let before = self.factory.graph().mutations();
        let cases = match rule {
            RepairRule::AddWordTypes => self.add_word_types()?,
            RepairRule::AddSenseTypes => self.add_sense_types()?,
            RepairRule::ResolveBlankWords => self.resolve_blank_words()?,
            RepairRule::ResolveBlankSenses => self.resolve_blank_senses()?,
            RepairRule::RemoveVoidWords => self.remove_void_words()?,
            RepairRule::ExpandDoubleWords => self.expand_double_words()?,
            RepairRule::ExpandSenseWords => self.expand_sense_words()?,
            RepairRule::SplitMultiWordSenses => self.split_multi_word_senses()?,
            RepairRule::AddSenseLabels => self.add_sense_labels()?,
            RepairRule::AddSenseNumbers => self.add_sense_numbers()?,
            RepairRule::FormatLexicals => self.format_lexicals()?,
            RepairRule::ReplaceSenseLabels => self.replace_sense_labels()?,
            RepairRule::RemoveWordDuplicates => self.remove_word_duplicates()?,
            RepairRule::RemoveSenseDuplicates => self.remove_sense_duplicates()?,
            RepairRule::RemoveDisconnectedSenses => self.remove_disconnected_senses()?,
            RepairRule::RemoveDisconnectedWords => self.remove_disconnected_words()?,
        };
        let delta = self.factory.graph().mutations().since(before);
        tracing::info!(
            rule = rule.name(),
            cases,
            added = delta.added,
            removed = delta.removed,
            "applied repair rule"
        );
        Ok(RuleOutcome {
            rule: rule.name(),
            cases,
            added: delta.added,
            removed: delta.removed,
        })
    }
}

/// Sort key that makes node iteration deterministic.
fn node_key(node: &oxigraph::model::NamedOrBlankNode) -> String {
    node.to_string()
}
