//! Update engine: apply admitted suggestions and comparison actions.
//!
//! Suggestions are joined with their votes, filtered by the admission policy
//! and applied in a deterministic order: date ascending, then removals before
//! additions, then suggestion id. Every action is idempotent; an action whose
//! effect is already in place (or whose target is already gone) is logged and
//! counted, never failed.

use std::collections::{BTreeMap, HashSet};

use oxigraph::model::{NamedOrBlankNode, NamedOrBlankNodeRef};
use serde::Serialize;

use crate::compare::UnifyActions;
use crate::config::Config;
use crate::document::{Action, Suggestion, SuggestionAction, Vote};
use crate::error::GraphResult;
use crate::graph::Mutations;
use crate::node::{NodeFactory, format_lexical};
use crate::vocab;

/// Vote thresholds and the users they favor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub senior_users: HashSet<String>,
    /// Minimum score for suggestions by senior users.
    pub senior_threshold: i64,
    /// Minimum score for suggestions by anyone.
    pub junior_threshold: i64,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            senior_users: HashSet::new(),
            senior_threshold: 1,
            junior_threshold: 2,
        }
    }
}

impl From<&Config> for AdmissionPolicy {
    fn from(config: &Config) -> Self {
        Self {
            senior_users: config.senior_users.iter().cloned().collect(),
            senior_threshold: config.senior_threshold,
            junior_threshold: config.junior_threshold,
        }
    }
}

impl AdmissionPolicy {
    /// Whether a suggestion with this total score is admitted.
    pub fn admits(&self, suggestion: &Suggestion, score: i64) -> bool {
        if !suggestion.is_new() || suggestion.action == SuggestionAction::Comment {
            return false;
        }
        (score >= self.senior_threshold && self.senior_users.contains(&suggestion.user))
            || score >= self.junior_threshold
    }
}

/// How a single action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Addition whose value was already present.
    AlreadyPresent,
    /// Removal whose value was not present.
    NotPresent,
    /// The synset identifier resolved to nothing.
    UnknownSynset,
    /// The value normalizes to the empty string.
    EmptyValue,
    /// The action name is outside the known set.
    Unrecognized,
}

/// Counts from one update run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Suggestions passing the admission policy.
    pub admitted: usize,
    /// Suggestions rejected by the admission policy.
    pub rejected: usize,
    /// Votes naming no known suggestion.
    pub orphan_votes: usize,
    pub applied: usize,
    pub already_present: usize,
    pub not_present: usize,
    pub unknown_synset: usize,
    pub empty_value: usize,
    pub unrecognized: usize,
    pub triples_added: usize,
    pub triples_removed: usize,
}

impl UpdateReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::NotPresent => self.not_present += 1,
            Outcome::UnknownSynset => self.unknown_synset += 1,
            Outcome::EmptyValue => self.empty_value += 1,
            Outcome::Unrecognized => self.unrecognized += 1,
        }
    }

    fn finish(&mut self, mutations: Mutations) {
        self.triples_added = mutations.added;
        self.triples_removed = mutations.removed;
        tracing::info!(
            applied = self.applied,
            already_present = self.already_present,
            not_present = self.not_present,
            unknown_synset = self.unknown_synset,
            empty_value = self.empty_value,
            unrecognized = self.unrecognized,
            added = self.triples_added,
            removed = self.triples_removed,
            "update finished"
        );
    }
}

/// Applies edit actions to the graph.
pub struct Update<'g> {
    factory: NodeFactory<'g>,
}

impl<'g> Update<'g> {
    pub fn new(factory: NodeFactory<'g>) -> Self {
        Self { factory }
    }

    /// Admit, order and apply suggestions.
    pub fn update(
        &self,
        suggestions: &[Suggestion],
        votes: &[Vote],
        policy: &AdmissionPolicy,
    ) -> GraphResult<UpdateReport> {
        let before = self.factory.graph().mutations();
        let mut report = UpdateReport::default();

        let admitted = admit(suggestions, votes, policy, &mut report);
        tracing::info!(
            admitted = report.admitted,
            rejected = report.rejected,
            orphan_votes = report.orphan_votes,
            "filtered suggestions"
        );

        for suggestion in admitted {
            let outcome = match &suggestion.action {
                SuggestionAction::Edit(action) => self.apply(&suggestion.doc_id, action)?,
                SuggestionAction::Unrecognized(name) => {
                    tracing::warn!(
                        suggestion = %suggestion.id,
                        action = %name,
                        "invalid action"
                    );
                    Outcome::Unrecognized
                }
                SuggestionAction::Comment => continue,
            };
            report.record(outcome);
        }

        report.finish(self.factory.graph().mutations().since(before));
        Ok(report)
    }

    /// Apply the actions produced by a comparison, removals first.
    pub fn update_from_compare(&self, actions: &UnifyActions) -> GraphResult<UpdateReport> {
        let before = self.factory.graph().mutations();
        let mut report = UpdateReport::default();

        let mut queue: Vec<(&str, &Action)> = actions
            .iter()
            .flat_map(|(doc_id, edits)| edits.iter().map(move |a| (doc_id.as_str(), a)))
            .collect();
        queue.sort_by_key(|(_, action)| action.kind().rank());

        for (doc_id, action) in queue {
            report.record(self.apply(doc_id, action)?);
        }

        report.finish(self.factory.graph().mutations().since(before));
        Ok(report)
    }

    /// Apply one action to the synset named `doc_id`.
    pub fn apply(&self, doc_id: &str, action: &Action) -> GraphResult<Outcome> {
        if format_lexical(action.param()).is_empty() {
            tracing::warn!(doc_id, action = %action.kind(), "empty value, skipping action");
            return Ok(Outcome::EmptyValue);
        }
        let Some(synset) = self.factory.synset_by_id(doc_id)? else {
            tracing::warn!(doc_id, action = %action.kind(), "synset not found, skipping action");
            return Ok(Outcome::UnknownSynset);
        };
        let synset = synset.as_ref();
        let context = action.kind().as_str();
        let graph = self.factory.graph();

        let outcome = match action {
            Action::AddWord(lexical) => {
                if self.factory.get_sense(synset, lexical)?.is_some() {
                    Outcome::AlreadyPresent
                } else {
                    let pos = self.factory.synset_pos(synset);
                    let word = self.factory.word_for(lexical, true, pos.as_deref())?;
                    let sense = self.factory.new_sense(synset, true)?;
                    graph.add(&sense, vocab::HAS_LABEL, &self.factory.lexical_literal(lexical), context)?;
                    if let Some(word) = word {
                        graph.add(&sense, vocab::WORD, word.as_ref(), context)?;
                    }
                    Outcome::Applied
                }
            }
            Action::AddGloss(text) => match self.factory.get_gloss(synset, text)? {
                Some(_) => Outcome::AlreadyPresent,
                None => {
                    graph.add(synset, vocab::GLOSS, &self.factory.lexical_literal(text), context)?;
                    Outcome::Applied
                }
            },
            Action::AddExample(text) => match self.factory.get_example(synset, text)? {
                Some(_) => Outcome::AlreadyPresent,
                None => {
                    graph.add(synset, vocab::EXAMPLE, &self.factory.lexical_literal(text), context)?;
                    Outcome::Applied
                }
            },
            Action::RemoveWord(lexical) => match self.factory.get_sense(synset, lexical)? {
                Some(sense) => {
                    self.remove_sense(sense.as_ref(), context)?;
                    Outcome::Applied
                }
                None => Outcome::NotPresent,
            },
            Action::RemoveGloss(text) => match self.factory.get_gloss(synset, text)? {
                Some(gloss) => {
                    graph.remove(synset, vocab::GLOSS, &gloss, context)?;
                    Outcome::Applied
                }
                None => Outcome::NotPresent,
            },
            Action::RemoveExample(text) => match self.factory.get_example(synset, text)? {
                Some(example) => {
                    graph.remove(synset, vocab::EXAMPLE, &example, context)?;
                    Outcome::Applied
                }
                None => Outcome::NotPresent,
            },
        };

        match outcome {
            Outcome::Applied => {
                let direction = if action.kind().is_addition() { "added to" } else { "removed from" };
                tracing::debug!(doc_id, action = context, param = action.param(), "param {direction} synset");
            }
            _ => {
                let state = if action.kind().is_addition() { "already" } else { "not" };
                tracing::debug!(doc_id, action = context, param = action.param(), "param {state} in synset");
            }
        }
        Ok(outcome)
    }

    /// Drop a sense and, when nothing else points to it, its word.
    fn remove_sense(&self, sense: NamedOrBlankNodeRef<'_>, context: &str) -> GraphResult<()> {
        let graph = self.factory.graph();
        let words: Vec<NamedOrBlankNode> = graph
            .objects(sense, vocab::WORD)?
            .iter()
            .filter_map(crate::graph::term_to_node)
            .collect();
        graph.drop_node(sense, context)?;
        for word in words {
            if !is_referenced(&self.factory, word.as_ref())? {
                graph.drop_node(word.as_ref(), context)?;
            }
        }
        Ok(())
    }
}

/// Whether a word is still used by a sense or a NomLex entry.
pub(crate) fn is_referenced(factory: &NodeFactory<'_>, word: NamedOrBlankNodeRef<'_>) -> GraphResult<bool> {
    let graph = factory.graph();
    for predicate in [vocab::WORD, vocab::NOMLEX_NOUN, vocab::NOMLEX_VERB] {
        if !graph.subjects(predicate, word)?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Join votes onto suggestions, keep the admitted ones and order them.
pub fn admit<'s>(
    suggestions: &'s [Suggestion],
    votes: &[Vote],
    policy: &AdmissionPolicy,
    report: &mut UpdateReport,
) -> Vec<&'s Suggestion> {
    let mut scores: BTreeMap<&str, i64> = suggestions.iter().map(|s| (s.id.as_str(), 0)).collect();
    for vote in votes {
        match scores.get_mut(vote.suggestion_id.as_str()) {
            Some(score) => *score += vote.value,
            None => {
                tracing::warn!(suggestion_id = %vote.suggestion_id, "invalid id: vote names no suggestion");
                report.orphan_votes += 1;
            }
        }
    }

    let mut admitted: Vec<&Suggestion> = suggestions
        .iter()
        .filter(|s| policy.admits(s, scores.get(s.id.as_str()).copied().unwrap_or_default()))
        .collect();
    report.admitted = admitted.len();
    report.rejected = suggestions.len() - admitted.len();

    admitted.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| rank(a).cmp(&rank(b)))
            .then_with(|| a.id.cmp(&b.id))
    });
    admitted
}

fn rank(suggestion: &Suggestion) -> u8 {
    match &suggestion.action {
        SuggestionAction::Edit(action) => action.kind().rank(),
        _ => u8::MAX,
    }
}
