//! Word rules: typing, identity, splitting, deduplication and sweeping.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use oxigraph::model::{Literal, NamedOrBlankNode};

use super::{Repair, node_key};
use crate::config::WordIdentity;
use crate::error::GraphResult;
use crate::graph::{Query, TriplePattern, term_literal, term_to_node, var};
use crate::node::format_lexical;
use crate::update::is_referenced;
use crate::vocab;

impl Repair<'_> {
    pub(super) fn add_word_types(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let words = Query::new()
            .pattern(var("sense"), vocab::WORD, var("word"))
            .not_exists([TriplePattern::new(var("word"), vocab::HAS_TYPE, var("type"))])
            .select_nodes(graph, "word")?;
        for word in &words {
            graph.add(word, vocab::HAS_TYPE, vocab::TYPE_WORD, "add_word_types")?;
        }
        Ok(words.len())
    }

    /// Blank words take the identifier of their lexical form, or of their
    /// sense's label when they have none. Blank words with neither are dropped.
    pub(super) fn resolve_blank_words(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "resolve_blank_words";
        let graph = self.factory.graph();
        let links = Query::new()
            .pattern(var("sense"), vocab::WORD, var("word"))
            .filter(|b| b.is_blank("word"))
            .evaluate(graph)?;

        let mut seen = HashSet::new();
        for link in &links {
            let (Some(sense), Some(word)) = (link.node("sense"), link.node("word")) else {
                continue;
            };
            if !seen.insert(word.clone()) || !graph.has_node(word.as_ref())? {
                continue;
            }
            let pos = self.factory.sense_pos(sense.as_ref())?;
            let target = match lexical_forms(graph, &word)?.into_iter().next() {
                Some(form) => Some(NamedOrBlankNode::NamedNode(
                    self.factory.word_iri(&form, pos.as_deref()),
                )),
                None => match graph.literal_value(&sense, vocab::HAS_LABEL)? {
                    Some(label) if !format_lexical(label.value()).is_empty() => {
                        self.factory.word_for(label.value(), true, pos.as_deref())?
                    }
                    _ => None,
                },
            };

            match target {
                Some(target) => {
                    graph.replace_node(word.as_ref(), target.as_ref(), CONTEXT)?;
                    if let (WordIdentity::PartOfSpeech, Some(pos)) = (self.factory.identity(), &pos) {
                        if graph.value(&target, vocab::POS)?.is_none() {
                            graph.add(&target, vocab::POS, &Literal::new_simple_literal(pos), CONTEXT)?;
                        }
                    }
                }
                None => {
                    tracing::debug!(sense = %sense, "blank word has no lexical form or label, dropping");
                    graph.drop_node(word.as_ref(), CONTEXT)?;
                }
            }
        }
        Ok(seen.len())
    }

    /// Unlink words that have no lexical form. A form that normalizes to
    /// the empty string counts as none.
    pub(super) fn remove_void_words(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let links = Query::new()
            .pattern(var("sense"), vocab::WORD, var("word"))
            .evaluate(graph)?;
        let mut cases = 0;
        for link in &links {
            let (Some(sense), Some(word)) = (link.node("sense"), link.get("word")) else {
                continue;
            };
            if let Some(node) = term_to_node(word) {
                if !lexical_forms(graph, &node)?.is_empty() {
                    continue;
                }
            }
            graph.remove(&sense, vocab::WORD, word, "remove_void_words")?;
            cases += 1;
        }
        Ok(cases)
    }

    /// Words with several distinct lexical forms are dropped; each sense is
    /// relinked to a word for the form matching its label.
    pub(super) fn expand_double_words(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "expand_double_words";
        let graph = self.factory.graph();
        let doubles = Query::new()
            .pattern(var("word"), vocab::LEXICAL_FORM, var("a"))
            .pattern(var("word"), vocab::LEXICAL_FORM, var("b"))
            .filter(|b| match (b.literal("a"), b.literal("b")) {
                (Some(a), Some(b)) => {
                    let (a, b) = (format_lexical(a.value()), format_lexical(b.value()));
                    !a.is_empty() && !b.is_empty() && a != b
                }
                _ => false,
            })
            .select_nodes(graph, "word")?;

        for word in &doubles {
            let forms = lexical_forms(graph, word)?;
            let senses = graph.subjects(vocab::WORD, word.as_ref())?;
            tracing::debug!(word = %word, forms = ?forms, "splitting word with several lexical forms");
            graph.drop_node(word.as_ref(), CONTEXT)?;

            for sense in senses {
                let label = graph
                    .objects(&sense, vocab::HAS_LABEL)?
                    .iter()
                    .filter_map(term_literal)
                    .map(|l| format_lexical(l.value()))
                    .find(|label| forms.contains(label));
                let Some(label) = label else {
                    continue;
                };
                let pos = self.factory.sense_pos(sense.as_ref())?;
                if let Some(relinked) = self.factory.word_for(&label, true, pos.as_deref())? {
                    graph.add(&sense, vocab::WORD, relinked.as_ref(), CONTEXT)?;
                }
            }
        }
        Ok(doubles.len())
    }

    /// Merge words sharing a lexical form (and part of speech, when words are
    /// partitioned by it) into one canonical word.
    pub(super) fn remove_word_duplicates(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "remove_word_duplicates";
        let graph = self.factory.graph();
        let partitioned = self.factory.identity() == WordIdentity::PartOfSpeech;

        let mut groups: BTreeMap<(String, Option<String>), BTreeMap<String, NamedOrBlankNode>> =
            BTreeMap::new();
        for quad in graph.matching(None, Some(vocab::LEXICAL_FORM), None)? {
            let Some(lexical) = term_literal(&quad.object) else {
                continue;
            };
            let lexical = format_lexical(lexical.value());
            if lexical.is_empty() {
                continue;
            }
            let pos = if partitioned {
                graph
                    .literal_value(&quad.subject, vocab::POS)?
                    .map(|l| l.value().to_string())
            } else {
                None
            };
            groups
                .entry((lexical, pos))
                .or_default()
                .insert(node_key(&quad.subject), quad.subject);
        }

        let mut merged = 0;
        for ((lexical, pos), words) in groups {
            if words.len() < 2 {
                continue;
            }
            let preferred = NamedOrBlankNode::NamedNode(self.factory.word_iri(&lexical, pos.as_deref()));
            let canonical = if words.values().any(|w| *w == preferred) {
                preferred
            } else {
                words
                    .values()
                    .find(|w| matches!(w, NamedOrBlankNode::NamedNode(_)))
                    .or_else(|| words.values().next())
                    .cloned()
                    .unwrap_or(preferred)
            };
            for word in words.values().filter(|w| **w != canonical) {
                if !graph.has_node(word.as_ref())? {
                    continue;
                }
                tracing::debug!(duplicate = %word, canonical = %canonical, "merging duplicate word");
                graph.replace_node(word.as_ref(), canonical.as_ref(), CONTEXT)?;
                merged += 1;
            }
        }
        Ok(merged)
    }

    /// Drop words no sense or NomLex entry refers to.
    pub(super) fn remove_disconnected_words(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let mut candidates = BTreeMap::new();
        for quad in graph.matching(None, Some(vocab::LEXICAL_FORM), None)? {
            candidates.insert(node_key(&quad.subject), quad.subject);
        }
        for quad in graph.matching(None, Some(vocab::HAS_TYPE), Some(vocab::TYPE_WORD.into()))? {
            candidates.insert(node_key(&quad.subject), quad.subject);
        }

        let mut dropped = 0;
        for word in candidates.values() {
            if is_referenced(&self.factory, word.as_ref())? {
                continue;
            }
            graph.drop_node(word.as_ref(), "remove_disconnected_words")?;
            dropped += 1;
        }
        Ok(dropped)
    }
}

/// Distinct non-empty normalized lexical forms of a word.
fn lexical_forms(
    graph: &crate::graph::WordnetGraph,
    word: &NamedOrBlankNode,
) -> GraphResult<BTreeSet<String>> {
    Ok(graph
        .objects(word, vocab::LEXICAL_FORM)?
        .iter()
        .filter_map(term_literal)
        .map(|l| format_lexical(l.value()))
        .filter(|form| !form.is_empty())
        .collect())
}

/// Words linked from a sense, in deterministic order.
pub(super) fn sense_words(
    graph: &crate::graph::WordnetGraph,
    sense: &NamedOrBlankNode,
) -> GraphResult<Vec<NamedOrBlankNode>> {
    let mut words: Vec<NamedOrBlankNode> = graph
        .objects(sense, vocab::WORD)?
        .iter()
        .filter_map(term_to_node)
        .collect();
    words.sort_by_key(node_key);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use oxigraph::io::RdfFormat;
    use oxigraph::model::NamedNode;

    use super::super::RepairRule;
    use super::*;
    use crate::config::LangProfile;
    use crate::graph::WordnetGraph;
    use crate::node::NodeFactory;

    const PREFIXES: &str = r#"
        @prefix wn30: <https://w3id.org/own-pt/wn30/schema/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix inst: <https://w3id.org/own-pt/wn30-pt/instances/> .
    "#;

    fn graph(body: &str) -> WordnetGraph {
        let graph = WordnetGraph::new().unwrap();
        graph
            .load_str(RdfFormat::Turtle, &format!("{PREFIXES}{body}"))
            .unwrap();
        graph
    }

    fn inst(local: &str) -> NamedNode {
        NamedNode::new(format!("https://w3id.org/own-pt/wn30-pt/instances/{local}")).unwrap()
    }

    #[test]
    fn blank_word_takes_lexical_identifier() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1 .
            inst:wordsense-00001740-n-1 rdfs:label "ente"@pt ; wn30:word _:w .
            _:w wn30:lexicalForm "ente"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        let outcome = repair.apply(RepairRule::ResolveBlankWords).unwrap();
        assert_eq!(outcome.cases, 1);
        assert!(graph
            .contains(&inst("wordsense-00001740-n-1"), vocab::WORD, &inst("word-ente"))
            .unwrap());
        assert!(graph
            .contains(&inst("word-ente"), vocab::LEXICAL_FORM, &Literal::new_language_tagged_literal_unchecked("ente", "pt"))
            .unwrap());
    }

    #[test]
    fn blank_word_without_form_uses_label() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1 .
            inst:wordsense-00001740-n-1 rdfs:label "ser vivo"@pt ; wn30:word _:w .
            _:w a wn30:Word .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        repair.apply(RepairRule::ResolveBlankWords).unwrap();
        assert!(graph
            .contains(&inst("wordsense-00001740-n-1"), vocab::WORD, &inst("word-ser_vivo"))
            .unwrap());
    }

    #[test]
    fn void_words_are_unlinked() {
        let graph = graph(
            r#"
            inst:wordsense-00001740-n-1 wn30:word inst:word-x .
            inst:word-x a wn30:Word .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::RemoveVoidWords).unwrap().removed, 1);
        assert_eq!(repair.apply(RepairRule::RemoveDisconnectedWords).unwrap().cases, 1);
        assert!(graph.is_empty().unwrap());
    }

    #[test]
    fn double_word_is_split_by_label() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1, inst:wordsense-00001740-n-2 .
            inst:wordsense-00001740-n-1 rdfs:label "ente"@pt ; wn30:word inst:word-ente .
            inst:wordsense-00001740-n-2 rdfs:label "entidade"@pt ; wn30:word inst:word-ente .
            inst:word-ente wn30:lexicalForm "ente"@pt, "entidade"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::ExpandDoubleWords).unwrap().cases, 1);
        assert!(graph
            .contains(&inst("wordsense-00001740-n-1"), vocab::WORD, &inst("word-ente"))
            .unwrap());
        assert!(graph
            .contains(&inst("wordsense-00001740-n-2"), vocab::WORD, &inst("word-entidade"))
            .unwrap());
        assert_eq!(graph.objects(&inst("word-ente"), vocab::LEXICAL_FORM).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_words_merge_into_canonical() {
        let graph = graph(
            r#"
            inst:wordsense-00001740-n-1 wn30:word inst:word-legacy .
            inst:wordsense-00002137-n-1 wn30:word inst:word-ente .
            inst:word-legacy wn30:lexicalForm "ente"@pt .
            inst:word-ente wn30:lexicalForm "ente"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::RemoveWordDuplicates).unwrap().cases, 1);
        assert!(graph
            .contains(&inst("wordsense-00001740-n-1"), vocab::WORD, &inst("word-ente"))
            .unwrap());
        assert!(!graph.has_node(inst("word-legacy").as_ref().into()).unwrap());
    }

    #[test]
    fn nomlex_keeps_word_connected() {
        let graph = graph(
            r#"
            @prefix nomlex: <https://w3id.org/own-pt/nomlex/schema/> .
            _:entry nomlex:noun inst:word-corrida .
            inst:word-corrida a wn30:Word ; wn30:lexicalForm "corrida"@pt .
            inst:word-orfa a wn30:Word ; wn30:lexicalForm "órfã"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::RemoveDisconnectedWords).unwrap().cases, 1);
        assert!(graph.has_node(inst("word-corrida").as_ref().into()).unwrap());
        assert!(!graph.has_node(inst("word-orfa").as_ref().into()).unwrap());
    }
}
