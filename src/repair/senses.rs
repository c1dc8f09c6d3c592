//! Sense rules, plus the ordering pass that renumbers sense identifiers.

use std::collections::{BTreeMap, HashSet};

use oxigraph::model::{BlankNode, Literal, NamedNode, NamedOrBlankNode};

use super::words::sense_words;
use super::{Repair, node_key};
use crate::error::GraphResult;
use crate::graph::{Query, TriplePattern, term_literal, var};
use crate::node::{format_lexical, sense_ordinal};
use crate::vocab;

impl Repair<'_> {
    pub(super) fn add_sense_types(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let senses = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .not_exists([TriplePattern::new(var("sense"), vocab::HAS_TYPE, var("type"))])
            .select_nodes(graph, "sense")?;
        for sense in &senses {
            graph.add(sense, vocab::HAS_TYPE, vocab::TYPE_WORD_SENSE, "add_sense_types")?;
        }
        Ok(senses.len())
    }

    /// Blank senses get the next free identifier of their synset. Their own
    /// `wordNumber` is discarded so the ordinal follows the identifier.
    pub(super) fn resolve_blank_senses(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "resolve_blank_senses";
        let graph = self.factory.graph();
        let links = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .filter(|b| b.is_blank("sense"))
            .evaluate(graph)?;

        let mut resolved = 0;
        for link in &links {
            let (Some(synset), Some(sense)) = (link.node("synset"), link.node("sense")) else {
                continue;
            };
            if !graph.has_node(sense.as_ref())? {
                continue;
            }
            graph.remove_all(&sense, vocab::WORD_NUMBER, CONTEXT)?;
            let minted = self.factory.new_sense(synset.as_ref(), false)?;
            graph.replace_node(sense.as_ref(), minted.as_ref().into(), CONTEXT)?;
            resolved += 1;
        }
        Ok(resolved)
    }

    /// Link a word, found or created from the label, to senses without one.
    pub(super) fn expand_sense_words(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let solutions = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .pattern(var("sense"), vocab::HAS_LABEL, var("label"))
            .not_exists([TriplePattern::new(var("sense"), vocab::WORD, var("word"))])
            .evaluate(graph)?;

        let mut pending: BTreeMap<String, (NamedOrBlankNode, NamedOrBlankNode, String)> = BTreeMap::new();
        for b in &solutions {
            let (Some(synset), Some(sense), Some(label)) = (b.node("synset"), b.node("sense"), b.literal("label"))
            else {
                continue;
            };
            let label = format_lexical(label.value());
            if label.is_empty() {
                continue;
            }
            let entry = pending
                .entry(node_key(&sense))
                .or_insert_with(|| (synset.clone(), sense.clone(), label.clone()));
            if label < entry.2 {
                entry.2 = label;
            }
        }

        for (synset, sense, label) in pending.values() {
            let pos = self.factory.synset_pos(synset.as_ref());
            if let Some(word) = self.factory.word_for(label, true, pos.as_deref())? {
                graph.add(sense, vocab::WORD, word.as_ref(), "expand_sense_words")?;
            }
        }
        Ok(pending.len())
    }

    /// A sense keeps the word matching its label (or its first word); every
    /// other word moves to a new sense of the same synset.
    pub(super) fn split_multi_word_senses(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "split_multi_word_senses";
        let graph = self.factory.graph();
        let solutions = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .pattern(var("sense"), vocab::WORD, var("a"))
            .pattern(var("sense"), vocab::WORD, var("b"))
            .filter(|b| b.get("a") != b.get("b"))
            .evaluate(graph)?;

        let mut senses: BTreeMap<String, (NamedOrBlankNode, NamedOrBlankNode)> = BTreeMap::new();
        for b in &solutions {
            if let (Some(synset), Some(sense)) = (b.node("synset"), b.node("sense")) {
                senses.entry(node_key(&sense)).or_insert((synset, sense));
            }
        }

        for (synset, sense) in senses.values() {
            let words = sense_words(graph, sense)?;
            let label = graph
                .literal_value(sense, vocab::HAS_LABEL)?
                .map(|l| format_lexical(l.value()));
            let mut keep = 0;
            for (i, word) in words.iter().enumerate() {
                let form = graph
                    .literal_value(word, vocab::LEXICAL_FORM)?
                    .map(|l| format_lexical(l.value()));
                if form.is_some() && form == label {
                    keep = i;
                    break;
                }
            }
            for (i, word) in words.iter().enumerate() {
                if i == keep {
                    continue;
                }
                graph.remove(sense, vocab::WORD, word.as_ref(), CONTEXT)?;
                let split = self.factory.new_sense(synset.as_ref(), true)?;
                graph.add(&split, vocab::WORD, word.as_ref(), CONTEXT)?;
            }
        }
        Ok(senses.len())
    }

    /// Senses without a label take their word's lexical form; senses with
    /// neither label nor word are dropped.
    pub(super) fn add_sense_labels(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "add_sense_labels";
        let graph = self.factory.graph();
        let senses = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .select_nodes(graph, "sense")?;

        let mut cases = 0;
        for sense in &senses {
            let labelled = graph
                .objects(sense, vocab::HAS_LABEL)?
                .iter()
                .filter_map(term_literal)
                .any(|l| !format_lexical(l.value()).is_empty());
            if labelled {
                continue;
            }
            cases += 1;

            let mut form = None;
            for word in sense_words(graph, sense)? {
                if let Some(lexical) = graph.literal_value(&word, vocab::LEXICAL_FORM)? {
                    form = Some(lexical);
                    break;
                }
            }
            match form {
                Some(lexical) => {
                    let label = self.factory.lexical_literal(lexical.value());
                    graph.add(sense, vocab::HAS_LABEL, &label, CONTEXT)?;
                }
                None => {
                    tracing::debug!(sense = %sense, "void sense has neither label nor word, dropping");
                    graph.drop_node(sense.as_ref(), CONTEXT)?;
                }
            }
        }
        Ok(cases)
    }

    /// Senses without a `wordNumber` take the ordinal their identifier ends with.
    pub(super) fn add_sense_numbers(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let senses = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .not_exists([TriplePattern::new(var("sense"), vocab::WORD_NUMBER, var("number"))])
            .select_nodes(graph, "sense")?;
        for sense in &senses {
            match sense_ordinal(sense.as_ref()) {
                Some(ordinal) => {
                    let number = Literal::new_simple_literal(ordinal.to_string());
                    graph.add(sense, vocab::WORD_NUMBER, &number, "add_sense_numbers")?;
                }
                None => tracing::debug!(sense = %sense, "sense identifier carries no ordinal"),
            }
        }
        Ok(senses.len())
    }

    /// Merge senses of one synset that share a label. The lowest-numbered
    /// sense survives; the duplicate's own ordinal is discarded.
    pub(super) fn remove_sense_duplicates(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "remove_sense_duplicates";
        let graph = self.factory.graph();
        let solutions = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .pattern(var("sense"), vocab::HAS_LABEL, var("label"))
            .evaluate(graph)?;

        let mut groups: BTreeMap<(String, String), BTreeMap<(u32, String), NamedOrBlankNode>> =
            BTreeMap::new();
        for b in &solutions {
            let (Some(synset), Some(sense), Some(label)) = (b.node("synset"), b.node("sense"), b.literal("label"))
            else {
                continue;
            };
            let order = (sense_ordinal(sense.as_ref()).unwrap_or(u32::MAX), node_key(&sense));
            groups
                .entry((node_key(&synset), format_lexical(label.value())))
                .or_default()
                .insert(order, sense);
        }

        let mut merged = 0;
        for senses in groups.values() {
            let mut ordered = senses.values();
            let Some(canonical) = ordered.next() else {
                continue;
            };
            for duplicate in ordered {
                if !graph.has_node(duplicate.as_ref())? {
                    continue;
                }
                tracing::debug!(duplicate = %duplicate, canonical = %canonical, "merging duplicate sense");
                graph.remove_all(duplicate, vocab::WORD_NUMBER, CONTEXT)?;
                graph.replace_node(duplicate.as_ref(), canonical.as_ref(), CONTEXT)?;
                merged += 1;
            }
        }
        Ok(merged)
    }

    /// Drop senses that no synset contains.
    pub(super) fn remove_disconnected_senses(&self) -> GraphResult<usize> {
        let graph = self.factory.graph();
        let mut candidates = BTreeMap::new();
        for quad in graph.matching(None, Some(vocab::WORD), None)? {
            candidates.insert(node_key(&quad.subject), quad.subject);
        }
        for class in vocab::SENSE_TYPES {
            for quad in graph.matching(None, Some(vocab::HAS_TYPE), Some(class.into()))? {
                candidates.insert(node_key(&quad.subject), quad.subject);
            }
        }

        let mut dropped = 0;
        for sense in candidates.values() {
            if !graph.subjects(vocab::CONTAINS_WORD_SENSE, sense.as_ref())?.is_empty() {
                continue;
            }
            graph.drop_node(sense.as_ref(), "remove_disconnected_senses")?;
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Renumber each synset's senses to the contiguous ordinals `1..=n`.
    ///
    /// Senses are ordered by their current `wordNumber`, then identifier.
    /// Renaming goes through fresh blank nodes so that no two senses ever
    /// share an identifier mid-way. Returns the number of senses changed.
    pub fn sort_senses_instances(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "sort_senses_instances";
        let graph = self.factory.graph();
        let links = Query::new()
            .pattern(var("synset"), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .evaluate(graph)?;

        let mut synsets: BTreeMap<String, (NamedOrBlankNode, Vec<NamedOrBlankNode>)> = BTreeMap::new();
        let mut seen = HashSet::new();
        for b in &links {
            let (Some(synset), Some(sense)) = (b.node("synset"), b.node("sense")) else {
                continue;
            };
            if seen.insert(sense.clone()) {
                synsets
                    .entry(node_key(&synset))
                    .or_insert_with(|| (synset, Vec::new()))
                    .1
                    .push(sense);
            }
        }

        let mut changed = 0;
        for (synset, senses) in synsets.values() {
            let mut ordered = Vec::with_capacity(senses.len());
            for sense in senses {
                let number = graph
                    .literal_value(sense, vocab::WORD_NUMBER)?
                    .and_then(|l| l.value().parse::<u32>().ok());
                ordered.push((number.unwrap_or(u32::MAX), node_key(sense), sense));
            }
            ordered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

            let mut renames: Vec<(&NamedOrBlankNode, NamedNode, u32)> = Vec::new();
            for (index, (number, _, sense)) in ordered.into_iter().enumerate() {
                let ordinal = index as u32 + 1;
                let target = self.factory.sense_iri(synset.as_ref(), ordinal);
                if *sense == NamedOrBlankNode::NamedNode(target.clone()) {
                    if number != ordinal {
                        set_number(self, sense, ordinal, CONTEXT)?;
                        changed += 1;
                    }
                } else {
                    renames.push((sense, target, ordinal));
                }
            }

            let mut staged = Vec::with_capacity(renames.len());
            for (sense, target, ordinal) in renames {
                let temporary = BlankNode::default();
                graph.replace_node(sense.as_ref(), temporary.as_ref().into(), CONTEXT)?;
                staged.push((temporary, target, ordinal));
            }
            for (temporary, target, ordinal) in staged {
                graph.replace_node(temporary.as_ref().into(), target.as_ref().into(), CONTEXT)?;
                set_number(self, &NamedOrBlankNode::NamedNode(target), ordinal, CONTEXT)?;
                changed += 1;
            }
        }
        tracing::info!(senses = changed, "renumbered senses");
        Ok(changed)
    }
}

fn set_number(repair: &Repair<'_>, sense: &NamedOrBlankNode, ordinal: u32, context: &str) -> GraphResult<()> {
    let graph = repair.factory.graph();
    let number = Literal::new_simple_literal(ordinal.to_string());
    for term in graph.objects(sense, vocab::WORD_NUMBER)? {
        if term_literal(&term) != Some(&number) {
            graph.remove(sense, vocab::WORD_NUMBER, &term, context)?;
        }
    }
    graph.add(sense, vocab::WORD_NUMBER, &number, context)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use oxigraph::io::RdfFormat;

    use super::super::RepairRule;
    use super::*;
    use crate::config::{LangProfile, WordIdentity};
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

    fn number(graph: &WordnetGraph, sense: &NamedNode) -> Option<String> {
        graph
            .literal_value(sense, vocab::WORD_NUMBER)
            .unwrap()
            .map(|l| l.value().to_string())
    }

    #[test]
    fn blank_sense_gets_next_identifier() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1, _:s .
            _:s rdfs:label "ente"@pt ; wn30:wordNumber "7" .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::ResolveBlankSenses).unwrap().cases, 1);
        let minted = inst("wordsense-00001740-n-2");
        assert!(graph
            .contains(&inst("synset-00001740-n"), vocab::CONTAINS_WORD_SENSE, &minted)
            .unwrap());
        assert_eq!(number(&graph, &minted), None);

        repair.apply(RepairRule::AddSenseNumbers).unwrap();
        assert_eq!(number(&graph, &minted).as_deref(), Some("2"));
    }

    #[test]
    fn multi_word_sense_is_split() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1 .
            inst:wordsense-00001740-n-1 rdfs:label "ente"@pt ;
                wn30:word inst:word-entidade, inst:word-ente .
            inst:word-ente wn30:lexicalForm "ente"@pt .
            inst:word-entidade wn30:lexicalForm "entidade"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::SplitMultiWordSenses).unwrap().cases, 1);
        assert_eq!(
            graph.objects(&inst("wordsense-00001740-n-1"), vocab::WORD).unwrap(),
            vec![oxigraph::model::Term::NamedNode(inst("word-ente"))]
        );
        assert!(graph
            .contains(&inst("wordsense-00001740-n-2"), vocab::WORD, &inst("word-entidade"))
            .unwrap());
    }

    #[test]
    fn void_sense_is_dropped_and_labelled_sense_kept() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1,
                                                         inst:wordsense-00001740-n-2 .
            inst:wordsense-00001740-n-1 wn30:word inst:word-ente .
            inst:word-ente wn30:lexicalForm "ente"@pt .
            inst:wordsense-00001740-n-2 a wn30:WordSense .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::AddSenseLabels).unwrap().cases, 2);
        assert_eq!(
            graph
                .literal_value(&inst("wordsense-00001740-n-1"), vocab::HAS_LABEL)
                .unwrap()
                .unwrap()
                .value(),
            "ente"
        );
        assert!(!graph.has_node(inst("wordsense-00001740-n-2").as_ref().into()).unwrap());
    }

    #[test]
    fn duplicate_senses_keep_lowest_ordinal() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-3,
                                                         inst:wordsense-00001740-n-1 .
            inst:wordsense-00001740-n-1 rdfs:label "ente"@pt ; wn30:wordNumber "1" .
            inst:wordsense-00001740-n-3 rdfs:label "ente"@pt ; wn30:wordNumber "3" ;
                wn30:antonymOf inst:wordsense-00002137-n-1 .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::RemoveSenseDuplicates).unwrap().cases, 1);
        let kept = inst("wordsense-00001740-n-1");
        assert_eq!(number(&graph, &kept).as_deref(), Some("1"));
        assert!(graph
            .contains(&kept, vocab::ANTONYM_OF, &inst("wordsense-00002137-n-1"))
            .unwrap());
        assert!(!graph.has_node(inst("wordsense-00001740-n-3").as_ref().into()).unwrap());
    }

    #[test]
    fn disconnected_senses_are_dropped() {
        let graph = graph(
            r#"
            inst:wordsense-00009999-n-1 a wn30:WordSense ; rdfs:label "solta"@pt .
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-1 .
            inst:wordsense-00001740-n-1 a wn30:WordSense .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::RemoveDisconnectedSenses).unwrap().cases, 1);
        assert_eq!(graph.len().unwrap(), 2);
    }

    #[test]
    fn sort_closes_gaps_in_ordinals() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:containsWordSense inst:wordsense-00001740-n-2,
                                                         inst:wordsense-00001740-n-5 .
            inst:wordsense-00001740-n-2 rdfs:label "ente"@pt ; wn30:wordNumber "2" .
            inst:wordsense-00001740-n-5 rdfs:label "entidade"@pt ; wn30:wordNumber "5" .
            inst:wordsense-00002137-n-1 wn30:antonymOf inst:wordsense-00001740-n-5 .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.sort_senses_instances().unwrap(), 2);
        let first = inst("wordsense-00001740-n-1");
        let second = inst("wordsense-00001740-n-2");
        assert_eq!(number(&graph, &first).as_deref(), Some("1"));
        assert_eq!(number(&graph, &second).as_deref(), Some("2"));
        assert_eq!(
            graph.literal_value(&second, vocab::HAS_LABEL).unwrap().unwrap().value(),
            "entidade"
        );
        assert!(graph
            .contains(&inst("wordsense-00002137-n-1"), vocab::ANTONYM_OF, &second)
            .unwrap());

        assert_eq!(repair.sort_senses_instances().unwrap(), 0);
    }
}
