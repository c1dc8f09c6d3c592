//! Lexical literal rules.

use super::Repair;
use crate::error::GraphResult;
use crate::graph::{Query, term_literal, var};
use crate::node::format_lexical;
use crate::vocab;

impl Repair<'_> {
    /// Rewrite labels, lexical forms, glosses and examples into canonical
    /// form: NFC, collapsed whitespace, tagged with the graph language.
    pub(super) fn format_lexicals(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "format_lexicals";
        let graph = self.factory.graph();
        let mut cases = 0;
        for predicate in vocab::LEXICAL_PREDICATES {
            for quad in graph.matching(None, Some(predicate), None)? {
                let Some(literal) = term_literal(&quad.object) else {
                    continue;
                };
                if self.factory.is_canonical_lexical(literal) {
                    continue;
                }
                let formatted = self.factory.lexical_literal(literal.value());
                graph.remove(&quad.subject, predicate, &quad.object, CONTEXT)?;
                if !formatted.value().is_empty() {
                    graph.add(&quad.subject, predicate, &formatted, CONTEXT)?;
                }
                cases += 1;
            }
        }
        Ok(cases)
    }

    /// Replace a sense label that disagrees with the lexical form of the
    /// sense's word.
    pub(super) fn replace_sense_labels(&self) -> GraphResult<usize> {
        const CONTEXT: &str = "replace_sense_labels";
        let graph = self.factory.graph();
        let solutions = Query::new()
            .pattern(var("sense"), vocab::HAS_LABEL, var("label"))
            .pattern(var("sense"), vocab::WORD, var("word"))
            .pattern(var("word"), vocab::LEXICAL_FORM, var("form"))
            .filter(|b| match (b.literal("label"), b.literal("form")) {
                (Some(label), Some(form)) => format_lexical(label.value()) != format_lexical(form.value()),
                _ => false,
            })
            .evaluate(graph)?;

        let mut cases = 0;
        for b in &solutions {
            let (Some(sense), Some(label), Some(form)) = (b.node("sense"), b.literal("label"), b.literal("form"))
            else {
                continue;
            };
            if !graph.contains(&sense, vocab::HAS_LABEL, label)? {
                continue;
            }
            tracing::debug!(sense = %sense, label = label.value(), form = form.value(), "replacing sense label");
            graph.remove(&sense, vocab::HAS_LABEL, label, CONTEXT)?;
            graph.add(&sense, vocab::HAS_LABEL, &self.factory.lexical_literal(form.value()), CONTEXT)?;
            cases += 1;
        }
        Ok(cases)
    }
}

#[cfg(test)]
mod tests {
    use oxigraph::io::RdfFormat;
    use oxigraph::model::{Literal, NamedNode};

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

    #[test]
    fn lexicals_are_normalized_and_tagged() {
        let graph = graph(
            r#"
            inst:synset-00001740-n wn30:gloss "  uma   coisa "@pt ;
                wn30:example "exemplo" .
            inst:word-ente wn30:lexicalForm "ente"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        let outcome = repair.apply(RepairRule::FormatLexicals).unwrap();
        assert_eq!(outcome.cases, 2);
        let synset = inst("synset-00001740-n");
        assert!(graph
            .contains(&synset, vocab::GLOSS, &Literal::new_language_tagged_literal("uma coisa", "pt").unwrap())
            .unwrap());
        assert!(graph
            .contains(&synset, vocab::EXAMPLE, &Literal::new_language_tagged_literal("exemplo", "pt").unwrap())
            .unwrap());

        assert_eq!(repair.apply(RepairRule::FormatLexicals).unwrap().cases, 0);
    }

    #[test]
    fn composed_and_decomposed_forms_converge() {
        let graph = WordnetGraph::new().unwrap();
        let word = inst("word-cafe");
        graph
            .add(&word, vocab::LEXICAL_FORM, &Literal::new_language_tagged_literal("cafe\u{301}", "pt").unwrap(), "test")
            .unwrap();
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        repair.apply(RepairRule::FormatLexicals).unwrap();
        assert_eq!(
            graph.literal_value(&word, vocab::LEXICAL_FORM).unwrap().unwrap().value(),
            "caf\u{e9}"
        );
    }

    #[test]
    fn label_follows_word_form() {
        let graph = graph(
            r#"
            inst:wordsense-00001740-n-1 rdfs:label "entes"@pt ; wn30:word inst:word-ente .
            inst:word-ente wn30:lexicalForm "ente"@pt .
            "#,
        );
        let profile = LangProfile::portuguese();
        let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

        assert_eq!(repair.apply(RepairRule::ReplaceSenseLabels).unwrap().cases, 1);
        let labels = graph
            .objects(&inst("wordsense-00001740-n-1"), vocab::HAS_LABEL)
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(term_literal(&labels[0]).unwrap().value(), "ente");

        assert_eq!(repair.apply(RepairRule::ReplaceSenseLabels).unwrap().cases, 0);
    }
}
