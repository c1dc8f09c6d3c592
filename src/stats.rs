//! Read-only graph statistics computed with SPARQL aggregates.

use std::collections::BTreeMap;

use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;
use serde::Serialize;

use crate::error::{GraphError, GraphResult};
use crate::graph::WordnetGraph;
use crate::vocab::SCHEMA_NS;

/// Synset classes reported individually, by schema local name.
const SYNSET_CLASSES: [&str; 5] = [
    "NounSynset",
    "VerbSynset",
    "AdverbSynset",
    "AdjectiveSynset",
    "AdjectiveSatelliteSynset",
];

/// Part of speech → synset classes carrying it.
const PARTS_OF_SPEECH: [(&str, &[&str]); 4] = [
    ("n", &["NounSynset"]),
    ("v", &["VerbSynset"]),
    ("r", &["AdverbSynset"]),
    ("a", &["AdjectiveSynset", "AdjectiveSatelliteSynset"]),
];

/// Key used for whole-graph totals.
pub const TOTAL: &str = "total";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Senses contained in some synset.
    pub senses: usize,
    /// Words linked from some sense.
    pub words: usize,
    /// Synsets with at least one sense.
    pub synsets: usize,
}

/// Synsets with exactly one sense and with more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Polysemy {
    pub monosemous: usize,
    pub polysemous: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub defined: BTreeMap<String, usize>,
    pub polysemy: BTreeMap<String, Polysemy>,
    pub multi_word_expressions: BTreeMap<String, usize>,
}

pub struct Statistics<'g> {
    graph: &'g WordnetGraph,
}

impl<'g> Statistics<'g> {
    pub fn new(graph: &'g WordnetGraph) -> Self {
        Self { graph }
    }

    /// Every statistic at once.
    pub fn report(&self) -> GraphResult<Report> {
        Ok(Report {
            summary: self.summary()?,
            defined: self.defined()?,
            polysemy: self.polysemy()?,
            multi_word_expressions: self.multi_word_expressions()?,
        })
    }

    pub fn summary(&self) -> GraphResult<Summary> {
        tracing::debug!("counting senses, words and synsets");
        Ok(Summary {
            senses: self.count("?ss wn30:containsWordSense ?x .")?,
            words: self.count("?s wn30:word ?x .")?,
            synsets: self.count("?x wn30:containsWordSense ?s .")?,
        })
    }

    /// Synsets with at least one sense, per synset class.
    pub fn defined(&self) -> GraphResult<BTreeMap<String, usize>> {
        tracing::debug!("counting defined synsets");
        let mut counts = BTreeMap::new();
        for class in SYNSET_CLASSES {
            let pattern = format!("?x a wn30:{class} ; wn30:containsWordSense ?s .");
            counts.insert(class.to_string(), self.count(&pattern)?);
        }
        counts.insert(TOTAL.to_string(), self.count("?x wn30:containsWordSense ?s .")?);
        Ok(counts)
    }

    /// Mono- and polysemous synsets, per synset class.
    pub fn polysemy(&self) -> GraphResult<BTreeMap<String, Polysemy>> {
        tracing::debug!("counting polysemy");
        let mut counts = BTreeMap::new();
        for class in SYNSET_CLASSES {
            counts.insert(class.to_string(), self.polysemy_of(&format!("?x a wn30:{class} ."))?);
        }
        counts.insert(TOTAL.to_string(), self.polysemy_of("")?);
        Ok(counts)
    }

    fn polysemy_of(&self, typing: &str) -> GraphResult<Polysemy> {
        let polysemous = format!(
            "{typing} ?x wn30:containsWordSense ?s1 , ?s2 . FILTER(?s1 != ?s2)"
        );
        let monosemous = format!(
            "{typing} ?x wn30:containsWordSense ?s1 . \
             FILTER NOT EXISTS {{ ?x wn30:containsWordSense ?s2 . FILTER(?s1 != ?s2) }}"
        );
        Ok(Polysemy {
            monosemous: self.count(&monosemous)?,
            polysemous: self.count(&polysemous)?,
        })
    }

    /// Words whose lexical form has more than one token, per part of speech.
    pub fn multi_word_expressions(&self) -> GraphResult<BTreeMap<String, usize>> {
        tracing::debug!("counting multi-word expressions");
        let mwe = "?x wn30:lexicalForm ?l . FILTER(CONTAINS(STR(?l), \" \"))";
        let mut counts = BTreeMap::new();
        for (pos, classes) in PARTS_OF_SPEECH {
            let values: Vec<String> = classes.iter().map(|c| format!("wn30:{c}")).collect();
            let pattern = format!(
                "VALUES ?type {{ {} }} ?ss a ?type ; wn30:containsWordSense ?s . ?s wn30:word ?x . {}",
                values.join(" "),
                mwe,
            );
            counts.insert(pos.to_string(), self.count(&pattern)?);
        }
        counts.insert(TOTAL.to_string(), self.count(mwe)?);
        Ok(counts)
    }

    /// `COUNT(DISTINCT ?x)` over `pattern`.
    fn count(&self, pattern: &str) -> GraphResult<usize> {
        let sparql = format!(
            "PREFIX wn30: <{SCHEMA_NS}> SELECT (COUNT(DISTINCT ?x) AS ?count) WHERE {{ {pattern} }}"
        );
        #[allow(deprecated)]
        let results = self.graph.store().query(sparql.as_str()).map_err(|e| GraphError::Sparql {
            message: format!("SPARQL count query failed: {e}"),
        })?;

        match results {
            QueryResults::Solutions(mut solutions) => {
                let Some(solution) = solutions.next() else {
                    return Ok(0);
                };
                let solution = solution.map_err(|e| GraphError::Sparql {
                    message: format!("solution error: {e}"),
                })?;
                match solution.get("count") {
                    Some(Term::Literal(count)) => count.value().parse().map_err(|e| GraphError::Sparql {
                        message: format!("non-numeric count '{}': {e}", count.value()),
                    }),
                    _ => Ok(0),
                }
            }
            _ => Err(GraphError::Sparql {
                message: "unexpected result type from count query".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use oxigraph::io::RdfFormat;

    use super::*;

    fn sample() -> WordnetGraph {
        let graph = WordnetGraph::new().unwrap();
        graph
            .load_str(
                RdfFormat::Turtle,
                r#"
                @prefix wn30: <https://w3id.org/own-pt/wn30/schema/> .
                @prefix inst: <https://w3id.org/own-pt/wn30-pt/instances/> .
                inst:synset-00001740-n a wn30:NounSynset ;
                    wn30:containsWordSense inst:wordsense-00001740-n-1, inst:wordsense-00001740-n-2 .
                inst:wordsense-00001740-n-1 wn30:word inst:word-ente .
                inst:wordsense-00001740-n-2 wn30:word inst:word-ser_vivo .
                inst:word-ente wn30:lexicalForm "ente"@pt .
                inst:word-ser_vivo wn30:lexicalForm "ser vivo"@pt .
                inst:synset-00002137-v a wn30:VerbSynset ;
                    wn30:containsWordSense inst:wordsense-00002137-v-1 .
                inst:wordsense-00002137-v-1 wn30:word inst:word-abstrair .
                inst:word-abstrair wn30:lexicalForm "abstrair"@pt .
                inst:synset-00003000-r a wn30:AdverbSynset .
                "#,
            )
            .unwrap();
        graph
    }

    #[test]
    fn summary_counts() {
        let graph = sample();
        let summary = Statistics::new(&graph).summary().unwrap();
        assert_eq!(
            summary,
            Summary {
                senses: 3,
                words: 3,
                synsets: 2
            }
        );
    }

    #[test]
    fn defined_and_polysemy_per_class() {
        let graph = sample();
        let stats = Statistics::new(&graph);

        let defined = stats.defined().unwrap();
        assert_eq!(defined["NounSynset"], 1);
        assert_eq!(defined["AdverbSynset"], 0);
        assert_eq!(defined[TOTAL], 2);

        let polysemy = stats.polysemy().unwrap();
        assert_eq!(polysemy["NounSynset"], Polysemy { monosemous: 0, polysemous: 1 });
        assert_eq!(polysemy["VerbSynset"], Polysemy { monosemous: 1, polysemous: 0 });
        assert_eq!(polysemy[TOTAL], Polysemy { monosemous: 1, polysemous: 1 });
    }

    #[test]
    fn multi_word_expressions_per_pos() {
        let graph = sample();
        let mwe = Statistics::new(&graph).multi_word_expressions().unwrap();
        assert_eq!(mwe["n"], 1);
        assert_eq!(mwe["v"], 0);
        assert_eq!(mwe[TOTAL], 1);
    }
}
