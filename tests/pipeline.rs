//! End-to-end tests for the reconciliation pipeline.
//!
//! These tests drive Compare, Update and Repair through the public API over
//! small in-memory graphs, and check that a repaired graph survives a
//! serialize/load round trip.

use oxigraph::io::RdfFormat;
use oxigraph::model::{Literal, NamedNode};

use ownpt::compare::{Compare, unify_actions};
use ownpt::config::{LangProfile, WordIdentity};
use ownpt::document::{Attribute, DumpSynset, Suggestion, Vote, parse_jsonl};
use ownpt::graph::WordnetGraph;
use ownpt::node::NodeFactory;
use ownpt::repair::{Repair, RepairRule};
use ownpt::update::{AdmissionPolicy, Update};
use ownpt::vocab;

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

fn entidade() -> WordnetGraph {
    graph(
        r#"
        inst:synset-00001740-n a wn30:NounSynset ;
            wn30:containsWordSense inst:wordsense-00001740-n-1 .
        inst:wordsense-00001740-n-1 a wn30:WordSense ;
            rdfs:label "entidade"@pt ;
            wn30:word inst:word-entidade ;
            wn30:wordNumber "1" .
        inst:word-entidade a wn30:Word ; wn30:lexicalForm "entidade"@pt .
        "#,
    )
}

#[test]
fn dump_words_flow_into_graph() {
    let graph = entidade();
    let profile = LangProfile::portuguese();
    let factory = NodeFactory::new(&graph, &profile, WordIdentity::Flat);
    let dump: Vec<DumpSynset> = parse_jsonl(
        r#"{"doc_id": "00001740-n", "word_pt": ["entidade", "coisa"]}"#,
        "dump",
    )
    .unwrap();

    let report = Compare::new(factory).compare(&dump).unwrap();
    let words = &report.synsets["00001740-n"].attributes[&Attribute::Word];
    assert_eq!(words.only_dump, vec!["coisa".to_string()]);
    assert_eq!(words.both, vec!["entidade".to_string()]);
    assert!(words.only_graph.is_empty());

    let actions = unify_actions(&report);
    let applied = Update::new(factory).update_from_compare(&actions).unwrap();
    assert_eq!(applied.applied, 1);

    let sense = inst("wordsense-00001740-n-2");
    assert!(graph
        .contains(&inst("synset-00001740-n"), vocab::CONTAINS_WORD_SENSE, &sense)
        .unwrap());
    assert!(graph.contains(&sense, vocab::WORD, &inst("word-coisa")).unwrap());
    assert_eq!(
        graph.literal_value(&sense, vocab::WORD_NUMBER).unwrap().unwrap().value(),
        "2"
    );

    let again = Compare::new(factory).compare(&dump).unwrap();
    assert!(again.is_equal());
    assert!(unify_actions(&again).is_empty());
}

#[test]
fn voted_removal_of_missing_word_is_a_no_op() {
    let graph = entidade();
    let profile = LangProfile::portuguese();
    let factory = NodeFactory::new(&graph, &profile, WordIdentity::Flat);
    let triples = graph.len().unwrap();

    let suggestions: Vec<Suggestion> = parse_jsonl(
        r#"{"id": "s1", "doc_id": "00001740-n", "action": "remove-word-pt", "params": "bobagem", "user": "ana", "status": "new", "date": 1}"#,
        "suggestions",
    )
    .unwrap();
    let votes: Vec<Vote> = parse_jsonl(
        "{\"suggestion_id\": \"s1\", \"value\": 2}\n{\"suggestion_id\": \"s1\", \"value\": 1}\n",
        "votes",
    )
    .unwrap();

    let report = Update::new(factory)
        .update(&suggestions, &votes, &AdmissionPolicy::default())
        .unwrap();
    assert_eq!(report.admitted, 1);
    assert_eq!(report.not_present, 1);
    assert_eq!(report.triples_added + report.triples_removed, 0);
    assert_eq!(graph.len().unwrap(), triples);
}

#[test]
fn seniority_lowers_the_vote_threshold() {
    let graph = entidade();
    let profile = LangProfile::portuguese();
    let factory = NodeFactory::new(&graph, &profile, WordIdentity::Flat);

    let suggestions: Vec<Suggestion> = parse_jsonl(
        concat!(
            r#"{"id": 1, "doc_id": "00001740-n", "action": "add-gloss-pt", "params": "algo que existe", "user": "senior", "status": "new", "date": 10}"#,
            "\n",
            r#"{"id": 2, "doc_id": "00001740-n", "action": "add-example-pt", "params": "uma entidade", "user": "junior", "status": "new", "date": 11}"#,
            "\n",
            r#"{"id": 3, "doc_id": "00001740-n", "action": "add-word-pt", "params": "ente", "user": "junior", "status": "new", "date": 12}"#,
        ),
        "suggestions",
    )
    .unwrap();
    let votes: Vec<Vote> = parse_jsonl(
        concat!(
            r#"{"suggestion_id": 1, "value": 1}"#,
            "\n",
            r#"{"suggestion_id": 2, "value": 1}"#,
            "\n",
            r#"{"suggestion_id": 3, "value": 2}"#,
            "\n",
            r#"{"suggestion_id": 99, "value": 5}"#,
        ),
        "votes",
    )
    .unwrap();

    let policy = AdmissionPolicy {
        senior_users: ["senior".to_string()].into_iter().collect(),
        ..AdmissionPolicy::default()
    };
    let report = Update::new(factory).update(&suggestions, &votes, &policy).unwrap();
    assert_eq!(report.admitted, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.orphan_votes, 1);
    assert_eq!(report.applied, 2);

    let synset = inst("synset-00001740-n");
    let gloss = Literal::new_language_tagged_literal("algo que existe", "pt").unwrap();
    assert!(graph.contains(&synset, vocab::GLOSS, &gloss).unwrap());
    assert!(graph.objects(&synset, vocab::EXAMPLE).unwrap().is_empty());
    assert!(factory.get_sense(synset.as_ref().into(), "ente").unwrap().is_some());
}

fn messy() -> WordnetGraph {
    graph(
        r#"
        inst:synset-00001740-n a wn30:NounSynset ;
            wn30:containsWordSense inst:wordsense-00001740-n-1, _:sense ;
            wn30:gloss " algo  que existe "@pt .
        inst:wordsense-00001740-n-1 rdfs:label "ente"@pt ; wn30:word _:word .
        _:word wn30:lexicalForm "ente"@pt .
        _:sense rdfs:label "entidade"@pt .
        inst:word-orfao a wn30:Word ; wn30:lexicalForm "órfão"@pt .
        inst:synset-00002137-n a wn30:NounSynset ;
            wn30:containsWordSense inst:wordsense-00002137-n-1 .
        inst:wordsense-00002137-n-1 rdfs:label "coisa"@pt ;
            wn30:word inst:word-coisa, inst:word-coisa-dup .
        inst:word-coisa wn30:lexicalForm "coisa"@pt .
        inst:word-coisa-dup wn30:lexicalForm "coisa" .
        "#,
    )
}

#[test]
fn repair_reaches_a_fixed_point() {
    let graph = messy();
    let profile = LangProfile::portuguese();
    let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

    let first = repair.repair().unwrap();
    assert!(!first.is_clean());
    assert_eq!(first.outcome(RepairRule::ResolveBlankWords).unwrap().cases, 1);
    assert_eq!(first.outcome(RepairRule::ResolveBlankSenses).unwrap().cases, 1);
    assert_eq!(first.outcome(RepairRule::RemoveDisconnectedWords).unwrap().cases, 1);

    let second = repair.repair().unwrap();
    assert!(second.is_clean(), "{second:?}");

    let ente = inst("wordsense-00001740-n-1");
    let entidade = inst("wordsense-00001740-n-2");
    assert!(graph.contains(&ente, vocab::WORD, &inst("word-ente")).unwrap());
    assert!(graph.contains(&entidade, vocab::WORD, &inst("word-entidade")).unwrap());
    assert!(graph
        .contains(&inst("word-entidade"), vocab::HAS_TYPE, vocab::TYPE_WORD)
        .unwrap());
    assert!(!graph.has_node(inst("word-orfao").as_ref().into()).unwrap());
    assert!(graph
        .contains(
            &inst("synset-00001740-n"),
            vocab::GLOSS,
            &Literal::new_language_tagged_literal("algo que existe", "pt").unwrap()
        )
        .unwrap());
}

#[test]
fn word_merge_preserves_edges() {
    let graph = messy();
    let profile = LangProfile::portuguese();
    let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));
    repair.repair().unwrap();

    let coisa = inst("word-coisa");
    assert!(!graph.has_node(inst("word-coisa-dup").as_ref().into()).unwrap());
    assert_eq!(
        graph.subjects(vocab::WORD, &coisa).unwrap(),
        vec![oxigraph::model::NamedOrBlankNode::NamedNode(inst("wordsense-00002137-n-1"))]
    );
    assert_eq!(
        graph
            .objects(&inst("synset-00002137-n"), vocab::CONTAINS_WORD_SENSE)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn repaired_graph_survives_round_trip() {
    let graph = messy();
    let profile = LangProfile::portuguese();
    let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));
    repair.repair().unwrap();
    repair.sort_senses_instances().unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("own-pt.nt");
    graph.dump(&path).unwrap();

    let reloaded = WordnetGraph::new().unwrap();
    let count = reloaded.load(&path).unwrap();
    assert_eq!(count, graph.len().unwrap());
    assert_eq!(reloaded.len().unwrap(), graph.len().unwrap());

    let again = Repair::new(NodeFactory::new(&reloaded, &profile, WordIdentity::Flat))
        .repair()
        .unwrap();
    assert!(again.is_clean());
}

#[test]
fn whitespace_lexical_form_is_repaired_in_one_pass() {
    let graph = graph(
        r#"
        inst:synset-00001740-n a wn30:NounSynset ;
            wn30:containsWordSense inst:wordsense-00001740-n-1 .
        inst:wordsense-00001740-n-1 a wn30:WordSense ;
            rdfs:label "ente"@pt ;
            wn30:wordNumber "1" ;
            wn30:word inst:word-x .
        inst:word-x a wn30:Word ; wn30:lexicalForm "   "@pt .
        "#,
    );
    let profile = LangProfile::portuguese();
    let repair = Repair::new(NodeFactory::new(&graph, &profile, WordIdentity::Flat));

    let first = repair.repair().unwrap();
    assert_eq!(first.outcome(RepairRule::RemoveVoidWords).unwrap().cases, 1);
    let sense = inst("wordsense-00001740-n-1");
    assert!(graph.contains(&sense, vocab::WORD, &inst("word-ente")).unwrap());
    assert!(!graph.has_node(inst("word-x").as_ref().into()).unwrap());

    let before = graph.mutations();
    let second = repair.repair().unwrap();
    assert!(second.is_clean(), "{second:?}");
    assert_eq!(graph.mutations().since(before), Default::default());
}

#[test]
fn blank_dump_values_converge() {
    let graph = entidade();
    let profile = LangProfile::portuguese();
    let factory = NodeFactory::new(&graph, &profile, WordIdentity::Flat);
    let dump: Vec<DumpSynset> = parse_jsonl(
        r#"{"doc_id": "00001740-n", "word_pt": ["entidade", "  "], "gloss_pt": [" "]}"#,
        "dump",
    )
    .unwrap();

    let report = Compare::new(factory).compare(&dump).unwrap();
    assert!(report.is_equal(), "{report:?}");
    assert!(unify_actions(&report).is_empty());

    let triples = graph.len().unwrap();
    Repair::new(factory).repair().unwrap();
    assert_eq!(graph.len().unwrap(), triples);
    assert!(Compare::new(factory).compare(&dump).unwrap().is_equal());
}
