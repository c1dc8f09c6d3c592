//! ownpt CLI: reconcile an RDF wordnet with its document store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use ownpt::compare::{Compare, unify_actions};
use ownpt::config::Config;
use ownpt::document::{DumpSynset, Suggestion, Vote, read_jsonl};
use ownpt::graph::WordnetGraph;
use ownpt::node::NodeFactory;
use ownpt::repair::Repair;
use ownpt::stats::Statistics;
use ownpt::update::{AdmissionPolicy, Update};

#[derive(Parser)]
#[command(name = "ownpt", version, about = "Wordnet reconciliation pipeline")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Language profile of the graph (pt or en).
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a document dump with the graph and print the report as JSON.
    Compare {
        /// Graph files (.nt, .ttl, .rdf, .xml, .owl, .n3).
        #[arg(required = true)]
        graphs: Vec<PathBuf>,

        /// JSON-lines dump of synset documents.
        #[arg(long, required = true)]
        dump: Vec<PathBuf>,

        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply dump differences and voted suggestions, repair, and serialize.
    Update {
        #[arg(required = true)]
        graphs: Vec<PathBuf>,

        /// JSON-lines dump of synset documents.
        #[arg(long)]
        dump: Vec<PathBuf>,

        /// JSON-lines suggestions.
        #[arg(long)]
        suggestions: Vec<PathBuf>,

        /// JSON-lines votes.
        #[arg(long)]
        votes: Vec<PathBuf>,

        /// Senior users, added to those in the configuration.
        #[arg(short = 'u', long = "users", num_args = 1..)]
        users: Vec<String>,

        #[arg(long)]
        senior_threshold: Option<i64>,

        #[arg(long)]
        junior_threshold: Option<i64>,

        /// Renumber senses to contiguous ordinals after repair.
        #[arg(long)]
        renumber_senses: bool,

        /// Output graph file; the extension picks the format.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the structural repair rules and serialize.
    Repair {
        #[arg(required = true)]
        graphs: Vec<PathBuf>,

        /// Renumber senses to contiguous ordinals after repair.
        #[arg(long)]
        renumber_senses: bool,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print graph statistics as JSON.
    Stats {
        #[arg(required = true)]
        graphs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(lang) = cli.lang {
        config.lang = lang;
    }
    let profile = config.profile()?;

    match cli.command {
        Commands::Compare {
            graphs,
            dump,
            output,
        } => {
            let graph = load_graphs(&graphs)?;
            let factory = NodeFactory::new(&graph, &profile, config.word_identity);
            let documents = read_documents(&dump)?;

            let report = Compare::new(factory)
                .with_pointers(config.pointer_predicates()?)
                .compare(&documents)?;
            tracing::info!(synsets = report.synsets.len(), equal = report.is_equal(), "compared dump");

            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            match output {
                Some(path) => std::fs::write(&path, json).into_diagnostic()?,
                None => println!("{json}"),
            }
        }

        Commands::Update {
            graphs,
            dump,
            suggestions,
            votes,
            users,
            senior_threshold,
            junior_threshold,
            renumber_senses,
            output,
        } => {
            config.senior_users.extend(users);
            if let Some(threshold) = senior_threshold {
                config.senior_threshold = threshold;
            }
            if let Some(threshold) = junior_threshold {
                config.junior_threshold = threshold;
            }

            let graph = load_graphs(&graphs)?;
            let factory = NodeFactory::new(&graph, &profile, config.word_identity);
            let update = Update::new(factory);
            let mut summary = serde_json::Map::new();

            if !dump.is_empty() {
                let documents = read_documents(&dump)?;
                let report = Compare::new(factory)
                    .with_pointers(config.pointer_predicates()?)
                    .compare(&documents)?;
                let actions = unify_actions(&report);
                tracing::info!(synsets = actions.len(), "unified compare actions");
                let applied = update.update_from_compare(&actions)?;
                summary.insert("compare".into(), serde_json::to_value(applied).into_diagnostic()?);
            }

            if !suggestions.is_empty() {
                let mut pending: Vec<Suggestion> = Vec::new();
                for path in &suggestions {
                    pending.extend(read_jsonl::<Suggestion>(path)?);
                }
                let mut ballots: Vec<Vote> = Vec::new();
                for path in &votes {
                    ballots.extend(read_jsonl::<Vote>(path)?);
                }
                let policy = AdmissionPolicy::from(&config);
                let applied = update.update(&pending, &ballots, &policy)?;
                summary.insert("suggestions".into(), serde_json::to_value(applied).into_diagnostic()?);
            }

            let repaired = repair(factory, renumber_senses || config.renumber_senses)?;
            summary.insert("repair".into(), repaired);

            graph.dump(&output)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).into_diagnostic()?
            );
        }

        Commands::Repair {
            graphs,
            renumber_senses,
            output,
        } => {
            let graph = load_graphs(&graphs)?;
            let factory = NodeFactory::new(&graph, &profile, config.word_identity);
            let report = repair(factory, renumber_senses || config.renumber_senses)?;

            graph.dump(&output)?;
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }

        Commands::Stats { graphs } => {
            let graph = load_graphs(&graphs)?;
            let report = Statistics::new(&graph).report()?;
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
    }

    Ok(())
}

fn load_graphs(paths: &[PathBuf]) -> Result<WordnetGraph> {
    let graph = WordnetGraph::new()?;
    for path in paths {
        graph.load(path)?;
    }
    Ok(graph)
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<DumpSynset>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.extend(read_jsonl::<DumpSynset>(path)?);
    }
    tracing::info!(documents = documents.len(), "read dump");
    Ok(documents)
}

/// Full repair, optionally followed by sense renumbering.
fn repair(factory: NodeFactory<'_>, renumber: bool) -> Result<serde_json::Value> {
    let engine = Repair::new(factory);
    let report = engine.repair()?;
    let mut value = serde_json::to_value(&report).into_diagnostic()?;
    if renumber {
        let renumbered = engine.sort_senses_instances()?;
        value["renumbered"] = serde_json::Value::from(renumbered);
    }
    Ok(value)
}

