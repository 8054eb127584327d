//! `rulewright` command line.
//!
//! Stdout carries JSON only; logs go to stderr. A prompt the catalog cannot
//! cover exits with status 2, any other failure with 1.

mod batch;
mod logging;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rulewright_core::{extract_phrases, FieldCatalog, PolicyCorpus};
use rulewright_runtime::{RuleError, RuleOrchestrator, RuntimeConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const EXIT_REJECTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "rulewright",
    about = "Turn natural-language credit policy into JSON Logic rules",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Field catalog file (YAML or JSON) instead of the built-in credit catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory of .txt/.md policy documents replacing the built-in corpus
    #[arg(long, global = true)]
    policy_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Minimum similarity for a field to become a candidate
    #[arg(long, global = true)]
    relaxed_threshold: Option<f32>,

    /// Best similarity below which a prompt is rejected
    #[arg(long, global = true)]
    strict_threshold: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a JSON Logic rule from a policy statement
    Generate(GenerateArgs),
    /// Show how a prompt maps onto catalog fields without generating a rule
    Map(MapArgs),
    /// Print the phrases extracted from a prompt
    Phrases {
        prompt: String,
    },
    /// Inspect the field catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Run one request per line of a JSONL file
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Policy statement, e.g. "bureau score below 600 and FOIR above 0.6"
    prompt: String,

    /// Extra policy document file for this request (repeatable)
    #[arg(long = "context-doc", value_name = "FILE")]
    context_docs: Vec<PathBuf>,

    /// Extra policy text for this request (repeatable)
    #[arg(long = "context", value_name = "TEXT")]
    context: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct MapArgs {
    prompt: String,

    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print the catalog as JSON
    Show,
    /// Load and validate the catalog, then print a summary
    Validate,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// JSONL file, one {"prompt": ..., "context_docs": [...]} object per line
    file: PathBuf,

    /// Maximum requests in flight
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = logging::init(cli.global.log_level.as_deref()) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Cli { global, command } = cli;

    match command {
        Command::Phrases { prompt } => {
            print_json(&extract_phrases(&prompt), false)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Catalog { command } => run_catalog(command, &global),
        Command::Map(args) => {
            let orchestrator = build_orchestrator(&global).await?;
            let mapped = orchestrator.map(&args.prompt).await?;
            print_json(&mapped.report(orchestrator.thresholds()), args.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => run_generate(args, &global).await,
        Command::Batch(args) => run_batch(args, &global).await,
    }
}

fn run_catalog(command: CatalogCommand, global: &GlobalArgs) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(global)?;
    match command {
        CatalogCommand::Show => print_json(&catalog, true)?,
        CatalogCommand::Validate => {
            println!(
                "{} (version {}): {} fields OK",
                catalog.name,
                catalog.catalog_version,
                catalog.len()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_generate(args: GenerateArgs, global: &GlobalArgs) -> anyhow::Result<ExitCode> {
    let mut docs = Vec::with_capacity(args.context_docs.len() + args.context.len());
    for path in &args.context_docs {
        let doc = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context document {}", path.display()))?;
        docs.push(doc);
    }
    docs.extend(args.context);

    let orchestrator = build_orchestrator(global).await?;

    match orchestrator.generate_rule(&args.prompt, &docs).await {
        Ok(response) => {
            print_json(&response, args.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(RuleError::Mapping(rejection)) => {
            print_json(&rejection, args.pretty)?;
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_batch(args: BatchArgs, global: &GlobalArgs) -> anyhow::Result<ExitCode> {
    anyhow::ensure!(args.concurrency > 0, "--concurrency must be at least 1");

    let input = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read batch file {}", args.file.display()))?;
    let lines = batch::parse_lines(&input);
    tracing::info!(requests = lines.len(), concurrency = args.concurrency, "starting batch");

    let orchestrator = build_orchestrator(global).await?;
    let outputs = batch::run(&orchestrator, lines, args.concurrency).await;

    for output in &outputs {
        print_json(&output.value, false)?;
    }

    Ok(ExitCode::from(batch::exit_status(&outputs)))
}

fn runtime_config(global: &GlobalArgs) -> anyhow::Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env()?;
    if let Some(relaxed) = global.relaxed_threshold {
        config.thresholds.relaxed = relaxed;
    }
    if let Some(strict) = global.strict_threshold {
        config.thresholds.strict = strict;
    }
    config.validate()?;
    Ok(config)
}

fn load_catalog(global: &GlobalArgs) -> anyhow::Result<FieldCatalog> {
    let catalog = match &global.catalog {
        Some(path) => FieldCatalog::from_file(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => FieldCatalog::builtin()?,
    };
    Ok(catalog)
}

fn load_corpus(global: &GlobalArgs) -> anyhow::Result<PolicyCorpus> {
    let Some(dir) = &global.policy_dir else {
        return Ok(PolicyCorpus::builtin());
    };
    let corpus = PolicyCorpus::from_dir(dir)?;
    if corpus.is_empty() {
        tracing::warn!(dir = %dir.display(), "policy directory has no documents");
    }
    Ok(corpus)
}

async fn build_orchestrator(global: &GlobalArgs) -> anyhow::Result<RuleOrchestrator> {
    let config = runtime_config(global)?;
    let catalog = load_catalog(global)?;
    let corpus = load_corpus(global)?;
    let provider = Arc::new(config.openrouter_provider()?);

    tracing::info!(
        catalog = %catalog.name,
        fields = catalog.len(),
        policies = corpus.len(),
        model = %config.model,
        embedding_model = %config.embedding_model,
        "preparing rule context"
    );

    let orchestrator = RuleOrchestrator::builder()
        .llm_provider(provider.clone())
        .embedding_provider(provider)
        .catalog(catalog)
        .corpus(corpus)
        .config(&config)
        .build()
        .await?;
    Ok(orchestrator)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_with_context() {
        let cli = Cli::try_parse_from([
            "rulewright",
            "generate",
            "bureau score below 600",
            "--context-doc",
            "policy.txt",
            "--context",
            "FOIR caps at 0.6",
            "--context",
            "No DPD in 12 months",
            "--strict-threshold",
            "0.2",
        ])
        .unwrap();

        assert_eq!(cli.global.strict_threshold, Some(0.2));
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.prompt, "bureau score below 600");
                assert_eq!(args.context_docs, vec![PathBuf::from("policy.txt")]);
                assert_eq!(args.context.len(), 2);
                assert!(!args.pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rulewright",
            "catalog",
            "validate",
            "--catalog",
            "fields.yaml",
        ])
        .unwrap();

        assert_eq!(cli.global.catalog, Some(PathBuf::from("fields.yaml")));
        assert!(matches!(
            cli.command,
            Command::Catalog {
                command: CatalogCommand::Validate
            }
        ));
    }

    #[test]
    fn test_batch_default_concurrency() {
        let cli = Cli::try_parse_from(["rulewright", "batch", "requests.jsonl"]).unwrap();
        match cli.command {
            Command::Batch(args) => assert_eq!(args.concurrency, 4),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_builtin_catalog_loads_without_flags() {
        let catalog = load_catalog(&GlobalArgs::default()).unwrap();
        assert!(catalog.contains("bureau_score"));
    }
}
