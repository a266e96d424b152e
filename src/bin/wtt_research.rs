//! CLI binary for WTT token research.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wtt::research::FixedClassifier;
use wtt::{
    ArtifactStore, ResearchArtifact, ResearchConfig, ResearchPipeline, ResearchRecord,
    ResearchWorkflow, SqliteArtifactStore, TokenRef,
};
use wtt_search::TavilyProvider;

/// wtt-research: research a token across the web into one bounded artifact.
#[derive(Parser)]
#[command(name = "wtt-research", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Research a token and print the artifact.
    Research {
        /// Token name, e.g. "ExampleCoin".
        subject: String,

        /// Treat the token as newsworthy (news facet queries the news index).
        #[arg(long)]
        news: bool,

        /// Print JSON instead of a readable report.
        #[arg(long)]
        json: bool,

        /// Token id recorded with a persisted run.
        #[arg(long, default_value_t = 0)]
        token_id: i64,

        /// Commit the result to the artifact store (with workflow retry).
        #[arg(long)]
        persist: bool,
    },

    /// Show stored research for a token, newest first.
    Show {
        token_name: String,

        /// Number of stored runs to show.
        #[arg(long, default_value_t = 1)]
        limit: usize,

        /// Print JSON instead of a readable report.
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wtt=info,wtt_search=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig { force } => init_config(cli.config, force),
        Command::Show {
            token_name,
            limit,
            json,
        } => {
            let config = load_config(cli.config.as_ref())?;
            show(&config, &token_name, limit, json)
        }
        Command::Research {
            subject,
            news,
            json,
            token_id,
            persist,
        } => {
            let config = load_config(cli.config.as_ref())?;
            research(config, subject, news, json, token_id, persist).await
        }
    }
}

/// Explicit path, else the default path if it exists, else defaults.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ResearchConfig> {
    if let Some(path) = path {
        return ResearchConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }
    let default_path = ResearchConfig::default_config_path();
    if default_path.exists() {
        return ResearchConfig::from_file(&default_path)
            .with_context(|| format!("loading config from {}", default_path.display()));
    }
    Ok(ResearchConfig::default())
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(ResearchConfig::default_config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    ResearchConfig::default().save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn research(
    config: ResearchConfig,
    subject: String,
    news: bool,
    json: bool,
    token_id: i64,
    persist: bool,
) -> anyhow::Result<()> {
    let provider = TavilyProvider::new(&config.search)?;
    info!(endpoint = provider.endpoint(), subject = %subject, "starting research");
    let pipeline = ResearchPipeline::new(provider, &config)?
        .with_classifier(Arc::new(FixedClassifier(news)));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling research");
                cancel.cancel();
            }
        });
    }

    if persist {
        let path = config.store.database_path();
        let store = SqliteArtifactStore::open(&path)
            .with_context(|| format!("opening artifact store at {}", path.display()))?;
        let workflow = ResearchWorkflow::new(pipeline, store, config.workflow.retry.clone());
        let record = workflow
            .run_with_cancel(&TokenRef::new(token_id, subject), &cancel)
            .await?;
        print_record(&record, json)?;
    } else {
        let artifact = pipeline.research_with_cancel(&subject, &cancel).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&artifact)?);
        } else {
            print_artifact(&artifact);
        }
    }
    Ok(())
}

fn show(config: &ResearchConfig, token_name: &str, limit: usize, json: bool) -> anyhow::Result<()> {
    let path = config.store.database_path();
    let store = SqliteArtifactStore::open(&path)
        .with_context(|| format!("opening artifact store at {}", path.display()))?;
    if limit <= 1 {
        return match store.latest(token_name)? {
            Some(record) => print_record(&record, json),
            None => anyhow::bail!("no stored research for {token_name}"),
        };
    }

    let records = store.history(token_name, limit)?;
    if records.is_empty() {
        anyhow::bail!("no stored research for {token_name}");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!("\n---\n");
        }
        print_record(record, false)?;
    }
    Ok(())
}

fn print_record(record: &ResearchRecord, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    println!(
        "Token #{} {} (stored {})",
        record.token_id,
        record.token_name,
        record.created_at.to_rfc3339()
    );
    if let Some(summary) = &record.summary {
        println!("\nSummary:\n{summary}\n");
    }
    print_artifact(&record.artifact);
    Ok(())
}

fn print_artifact(artifact: &ResearchArtifact) {
    let stats = artifact.query_stats();
    println!("Research: {} ({})", artifact.subject(), artifact.id());
    println!("Generated: {}", artifact.generated_at().to_rfc3339());
    println!(
        "Queries: {} planned, {} succeeded, {} failed",
        stats.planned, stats.succeeded, stats.failed
    );
    println!(
        "Sources: {} ({} duplicates discarded)",
        artifact.total_source_count(),
        artifact.duplicates_discarded()
    );
    for (i, doc) in artifact.documents().iter().enumerate() {
        println!("  {}. [{}] {} <{}>", i + 1, doc.origin, doc.title, doc.url);
    }
    println!(
        "Budget: {} tokens ({:?})",
        artifact.token_count(),
        artifact.budget_outcome()
    );
    if !artifact.budgeted_text().is_empty() {
        println!("\n{}", artifact.budgeted_text());
    }
}
