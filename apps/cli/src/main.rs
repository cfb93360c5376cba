mod output;
mod progress;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use output::{OutputFormat, Renderer};
use progress::{finish_spinner, spinner};
use redraft_analyzers::{AiClientConfig, DocumentMeta, TierFlags};
use redraft_engine::{
    bootstrap, AnalyzeRequest, DocNode, Document, EngineSettings, SuggestionEngine,
};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "redraft",
    version,
    about = "Analyze rich-text documents and surface writing suggestions from the shell."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "markdown")]
    format: OutputFormat,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators while slow analyzers settle.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Analyze a document and print the merged suggestion list.
    Check {
        /// Path to the document JSON (a node tree or a `{root, selection}` object).
        file: PathBuf,
        /// Document title for the SEO checks.
        #[arg(long)]
        title: Option<String>,
        /// Target keyword for the SEO checks.
        #[arg(long)]
        keyword: Option<String>,
        /// Meta description for the SEO checks.
        #[arg(long)]
        description: Option<String>,
        /// User id for AI quota accounting; enables the AI tiers when an
        /// endpoint is configured.
        #[arg(long)]
        user: Option<String>,
        /// Run only the fast tier (the per-keystroke path).
        #[arg(long)]
        fast_only: bool,
    },
    /// Apply a suggestion's primary fix and print the edited document.
    Apply {
        /// Path to the document JSON.
        file: PathBuf,
        /// Suggestion id as printed by `check`.
        #[arg(long)]
        id: String,
        /// Write the edited document back to the file instead of stdout.
        #[arg(long)]
        write: bool,
    },
    /// Inspect result-cache statistics for this process.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand, Clone)]
enum CacheCommand {
    /// Report hit/miss counters and entry count.
    Stats,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

/// Settings layered from `redraft.toml` and `REDRAFT_*` environment
/// variables; everything is optional and falls back to engine defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CliSettings {
    ai_endpoint: Option<String>,
    ai_daily_limit: Option<u32>,
    ai_confidence_threshold: Option<f64>,
    cache_capacity: Option<usize>,
}

impl CliSettings {
    fn load() -> Self {
        let built = config::Config::builder()
            .add_source(config::File::with_name("redraft").required(false))
            .add_source(config::Environment::with_prefix("REDRAFT"))
            .build();
        match built {
            Ok(source) => source.try_deserialize().unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    fn into_engine_settings(self) -> EngineSettings {
        let defaults = EngineSettings::default();
        EngineSettings {
            cache_capacity: self.cache_capacity.unwrap_or(defaults.cache_capacity),
            ai_confidence_threshold: self
                .ai_confidence_threshold
                .unwrap_or(defaults.ai_confidence_threshold),
            ai_daily_limit: self.ai_daily_limit.unwrap_or(defaults.ai_daily_limit),
            ai: AiClientConfig {
                endpoint: self.ai_endpoint,
                ..AiClientConfig::default()
            },
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let settings = CliSettings::load().into_engine_settings();
    let ai_configured = settings.ai.endpoint.is_some();
    let engine = SuggestionEngine::new(bootstrap(settings));
    let renderer = Renderer::new(cli.format);

    match &cli.command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "redraft", &mut std::io::stdout());
            Ok(())
        }
        Command::Check {
            file,
            title,
            keyword,
            description,
            user,
            fast_only,
        } => {
            handle_check(
                &cli,
                &renderer,
                &engine,
                CheckArgs {
                    file: file.clone(),
                    title: title.clone(),
                    keyword: keyword.clone(),
                    description: description.clone(),
                    user: user.clone(),
                    fast_only: *fast_only,
                    ai_configured,
                },
            )
            .await
        }
        Command::Apply { file, id, write } => {
            handle_apply(&cli, &renderer, &engine, file, id, *write).await
        }
        Command::Cache { command } => match command {
            CacheCommand::Stats => {
                if !cli.quiet {
                    renderer.cache_stats(&engine.context().cache_stats())?;
                }
                Ok(())
            }
        },
    }
}

struct CheckArgs {
    file: PathBuf,
    title: Option<String>,
    keyword: Option<String>,
    description: Option<String>,
    user: Option<String>,
    fast_only: bool,
    ai_configured: bool,
}

async fn handle_check(
    cli: &Cli,
    renderer: &Renderer,
    engine: &SuggestionEngine,
    args: CheckArgs,
) -> Result<()> {
    let document = load_document(&args.file)?;
    let words = document.word_count();
    let meta = DocumentMeta {
        title: args.title,
        target_keyword: args.keyword,
        meta_description: args.description,
    };
    let run_seo = meta.target_keyword.is_some() || meta.title.is_some();

    let mut request = AnalyzeRequest::new(document);
    request.tiers = if args.fast_only {
        TierFlags {
            enable_fast: true,
            enable_deep: false,
            enable_seo: false,
            enable_ai: false,
        }
    } else {
        TierFlags {
            enable_fast: true,
            enable_deep: true,
            enable_seo: run_seo,
            enable_ai: args.ai_configured && args.user.is_some(),
        }
    };
    request.meta = meta;
    request.user_id = args.user;

    let progress = spinner(cli.progress_enabled(), "Analyzing document...");
    let cycle = engine
        .analyze(request)
        .await
        .context("analysis request rejected")?;
    let suggestions = cycle.settled().await;
    finish_spinner(progress, Some(format!("{} suggestion(s)", suggestions.len())));

    info!(
        target: "redraft_cli",
        file = %args.file.display(),
        words,
        suggestions = suggestions.len(),
        "check completed"
    );

    if !cli.quiet {
        renderer.suggestions(&suggestions)?;
    }
    Ok(())
}

async fn handle_apply(
    cli: &Cli,
    renderer: &Renderer,
    engine: &SuggestionEngine,
    file: &PathBuf,
    id: &str,
    write: bool,
) -> Result<()> {
    let mut document = load_document(file)?;

    let mut request = AnalyzeRequest::new(document.clone());
    request.tiers = TierFlags {
        enable_fast: true,
        enable_deep: true,
        enable_seo: false,
        enable_ai: false,
    };
    let progress = spinner(cli.progress_enabled(), "Re-analyzing before applying...");
    let suggestions = engine
        .analyze(request)
        .await
        .context("analysis request rejected")?
        .settled()
        .await;
    finish_spinner(progress, None);

    let suggestion = suggestions
        .iter()
        .find(|s| s.id == id)
        .with_context(|| format!("no suggestion with id `{id}` in the current analysis"))?;

    let applied = redraft_engine::apply(&mut document, suggestion)
        .with_context(|| format!("could not apply `{id}`"))?;

    let document_json = serde_json::to_string_pretty(&document)?;
    if write {
        fs::write(file, &document_json)
            .with_context(|| format!("failed to write {}", file.display()))?;
    }
    if !cli.quiet {
        renderer.applied_fix(&applied, &document_json)?;
    }
    Ok(())
}

/// Accept either a bare node tree or a full `{root, selection}` document.
fn load_document(path: &PathBuf) -> Result<Document> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Ok(document) = serde_json::from_str::<Document>(&raw) {
        return Ok(document);
    }
    let root: DocNode = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a document tree", path.display()))?;
    Ok(Document::new(root))
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,redraft_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing: {error}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_document_accepts_bare_node_tree() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"type":"doc","content":[{{"type":"paragraph","content":[{{"type":"text","text":"Teh cat."}}]}}]}}"#
        )
        .expect("write");

        let document = load_document(&file.path().to_path_buf()).expect("parses");
        assert_eq!(document.plain_text(), "Teh cat.");
    }

    #[test]
    fn load_document_accepts_wrapped_document() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"root":{{"type":"doc","content":[{{"type":"paragraph","content":[{{"type":"text","text":"Hi."}}]}}]}},"selection":{{"start":0,"end":1}},"version":3}}"#
        )
        .expect("write");

        let document = load_document(&file.path().to_path_buf()).expect("parses");
        assert_eq!(document.version, 3);
        assert_eq!(document.selection, Some(0..1));
    }

    #[test]
    fn cli_settings_fall_back_to_engine_defaults() {
        let settings = CliSettings::default().into_engine_settings();
        assert_eq!(settings.cache_capacity, 512);
        assert!(settings.ai.endpoint.is_none());
    }
}
