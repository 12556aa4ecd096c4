use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use seo_audit_core::{
    build_request, normalize_url, render_report, response_schema, validate, AnalysisReport,
    AnalyzerSettings, OutputFormat, RenderOptions, SeoAnalyzer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "seo-audit",
    author,
    version,
    about = "On-page SEO analyzer backed by a generative-language model"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON) with an `[llm]` section
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Provider to use (`gemini` or `openai`)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model identifier override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Custom provider base URL
    #[arg(long, value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// Give up on the provider after this long (e.g. `45s`, `2m`)
    #[arg(long, value_name = "DURATION", global = true, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a website and print the SEO dashboard
    Analyze {
        /// Website URL; `https://` is assumed when no scheme is given
        url: String,
        #[command(flatten)]
        display: DisplayArgs,
        /// Also write the validated report JSON to this file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Render a previously saved report without contacting the provider
    Render {
        /// Report JSON file
        file: PathBuf,
        /// URL to show in the heading
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Print the instruction that would be sent for a URL
    Prompt { url: String },
    /// Print the response schema sent to the provider
    Schema,
}

#[derive(Args, Debug, Clone, Copy)]
struct DisplayArgs {
    /// Emit JSON instead of the human-readable dashboard
    #[arg(long)]
    json: bool,
    /// Expand every category instead of only the first
    #[arg(long)]
    expand_all: bool,
}

impl DisplayArgs {
    fn options(self, url: Option<String>) -> RenderOptions {
        RenderOptions {
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
            url,
            expand_all: self.expand_all,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    llm: LlmSection,
}

#[derive(Debug, Default, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    match &cli.command {
        Commands::Analyze {
            url,
            display,
            output,
        } => {
            let settings = resolve_settings(&cli)?;
            analyze(&settings, url, *display, output.as_deref(), cli.timeout)
                .await
                .context("Analysis failed")?
        }
        Commands::Render { file, url, display } => {
            render_file(file, url.clone(), *display).await?
        }
        Commands::Prompt { url } => {
            let url = normalize_url(url)?;
            println!("{}", build_request(&url).instruction);
        }
        Commands::Schema => println!("{}", serde_json::to_string_pretty(&response_schema())?),
    }
    Ok(())
}

async fn analyze(
    settings: &AnalyzerSettings,
    input: &str,
    display: DisplayArgs,
    output: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<()> {
    let url = normalize_url(input)?;
    let mut analyzer = SeoAnalyzer::from_settings(settings)?;
    if let Some(timeout) = timeout {
        analyzer = analyzer.with_timeout(timeout);
    }
    info!(url = %url, provider = %settings.provider, "starting analysis");
    if std::io::stderr().is_terminal() {
        eprintln!("{}", progress_line(&url, settings));
    }
    let report = analyzer.analyze(&url).await?;

    if let Some(path) = output {
        write_report(path, &report).await?;
    }

    print!("{}", render_report(&report, &display.options(Some(url)))?);
    Ok(())
}

fn progress_line(url: &str, settings: &AnalyzerSettings) -> String {
    format!(
        "Analyzing {url} with {} ({})...",
        settings.provider,
        settings.model_id()
    )
}

async fn write_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write report to {}", path.display()))
}

async fn render_file(path: &Path, url: Option<String>, display: DisplayArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let report = validate(&value)
        .with_context(|| format!("{} is not a valid SEO report", path.display()))?;
    print!("{}", render_report(&report, &display.options(url))?);
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<AnalyzerSettings> {
    let file = cli.config.as_deref().map(load_file_config).transpose()?;
    merge_settings(cli, file, std::env::vars())
}

/// Merge settings with precedence flags > environment > config file > defaults.
fn merge_settings(
    cli: &Cli,
    file: Option<FileConfig>,
    env: impl IntoIterator<Item = (String, String)>,
) -> Result<AnalyzerSettings> {
    let mut vars = HashMap::new();

    if let Some(file) = file {
        let llm = file.llm;
        let pairs = [
            (AnalyzerSettings::PROVIDER_ENV, llm.provider),
            (AnalyzerSettings::API_KEY_ENV, llm.api_key),
            (AnalyzerSettings::ENDPOINT_ENV, llm.endpoint),
            (AnalyzerSettings::MODEL_ENV, llm.model),
            (
                AnalyzerSettings::TIMEOUT_ENV,
                llm.timeout_secs.map(|secs| secs.to_string()),
            ),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                vars.insert(name.to_string(), value);
            }
        }
    }

    for (name, value) in env {
        if name.starts_with("SEO_AUDIT_") && !value.trim().is_empty() {
            vars.insert(name, value);
        }
    }

    let flags = [
        (AnalyzerSettings::PROVIDER_ENV, cli.provider.clone()),
        (AnalyzerSettings::MODEL_ENV, cli.model.clone()),
        (AnalyzerSettings::ENDPOINT_ENV, cli.endpoint.clone()),
        (
            AnalyzerSettings::TIMEOUT_ENV,
            cli.timeout.map(|t| t.as_secs().max(1).to_string()),
        ),
    ];
    for (name, value) in flags {
        if let Some(value) = value {
            vars.insert(name.to_string(), value);
        }
    }

    AnalyzerSettings::from_map(vars)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to load config from {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("invalid config in {}", path.display()))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
