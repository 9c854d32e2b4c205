//! JSON Translator CLI - translate prompts into JSON objects of a schema type.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use json_translator_core::{AppConfig, TranslatorCache, TranslatorPatch};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Model used when neither the flags, the environment nor the config name one
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Translator id used when none is given
const DEFAULT_TRANSLATOR_ID: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "json-translate")]
#[command(author, version, about = "Translate free text into schema-validated JSON", long_about = None)]
struct Args {
    /// Prompts to translate (default: one per line from stdin)
    prompts: Vec<String>,

    /// TypeScript schema file declaring the target type
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Exported type to produce
    #[arg(short = 'T', long)]
    type_name: Option<String>,

    /// Translator registered in the config file
    #[arg(short, long)]
    translator: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(short, long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Don't ask the model to repair invalid responses
    #[arg(long)]
    no_repair: bool,

    /// Print service status and exit
    #[arg(long)]
    status: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Build the translator patch: config definition first, flags on top.
    fn patch(&self, config: &AppConfig) -> Result<TranslatorPatch> {
        let mut patch = match &self.translator {
            Some(id) => config
                .translators
                .get(id)
                .with_context(|| format!("No translator '{id}' in config"))?
                .to_patch(config.base_dir.as_deref())?,
            None => TranslatorPatch::default(),
        };

        if let Some(path) = &self.schema {
            patch.schema = Some(json_translator_core::util::read_schema(path)?);
        }
        if let Some(type_name) = &self.type_name {
            patch.type_name = Some(type_name.clone());
        }
        if let Some(model) = &self.model {
            patch.model = Some(model.clone());
        }
        if patch.model.is_none() {
            patch.model = Some(DEFAULT_MODEL.to_string());
        }

        Ok(patch)
    }
}

fn read_stdin_prompts() -> Result<Vec<String>> {
    let mut prompts = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            prompts.push(line.to_string());
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(api_base) = &args.api_base {
        config.model.api_base.clone_from(api_base);
    }
    if args.api_key.is_some() {
        config.api_key.clone_from(&args.api_key);
    }
    if args.no_repair {
        config.translator.attempt_repair = false;
    }

    let cache = TranslatorCache::from_config(&config);

    if args.status {
        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        {
            println!("{}", cache.status());
        }
        return Ok(());
    }

    let id = args.translator.as_deref().unwrap_or(DEFAULT_TRANSLATOR_ID);
    let patch = args.patch(&config)?;
    cache
        .configure(id, patch)
        .await
        .context("Failed to configure translator")?;

    let prompts = if args.prompts.is_empty() {
        read_stdin_prompts()?
    } else {
        args.prompts.clone()
    };

    if prompts.is_empty() {
        anyhow::bail!("No prompts to translate");
    }

    info!("Translating {} prompts with '{}'", prompts.len(), id);

    // Setup progress bar
    #[allow(clippy::cast_possible_truncation)]
    let pb = if prompts.len() > 1 {
        ProgressBar::new(prompts.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    for (i, prompt) in prompts.iter().enumerate() {
        let value = cache
            .translate(id, prompt)
            .await
            .with_context(|| format!("Failed to translate prompt {}", i + 1))?;

        let rendered = serde_json::to_string_pretty(&value)?;

        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        pb.suspend(|| println!("{rendered}"));

        pb.inc(1);
    }

    pb.finish_and_clear();

    Ok(())
}
