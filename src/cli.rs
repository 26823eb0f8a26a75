use crate::channels::{GroupChannel, TelegramChannel};
use crate::config::Config;
use crate::engine::Orchestrator;
use crate::providers::{CompletionProvider, OpenRouterProvider};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nonnobot")]
#[command(about = "Telegram group persona bot")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Telegram and join the group conversation
    Run {
        #[arg(long)]
        model: Option<String>,
    },
    /// Validate the environment configuration and show effective settings
    Check,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { model } => {
            run_command(model).await?;
        }
        Commands::Check => {
            check_command()?;
        }
    }

    Ok(())
}

async fn run_command(model: Option<String>) -> Result<()> {
    tracing::info!("nonnobot {} starting", crate::VERSION);
    let mut config = Config::from_env()?;
    if let Some(model) = model {
        config.llm.model = model;
    }
    tracing::info!("Configuration loaded. Using model: {}", config.llm.model);

    let provider: Arc<dyn CompletionProvider> = Arc::new(OpenRouterProvider::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.base_url.clone(),
    ));

    let (channel, messages) = TelegramChannel::connect(&config.telegram).await?;
    let channel: Arc<dyn GroupChannel> = Arc::new(channel);

    let mut orchestrator = Orchestrator::new(channel, provider, &config);

    // The greeting is best effort; a cold start has no history to greet over.
    if let Err(err) = orchestrator.announce().await {
        tracing::warn!("Startup greeting failed: {err:#}");
    }

    println!("nonnobot is running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
        result = orchestrator.run(messages) => {
            result?;
        }
    }

    Ok(())
}

#[derive(Debug)]
enum CheckResult {
    Pass(String),
    Warn(String),
    Fail(String),
}

impl CheckResult {
    fn label(&self) -> &'static str {
        match self {
            Self::Pass(_) => "PASS",
            Self::Warn(_) => "WARN",
            Self::Fail(_) => "FAIL",
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::Pass(s) | Self::Warn(s) | Self::Fail(s) => s,
        }
    }

    fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("  {:<6} {:<30} {}", result.label(), name, result.detail());
}

fn present<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_bot_token<F>(lookup: &F) -> CheckResult
where
    F: Fn(&str) -> Option<String>,
{
    match present(lookup, "TELEGRAM_BOT_TOKEN") {
        Some(_) => CheckResult::Pass("set".to_string()),
        None => CheckResult::Fail("TELEGRAM_BOT_TOKEN is not set".to_string()),
    }
}

fn check_group_id<F>(lookup: &F) -> CheckResult
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = present(lookup, "TELEGRAM_GROUP_ID") else {
        return CheckResult::Fail("TELEGRAM_GROUP_ID is not set".to_string());
    };
    match raw.parse::<i64>() {
        Ok(id) if id < 0 => CheckResult::Pass(id.to_string()),
        Ok(id) => CheckResult::Warn(format!(
            "{id} is positive; Telegram group ids are normally negative"
        )),
        Err(err) => CheckResult::Fail(format!("invalid value {raw:?}: {err}")),
    }
}

fn check_api_key<F>(lookup: &F) -> CheckResult
where
    F: Fn(&str) -> Option<String>,
{
    match present(lookup, "OPENROUTER_API_KEY") {
        Some(_) => CheckResult::Pass("set".to_string()),
        None => CheckResult::Warn("not set; the bot will stay silent until it is provided".to_string()),
    }
}

fn check_settings<F>(lookup: &F) -> (CheckResult, Option<Config>)
where
    F: Fn(&str) -> Option<String>,
{
    match Config::from_lookup(lookup) {
        Ok(config) => (CheckResult::Pass("valid".to_string()), Some(config)),
        Err(err) => (CheckResult::Fail(err.to_string()), None),
    }
}

fn print_effective_settings(config: &Config) {
    println!("\n  Effective settings");
    println!("  {}", "-".repeat(56));
    println!("  Model:          {}", config.llm.model);
    println!("  Base URL:       {}", config.llm.base_url);
    println!("  Group id:       {}", config.telegram.group_id);
    println!(
        "  Context window: {} messages",
        config.response.context_messages
    );
    println!(
        "  Reply delay:    {:.1}-{:.1}s",
        config.response.delay_min, config.response.delay_max
    );
    println!(
        "  Rate limit:     {} messages per {}s",
        config.safety.rate_limit_messages, config.safety.rate_limit_window_secs
    );
    let triggers = if config.response.trigger_words.is_empty() {
        "none".to_string()
    } else {
        config.response.trigger_words.join(", ")
    };
    println!("  Trigger words:  {triggers}");
    println!(
        "  Personality:    {}",
        config
            .persona
            .personality
            .as_deref()
            .unwrap_or(crate::persona::DEFAULT_PERSONALITY)
    );
    println!(
        "  Style:          {}",
        config
            .persona
            .style
            .as_deref()
            .unwrap_or(crate::persona::DEFAULT_STYLE)
    );
    println!("  Ignore bots:    {}", config.safety.ignore_bots);
}

fn check_command() -> Result<()> {
    println!("nonnobot {} check\n", crate::VERSION);
    println!("{}", "=".repeat(60));

    let mut fail_count = 0u32;
    let lookup = |key: &str| std::env::var(key).ok();

    let mut record = |name: &str, result: &CheckResult| {
        print_check(name, result);
        if result.is_fail() {
            fail_count += 1;
        }
    };

    println!("\n  Environment");
    println!("  {}", "-".repeat(56));

    record("Bot token", &check_bot_token(&lookup));
    record("Group id", &check_group_id(&lookup));
    record("API key", &check_api_key(&lookup));

    let (settings, config) = check_settings(&lookup);
    record("Settings", &settings);

    if let Some(config) = &config {
        print_effective_settings(config);
    }

    println!("\n{}", "=".repeat(60));
    if fail_count > 0 {
        println!("  Some checks failed. Review the output above.");
        anyhow::bail!("configuration is incomplete");
    }
    println!("  Configuration looks good.");

    Ok(())
}
