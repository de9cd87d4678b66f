//! # wikirace CLI
//!
//! Plays one Wikipedia Game from a random article (or `--start`) towards a
//! target phrase, printing progress and the final path.
//!
//! Usage:
//!   wikirace [OPTIONS] [TARGET]...
//!
//! Examples:
//!   GEMINI_API_KEY=... wikirace Albert Einstein
//!   wikirace --lang en --provider openai --model gpt-4o-mini "Mount Everest"
//!   wikirace --start https://pl.wikipedia.org/wiki/Wis%C5%82a --json Kraków
//!
//! Exit status: 0 when the target was reached, 2 when the run ended
//! without it, 1 on a fatal error.

use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;
use wikirace_error::{Error, Result};
use wikirace_game::{
    normalize_url, provider_config, FetchConfig, FallbackReason, Game, GameConfig, GameObserver,
    HttpFetcher, LinkExtractor, LlmOracle, OracleConfig, Outcome, RankingOracle, RunReport,
    Selection,
};
use wikirace_llm::{AnyProvider, ProviderType};

#[derive(Parser)]
#[command(name = "wikirace")]
#[command(author, version, about = "Plays the Wikipedia Game with an LLM picking the links")]
struct Cli {
    /// Target article phrase (asked for interactively when omitted)
    target: Vec<String>,

    /// Wikipedia language edition
    #[arg(short, long, default_value = "pl")]
    lang: String,

    /// Site root to play on instead of <lang>.wikipedia.org
    #[arg(long)]
    base_url: Option<String>,

    /// Start article URL instead of a random one
    #[arg(long)]
    start: Option<String>,

    /// Maximum number of pages to visit
    #[arg(long, default_value_t = 30)]
    max_steps: usize,

    /// How many links the oracle is shown
    #[arg(long, default_value_t = 50)]
    candidate_limit: usize,

    /// Delay before each page fetch, in milliseconds
    #[arg(long, default_value_t = 500)]
    pace_ms: u64,

    /// Page fetch timeout, in seconds
    #[arg(long, default_value_t = 10)]
    fetch_timeout: u64,

    /// LLM backend used to rank links
    #[arg(short, long, value_enum, default_value_t = ProviderChoice::Gemini)]
    provider: ProviderChoice,

    /// Model name (provider default when omitted)
    #[arg(short, long)]
    model: Option<String>,

    /// Oracle call timeout, in seconds
    #[arg(long, default_value_t = 60)]
    oracle_timeout: u64,

    /// Print the run report as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Show diagnostics and token usage
    #[arg(short, long)]
    verbose: bool,

    /// Only print the final path
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderChoice {
    Gemini,
    Openai,
    Anthropic,
    /// OpenAI-compatible local server (Ollama at OLLAMA_BASE_URL)
    Local,
}

impl From<ProviderChoice> for ProviderType {
    fn from(choice: ProviderChoice) -> Self {
        match choice {
            ProviderChoice::Gemini => ProviderType::Gemini,
            ProviderChoice::Openai => ProviderType::OpenAI,
            ProviderChoice::Anthropic => ProviderType::Anthropic,
            ProviderChoice::Local => ProviderType::Local,
        }
    }
}

/// Prints the step-by-step progress lines
struct ConsoleObserver {
    quiet: bool,
}

impl GameObserver for ConsoleObserver {
    fn on_page(&mut self, step: usize, title: &str, _url: &str) {
        if !self.quiet {
            println!("Step {}: {}", step, title);
        }
    }

    fn on_candidates(&mut self, count: usize) {
        if !self.quiet && count > 0 {
            println!("Found {} candidates.", count);
        }
    }

    fn on_selection(&mut self, selection: &Selection) {
        if self.quiet {
            return;
        }
        if let Some(response) = selection.response() {
            println!("Oracle chose: {}", response.trim());
        }
        match selection {
            Selection::Direct { candidate } => {
                println!("Found a direct link to the target: {}", candidate.text);
            }
            Selection::Ranked { choice, candidate, .. } => {
                println!("Choosing link #{}: {}", choice, candidate.text);
            }
            Selection::Fallback { reason: FallbackReason::NoNumber, .. } => {
                println!("No number in the answer, choosing the first link.");
            }
            Selection::Fallback { reason: FallbackReason::OutOfRange { digits }, .. } => {
                println!("Number {} out of range, choosing the first link.", digits);
            }
        }
    }

    fn on_finish(&mut self, outcome: &Outcome) {
        if self.quiet {
            return;
        }
        match outcome {
            Outcome::Success { title } => println!("Reached the target page: {}", title),
            Outcome::DeadEnd => println!("No further links!"),
            Outcome::FetchFailed { .. } => println!("Could not fetch the page!"),
            Outcome::StepCap => println!("Step cap reached."),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Target from the command line, or asked for on stdin
fn read_target(words: &[String]) -> Result<String> {
    let target = if words.is_empty() {
        print!("Target article: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    } else {
        words.join(" ")
    };

    let target = target.trim().to_string();
    if target.is_empty() {
        return Err(Error::invalid_argument("no target phrase given").with_operation("cli::target"));
    }
    Ok(target)
}

fn print_path(report: &RunReport) {
    println!("\nPath:");
    for (i, title) in report.path.iter().enumerate() {
        println!("{}. {}", i + 1, title);
    }
}

async fn run(cli: &Cli) -> Result<RunReport> {
    // Credentials first: nothing is fetched without a working oracle.
    let provider_type = ProviderType::from(cli.provider);
    let llm_config = provider_config(provider_type, cli.model.as_deref(), |key| std::env::var(key).ok())?
        .with_timeout(cli.oracle_timeout);
    let provider = AnyProvider::from_config(llm_config).map_err(|e| {
        Error::config_invalid(e.to_string())
            .with_operation("cli::provider")
            .set_source(e)
    })?;
    let oracle = LlmOracle::new(
        provider,
        OracleConfig {
            timeout: Duration::from_secs(cli.oracle_timeout),
            ..OracleConfig::default()
        },
    );

    let mut fetch_config = match &cli.base_url {
        Some(base) => FetchConfig {
            base_url: base.trim_end_matches('/').to_string(),
            ..FetchConfig::default()
        },
        None => FetchConfig::for_language(&cli.lang),
    };
    fetch_config.timeout = Duration::from_secs(cli.fetch_timeout);

    let base = Url::parse(&fetch_config.base_url).map_err(|e| {
        Error::config_invalid(format!("invalid base url '{}'", fetch_config.base_url))
            .with_operation("cli::config")
            .set_source(e)
    })?;

    let target = read_target(&cli.target)?;

    let fetcher = HttpFetcher::new(fetch_config)?;
    let start = match &cli.start {
        Some(start) => {
            Url::parse(start).map_err(|e| {
                Error::invalid_argument(format!("start must be an absolute URL: {}", start))
                    .with_operation("cli::start")
                    .set_source(e)
            })?;
            normalize_url(start)
        }
        None => fetcher.resolve_random_start().await?,
    };
    debug!(%start, %target, "starting run");

    let game_config = GameConfig {
        max_steps: cli.max_steps,
        candidate_limit: cli.candidate_limit,
        pace: Duration::from_millis(cli.pace_ms),
    };
    let mut game = Game::new(game_config, LinkExtractor::new(base), fetcher, oracle);
    let mut observer = ConsoleObserver {
        quiet: cli.quiet || cli.json,
    };

    let report = game.run(&start, &target, &mut observer).await?;

    if cli.verbose {
        if let Some(usage) = game.oracle().usage() {
            eprintln!(
                "Oracle calls: {}, tokens: {} prompt + {} completion",
                usage.total_calls, usage.total_prompt_tokens, usage.total_completion_tokens
            );
        }
    }
    Ok(report)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            if cli.verbose {
                eprintln!("{:?}", e);
            }
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_path(&report);
    }

    if !report.outcome.is_success() {
        std::process::exit(2);
    }
}
