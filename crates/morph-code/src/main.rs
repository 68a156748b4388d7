//! Console bot that generates and patches files with an LLM.
//!
//! Reads `OPENAI_API_KEY` (and optionally `CLAUDE_COOKIE`) from the
//! environment or a `.env` file in the current directory. Logs go to
//! stderr, replies to stdout.
//!
//! # Examples
//!
//! ```sh
//! # Work on files in the current directory
//! morph
//!
//! # Another project, another model, verbose logs
//! morph --workdir /path/to/project --model gpt-4o-mini --verbose
//!
//! # Join every code block of a reply instead of keeping the last one
//! morph --block-policy concat
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use morph_code::{ConsoleTransport, MorphConfig, Services, build_machine};
use morph_rs::OpenAiClient;
use morph_rs::credentials::{
    CookieFile, CredentialProvider, StaticCredential, UnavailableCredentials,
};
use morph_rs::error::MorphError;
use morph_rs::extract::BlockPolicy;
use morph_rs::session::SessionManager;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Session id of the single terminal conversation.
const SESSION_ID: &str = "console";

/// Console bot that generates and patches files with an LLM.
#[derive(Parser)]
#[command(name = "morph", version)]
struct Cli {
    /// Model to use for completions [env: MORPH_MODEL].
    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API [env: MORPH_BASE_URL].
    #[arg(long)]
    base_url: Option<String>,

    /// Directory relative file names are resolved against.
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Word budget for the history sent to the model [env: MORPH_WORD_BUDGET].
    #[arg(long)]
    word_budget: Option<usize>,

    /// What to write when a reply holds several code blocks: `last` or `concat`.
    #[arg(long)]
    block_policy: Option<BlockPolicy>,

    /// File holding a claude.ai session cookie, read by /authenticate_claude.
    #[arg(long)]
    cookie_file: Option<PathBuf>,

    /// Log at debug level, including model replies.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags win over the environment.
    fn apply(&self, mut config: MorphConfig) -> MorphConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(workdir) = &self.workdir {
            config.workdir = workdir.clone();
        }
        if let Some(budget) = self.word_budget.filter(|n| *n > 0) {
            config.word_budget = budget;
        }
        if let Some(policy) = self.block_policy {
            config.block_policy = policy;
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("morph_code=debug,morph_rs=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("morph_code=info,morph_rs=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn credentials(cookie_file: Option<PathBuf>, config: &MorphConfig) -> Arc<dyn CredentialProvider> {
    match (cookie_file, &config.claude_cookie) {
        (Some(path), _) => Arc::new(CookieFile::new(path)),
        (None, Some(cookie)) => Arc::new(StaticCredential::new(cookie.clone())),
        (None, None) => Arc::new(UnavailableCredentials),
    }
}

/// Run one turn. Returns `true` when the driver should stop.
async fn turn(sessions: &SessionManager, text: &str) -> bool {
    match sessions.dispatch(SESSION_ID, text).await {
        Ok(route) => route.is_exit(),
        Err(e) => {
            error!(session = SESSION_ID, error = %e, "Turn failed");
            false
        }
    }
}

async fn run(cli: Cli) -> Result<(), MorphError> {
    let config = cli.apply(MorphConfig::from_env());
    info!(
        model = %config.model,
        base_url = %config.base_url,
        workdir = %config.workdir.display(),
        word_budget = config.word_budget,
        block_policy = %config.block_policy,
        api_key = config.has_api_key(),
        "Starting morph"
    );

    let gateway = OpenAiClient::with_endpoint(
        config.api_key.clone().unwrap_or_default(),
        &config.base_url,
        &config.model,
    )?;
    let credentials = credentials(cli.cookie_file, &config);
    let services = Arc::new(Services::new(config, Arc::new(gateway), credentials));
    let machine = build_machine(services)?;
    let sessions = SessionManager::new(machine, Arc::new(ConsoleTransport::stdout()));

    if turn(&sessions, "/start").await {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if turn(&sessions, line.trim()).await {
                    break;
                }
            }
            Ok(None) => {
                info!("Input closed");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read input");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "morph failed to start");
            ExitCode::FAILURE
        }
    }
}
