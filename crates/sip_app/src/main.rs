mod app;
mod config;
mod effects;
mod persistence;
mod render;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use engine_logging::{engine_info, LogDestination};
use log::LevelFilter;
use sip_core::{AuthGate, FormData};
use sip_engine::{ensure_output_dir, ClientSettings, EngineHandle, FsFileReader, LocalFileReader};

use crate::app::{Driver, RunOptions};
use crate::persistence::FileSessionStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

/// Plans a SIP goal against the planning API and saves the generated reports.
#[derive(Debug, Parser)]
#[command(name = "sip-wizard", version)]
struct Cli {
    /// API base URL, e.g. http://localhost:8000/api.
    #[arg(long)]
    api_url: Option<String>,
    /// Host the wizard is served from; picks the API when no URL is given.
    #[arg(long)]
    host: Option<String>,
    /// JSON object with the form answers.
    #[arg(long, value_name = "FILE", required_unless_present = "logout")]
    answers: Option<PathBuf>,
    #[arg(long, env = "SIP_USER")]
    user: Option<String>,
    #[arg(long, env = "SIP_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Directory for reports, the session file and the log file.
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// Also request fund recommendations for the generated plan.
    #[arg(long)]
    recommend_funds: bool,
    /// Directory reports can be read from directly, before any HTTP fallback.
    #[arg(long, value_name = "DIR")]
    local_files: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "terminal")]
    log: LogTarget,
    #[arg(long)]
    verbose: bool,
    /// Keep an incomplete trailing line across stream chunks.
    #[arg(long)]
    carry_partial_lines: bool,
    /// Seconds a streamed operation may run before it is stopped.
    #[arg(long, default_value_t = 600)]
    stream_timeout: u64,
    /// Regenerate a failed operation this many times.
    #[arg(long, default_value_t = 0)]
    retries: u32,
    /// Clear the stored session and exit.
    #[arg(long)]
    logout: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    ensure_output_dir(&cli.output)?;
    let log_file = cli.output.join("sip-wizard.log");
    let destination = match cli.log {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File(log_file),
        LogTarget::Both => LogDestination::Both(log_file),
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    engine_logging::initialize(destination, level);

    let store = FileSessionStore::load(&cli.output);
    let gate = AuthGate::with_demo_users();

    let env_url = std::env::var(config::API_URL_ENV).ok();
    let (api_base, source) =
        config::resolve_api_base(cli.api_url.as_deref(), env_url.as_deref(), cli.host.as_deref())?;
    engine_info!("Using API {} ({:?})", api_base, source);

    let mut settings = ClientSettings::new(api_base);
    settings.carry_partial_lines = cli.carry_partial_lines;
    let reader = cli
        .local_files
        .as_ref()
        .map(|dir| Arc::new(FsFileReader::new(dir.clone())) as Arc<dyn LocalFileReader>);
    let engine = EngineHandle::new(settings, reader)?;

    let mut driver = Driver::new(engine, store, gate);
    if cli.logout {
        driver.sign_out();
        return Ok(());
    }
    driver.sign_in(cli.user.as_deref(), cli.password.as_deref())?;

    let answers_path = cli
        .answers
        .context("--answers is required unless --logout is given")?;
    let options = RunOptions {
        answers: load_answers(&answers_path)?,
        output_dir: cli.output,
        recommend_funds: cli.recommend_funds,
        stream_timeout: Duration::from_secs(cli.stream_timeout),
        retries: cli.retries,
    };
    driver.run(&options)
}

fn load_answers(path: &std::path::Path) -> Result<FormData> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON object", path.display()))
}
