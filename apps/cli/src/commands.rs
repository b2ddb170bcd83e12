//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, FromArgMatches, Parser, Subcommand};
use color_eyre::eyre::Result;
use defi_trainer_core::{RunOutcome, RunSummary, SmokeTestOutcome, TrainingProgress};
use defi_trainer_shared::{TrainerConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DeFi trainer: turn a Solana DeFi knowledge base into fine-tuning data.
#[derive(Parser)]
#[command(
    name = "defi-trainer",
    version,
    about = "Build Solana DeFi training examples, embed them with a local model server, and write a JSON artifact.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand; runs the pipeline with configured defaults when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the training-data pipeline.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides for the pipeline.
#[derive(clap::Args, Default)]
pub(crate) struct RunArgs {
    /// Knowledge-base JSON file.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output artifact path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base URL of the local model server.
    #[arg(long, env = "DEFI_TRAINER_BASE_URL")]
    pub base_url: Option<String>,

    /// Skip the chat-completion smoke test.
    #[arg(long)]
    pub skip_smoke_test: bool,
}

impl RunArgs {
    /// Resolve run arguments when no subcommand was given.
    ///
    /// Only environment variables can be set on that path, so the flags are
    /// matched against an empty command line.
    fn from_env() -> std::result::Result<Self, clap::Error> {
        let cmd = Self::augment_args(clap::Command::new("defi-trainer"));
        let matches = cmd.try_get_matches_from(["defi-trainer"])?;
        Self::from_arg_matches(&matches)
    }

    /// Apply flag overrides on top of the loaded config.
    fn apply(self, config: &mut TrainerConfig) {
        if let Some(input) = self.input {
            config.pipeline.input_path = input;
        }
        if let Some(output) = self.output {
            config.pipeline.output_path = output;
        }
        if let Some(base_url) = self.base_url {
            config.server.base_url = base_url;
        }
        if self.skip_smoke_test {
            config.smoke_test.enabled = false;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "defi_trainer=info",
        1 => "defi_trainer=debug",
        _ => "defi_trainer=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let json_logs = matches!(cli.log_format, LogFormat::Json);
    match cli.command {
        None => cmd_run(RunArgs::from_env()?, json_logs).await,
        Some(Command::Run(args)) => cmd_run(args, json_logs).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Merge run overrides into the loaded config and validate the result.
///
/// Errors are logged and yield `None`; a run never exits non-zero on them.
fn resolve_config(
    loaded: defi_trainer_shared::Result<TrainerConfig>,
    args: RunArgs,
) -> Option<TrainerConfig> {
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return None;
        }
    };
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return None;
    }
    Some(config)
}

async fn cmd_run(args: RunArgs, json_logs: bool) -> Result<()> {
    let Some(config) = resolve_config(load_config(), args) else {
        return Ok(());
    };

    info!(
        input = %config.pipeline.input_path.display(),
        output = %config.pipeline.output_path.display(),
        server = %config.server.base_url,
        "running training pipeline"
    );

    let reporter = CliProgress::new(json_logs);

    tokio::select! {
        result = defi_trainer_core::run_training(&config, &reporter) => {
            reporter.clear();
            match result {
                Ok(RunOutcome::Completed(summary)) => {
                    if json_logs {
                        println!("{}", serde_json::to_string(&summary)?);
                    } else {
                        print_summary(&summary);
                    }
                }
                Ok(RunOutcome::NoData) => {
                    info!("nothing to do, pipeline aborted");
                }
                Err(e) => {
                    error!(error = %e, "training failed");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            reporter.clear();
            info!("training interrupted by user");
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let smoke = match &summary.smoke_test {
        SmokeTestOutcome::Replied(_) => "model replied",
        SmokeTestOutcome::Failed(_) => "failed (see log)",
        SmokeTestOutcome::Skipped => "skipped",
    };

    println!();
    println!("  Training data prepared!");
    println!("  Examples:   {}", summary.examples);
    println!(
        "  Embedded:   {} ({} failed)",
        summary.embedded, summary.failed_embeddings
    );
    println!("  Output:     {}", summary.output.path.display());
    println!("  SHA-256:    {}", summary.output.sha256);
    println!("  Smoke test: {smoke}");
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(hidden: bool) -> Self {
        if hidden {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl TrainingProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn embedding(&self, current: usize, total: usize, embedded: bool) {
        let mark = if embedded { "ok" } else { "failed" };
        self.spinner
            .set_message(format!("Embedding [{current}/{total}] {mark}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: TrainerConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_runs_with_defaults() {
        let cli = Cli::try_parse_from(["defi-trainer"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "defi-trainer",
            "-vv",
            "run",
            "--input",
            "kb.json",
            "--output",
            "out/train.json",
            "--base-url",
            "http://localhost:9000",
            "--skip-smoke-test",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run subcommand");
        };
        let mut config = TrainerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.pipeline.input_path, PathBuf::from("kb.json"));
        assert_eq!(config.pipeline.output_path, PathBuf::from("out/train.json"));
        assert_eq!(config.server.base_url, "http://localhost:9000");
        assert!(!config.smoke_test.enabled);
    }

    #[test]
    fn bare_invocation_reads_base_url_from_env() {
        // Only test in this module that touches the process environment.
        unsafe { std::env::set_var("DEFI_TRAINER_BASE_URL", "http://10.9.9.9:1") };
        let bare = RunArgs::from_env().unwrap();
        let Some(Command::Run(explicit)) = Cli::try_parse_from(["defi-trainer", "run"])
            .unwrap()
            .command
        else {
            panic!("expected run subcommand");
        };
        unsafe { std::env::remove_var("DEFI_TRAINER_BASE_URL") };

        let mut from_bare = TrainerConfig::default();
        bare.apply(&mut from_bare);
        let mut from_run = TrainerConfig::default();
        explicit.apply(&mut from_run);

        assert_eq!(from_bare.server.base_url, "http://10.9.9.9:1");
        assert_eq!(from_run.server.base_url, from_bare.server.base_url);
    }

    #[test]
    fn run_without_flags_keeps_config() {
        let mut config = TrainerConfig::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config.server.base_url, "http://127.0.0.1:1234");
        assert!(config.smoke_test.enabled);
    }

    #[test]
    fn config_errors_do_not_fail_the_run() {
        let broken = Err(defi_trainer_shared::TrainerError::config("bad toml"));
        assert!(resolve_config(broken, RunArgs::default()).is_none());

        let bad_url = RunArgs {
            base_url: Some("not a url".into()),
            ..RunArgs::default()
        };
        assert!(resolve_config(Ok(TrainerConfig::default()), bad_url).is_none());

        let config = resolve_config(Ok(TrainerConfig::default()), RunArgs::default()).unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:1234");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
