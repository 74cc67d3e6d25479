mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vttcloud_lib::consts::DEFAULT_ASSEMBLY_DIR;
use vttcloud_lib::{AppKind, StackConfig};

use cmd::{FoundryArgs, TemplateFormatArg};
use output::{OutputFormat, print_error};

/// vttcloud - CloudFormation synthesizer for Foundry VTT on ECS Fargate
#[derive(Parser)]
#[command(name = "vttcloud")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Deployment stage (overrides $STAGE)
  #[arg(long, global = true)]
  stage: Option<String>,

  /// Project name (overrides $PROJECT)
  #[arg(long, global = true)]
  project: Option<String>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Synthesize an app into a cloud assembly directory
  Synth {
    /// Which stacks to synthesize: ecs, foundry or split
    #[arg(default_value_t = AppKind::Ecs)]
    app: AppKind,

    /// Output directory
    #[arg(short = 'O', long, default_value = DEFAULT_ASSEMBLY_DIR)]
    out: PathBuf,

    /// Template format
    #[arg(long, value_enum, default_value_t = TemplateFormatArg::Json)]
    format: TemplateFormatArg,

    #[command(flatten)]
    foundry: FoundryArgs,
  },

  /// List an app's stacks in deploy order
  List {
    #[arg(default_value_t = AppKind::Ecs)]
    app: AppKind,

    #[command(flatten)]
    foundry: FoundryArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the cross-stack exports an app produces and consumes
  Exports {
    #[arg(default_value_t = AppKind::Ecs)]
    app: AppKind,

    #[command(flatten)]
    foundry: FoundryArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Compare a fresh synthesis with the assembly on disk
  Diff {
    #[arg(default_value_t = AppKind::Ecs)]
    app: AppKind,

    /// Assembly directory to compare against
    #[arg(short = 'O', long, default_value = DEFAULT_ASSEMBLY_DIR)]
    out: PathBuf,

    #[command(flatten)]
    foundry: FoundryArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the resolved deployment context and defaults
  Info {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "info" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let config = StackConfig::from_env().with_overrides(cli.stage, cli.project);
  tracing::debug!(stage = %config.stage, project = %config.project, "resolved deployment context");

  match cli.command {
    Commands::Synth {
      app,
      out,
      format,
      foundry,
    } => cmd::cmd_synth(&config, app, &foundry, &out, format.into(), cli.verbose),
    Commands::List { app, foundry, output } => cmd::cmd_list(&config, app, &foundry, output.is_json()),
    Commands::Exports { app, foundry, output } => cmd::cmd_exports(&config, app, &foundry, output.is_json()),
    Commands::Diff {
      app,
      out,
      foundry,
      output,
    } => cmd::cmd_diff(&config, app, &foundry, &out, cli.verbose, output.is_json()),
    Commands::Info { output } => cmd::cmd_info(&config, output.is_json()),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
