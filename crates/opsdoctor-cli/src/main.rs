mod settings;

use std::{
    fs::File,
    io::{self, BufWriter, IsTerminal, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use opsdoctor_core::{
    compute_summary, exit_code, render_summary_json, reporter_for, DockerModule, Engine,
    FilterOptions, ModuleReport, OutputFormat, Registry, RunContext, SuiteOutcome, TerraformModule,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "opsdoctor",
    author,
    version,
    about = "Infrastructure hygiene and DevOps validation toolkit"
)]
struct Cli {
    /// Configuration file (defaults to ./.opsdoctor.yaml or ./.opsdoctor.yml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT", global = true)]
    format: Option<FormatArg>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    json: bool,

    /// Write the report to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Only report HIGH and CRITICAL findings
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Abort the run after this long, e.g. `30s` or `2m`
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration, global = true)]
    timeout: Option<Duration>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Table,
    Json,
    #[value(alias = "md")]
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every enabled module and print an aggregated health report
    Doctor,
    /// Audit a single target
    Audit {
        #[command(subcommand)]
        target: AuditTarget,
    },
    /// Validate infrastructure-as-code sources
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
    },
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Subcommand, Debug)]
enum AuditTarget {
    /// Static checks on a Dockerfile
    Docker {
        /// Dockerfile to audit (overrides dockerfile.path)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ValidateTarget {
    /// Static checks on the *.tf files of a directory
    Terraform {
        /// Directory to validate (overrides terraform.dir)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        match self.format {
            Some(format) => format.into(),
            None if self.json => OutputFormat::Json,
            None => OutputFormat::default(),
        }
    }

    fn run_context(&self) -> RunContext {
        let ctx = match self.timeout {
            Some(timeout) => RunContext::with_timeout(timeout),
            None => RunContext::new(),
        };
        cancel_on_ctrl_c(&ctx);
        ctx
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let code = match &cli.command {
        Commands::Doctor => doctor(&cli, &settings).await?,
        Commands::Audit {
            target: AuditTarget::Docker { file },
        } => {
            let path = file.clone().unwrap_or_else(|| settings.dockerfile.path.clone());
            audit_docker(&cli, &settings, &path).await?
        }
        Commands::Validate {
            target: ValidateTarget::Terraform { dir },
        } => {
            let dir = dir.clone().unwrap_or_else(|| settings.terraform.dir.clone());
            validate_terraform(&cli, &settings, &dir).await?
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&settings)?);
            0
        }
    };
    Ok(exit_status(code))
}

/// Filters only shape what is rendered; the summary and exit code always see
/// every finding. JSON output is one document per module followed by the summary.
async fn doctor(cli: &Cli, settings: &Settings) -> Result<i32> {
    let mut registry = Registry::new();
    if settings.dockerfile.enabled {
        registry.register(DockerModule::from_options(&settings.dockerfile))?;
    }
    if settings.terraform.enabled {
        registry.register(TerraformModule::from_options(&settings.terraform))?;
    }

    let ctx = cli.run_context();
    let outcome = Engine::new(registry).run_all(&ctx).await;
    if let Some(failure) = &outcome.failure {
        eprintln!("warning: {failure}");
    }

    let rendered = settings.filters(cli.quiet).apply_reports(&outcome.reports);
    let format = cli.output_format();
    let (mut out, color) = open_output(cli.output.as_deref())?;
    let reporter = reporter_for(format, color);
    for report in &rendered {
        reporter.render(&mut out, &report.to_report())?;
        if report.is_failed() {
            writeln!(out, "  [ERROR] {}", report.error)?;
        }
    }
    if format == OutputFormat::Json {
        writeln!(out)?;
        render_summary_json(&mut out, &compute_summary(&outcome.reports))?;
    }
    out.flush().context("failed to flush report output")?;

    Ok(exit_code(&outcome.reports))
}

async fn audit_docker(cli: &Cli, settings: &Settings, path: &Path) -> Result<i32> {
    let module = DockerModule::new(path);
    let outcome = module
        .audit(&cli.run_context())
        .await
        .with_context(|| format!("docker audit of {} failed", path.display()))?;
    render_single(cli, &settings.filters(cli.quiet), "docker", outcome)
}

async fn validate_terraform(cli: &Cli, settings: &Settings, dir: &Path) -> Result<i32> {
    let module = TerraformModule::new(dir);
    let outcome = module
        .validate(&cli.run_context())
        .await
        .with_context(|| format!("terraform validation of {} failed", dir.display()))?;
    render_single(cli, &settings.filters(cli.quiet), "terraform", outcome)
}

/// Render one suite's findings; failed checks are warnings, not errors.
fn render_single(
    cli: &Cli,
    filters: &FilterOptions,
    module: &str,
    outcome: SuiteOutcome,
) -> Result<i32> {
    if let Some(failure) = &outcome.failure {
        eprintln!("warning: {failure}");
    }
    let report = ModuleReport::succeeded(module, filters.apply(&outcome.findings));

    let (mut out, color) = open_output(cli.output.as_deref())?;
    reporter_for(cli.output_format(), color).render(&mut out, &report.to_report())?;
    out.flush().context("failed to flush report output")?;

    Ok(exit_code(std::slice::from_ref(&report)))
}

/// Report sink plus whether it is an interactive terminal.
fn open_output(path: Option<&Path>) -> Result<(Box<dyn Write>, bool)> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open output file {}", path.display()))?;
            Ok((Box::new(BufWriter::new(file)), false))
        }
        None => {
            let stdout = io::stdout();
            let tty = stdout.is_terminal();
            Ok((Box::new(BufWriter::new(stdout.lock())), tty))
        }
    }
}

fn cancel_on_ctrl_c(ctx: &RunContext) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            ctx.cancel();
        }
    });
}

fn exit_status(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}
