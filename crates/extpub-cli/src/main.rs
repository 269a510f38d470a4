use std::process::Command as ProcessCommand;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use extpub::credentials::check_signing_key;
use extpub::engine::{ReleaseReadiness, Reporter};
use extpub::env::{EnvSource, TESTING_PREFIX};
use extpub::heartbeat::{DEFAULT_MESSAGE, with_heartbeat};

#[derive(Parser, Debug)]
#[command(name = "extpub", version)]
#[command(about = "CI gating and keep-alive output for external artifact publishing")]
struct Cli {
    /// Resolve variables from fixed KEY=VALUE pairs instead of the process
    /// environment (repeatable). Lets a harness simulate CI deterministically.
    #[arg(long = "testing-env", value_name = "KEY=VALUE", global = true)]
    testing_env: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print build-context, credential, and gating diagnostics.
    Doctor {
        /// Emit the readiness report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Fail unless a complete GPG signing key is present in the environment.
    CheckSigningKey,
    /// Run a command, emitting a keep-alive line while it is silent.
    Run {
        /// Interval between keep-alive lines (e.g. 5m, 30s).
        #[arg(long, default_value = "5m")]
        period: String,

        /// The command and its arguments.
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn env_source(cli: &Cli) -> Result<EnvSource> {
    if cli.testing_env.is_empty() {
        return Ok(EnvSource::Process);
    }

    let mut vars = Vec::with_capacity(cli.testing_env.len());
    for pair in &cli.testing_env {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("invalid --testing-env value {pair:?}, expected KEY=VALUE");
        };
        if name.is_empty() {
            bail!("invalid --testing-env value {pair:?}, variable name is empty");
        }
        // Names are stored unprefixed on the command line; the source applies
        // the override convention itself.
        let name = name.strip_prefix(TESTING_PREFIX).unwrap_or(name);
        vars.push((name.to_string(), value.to_string()));
    }
    Ok(EnvSource::testing(vars))
}

fn presence(present: bool) -> &'static str {
    if present { "present" } else { "absent" }
}

fn doctor(env: &EnvSource, json: bool) -> Result<()> {
    let mut reporter = CliReporter;
    let readiness = ReleaseReadiness::assess(env, &mut reporter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&readiness)?);
        return Ok(());
    }

    println!("context:");
    println!("  tag_build: {}", readiness.context.tag_build);
    println!("  fork: {}", readiness.context.fork);
    println!("  ci: {}", readiness.context.ci);
    println!("credentials:");
    println!(
        "  gpg_signing_key: {}",
        presence(readiness.credentials.gpg_signing_key)
    );
    println!("  sonatype: {}", presence(readiness.credentials.sonatype));
    println!(
        "  gradle_portal: {}",
        presence(readiness.credentials.gradle_portal)
    );
    println!("  jetbrains: {}", presence(readiness.credentials.jetbrains));
    println!("decisions:");
    println!("  release_publish: {}", readiness.decisions.release_publish);
    println!("  signing: {}", readiness.decisions.signing);
    println!(
        "  staging_preflight: {}",
        readiness.decisions.staging_preflight
    );
    Ok(())
}

fn run_with_heartbeat(env: &EnvSource, period: &str, command: &[String]) -> Result<()> {
    let period = humantime::parse_duration(period)
        .with_context(|| format!("invalid --period value {period:?}"))?;

    let mut reporter = CliReporter;
    if env.is_ci() {
        reporter.info(&format!(
            "emitting keep-alive output every {}",
            humantime::format_duration(period)
        ));
    }

    let (program, args) = command
        .split_first()
        .context("no command given")?;

    let status = with_heartbeat(
        period,
        || eprintln!("[info] {DEFAULT_MESSAGE}"),
        || ProcessCommand::new(program).args(args).status(),
    )
    .with_context(|| format!("failed to run {program}"))?;

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = env_source(&cli)?;

    match &cli.cmd {
        Commands::Doctor { json } => doctor(&env, *json),
        Commands::CheckSigningKey => {
            let mut reporter = CliReporter;
            // Surface the per-variable warnings before the gate fires, the
            // same lines an operator sees from doctor.
            let _ = ReleaseReadiness::assess(&env, &mut reporter)?;
            check_signing_key(&env)?;
            reporter.info("complete GPG signing key found");
            Ok(())
        }
        Commands::Run { period, command } => run_with_heartbeat(&env, period, command),
    }
}
