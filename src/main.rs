use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use jobnorm::config::RulesConfig;
use jobnorm::{
    JobListingBuilder, JobnormConfig, RuleSet, load_records, parse_timestamp, resolve_rules,
    telemetry, validate_batch,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "jobnorm",
    about = "Normalize and validate scraped job listings",
    version
)]
struct Cli {
    /// Pipeline configuration file (YAML); JOBNORM__* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate raw records (JSON array or JSON Lines) and print the report
    Validate(ValidateArgs),
    /// Compile a rule set and print what it contains
    CheckRules(CheckRulesArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Records file; `.jsonl` / `.ndjson` are read line by line
    input: PathBuf,
    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Rule file, replacing the configured rule source
    #[arg(long, conflicts_with = "builtin_rules")]
    rules: Option<PathBuf>,
    /// Use the built-in rule set
    #[arg(long)]
    builtin_rules: bool,
    /// Validate on the calling thread only
    #[arg(long)]
    sequential: bool,
    /// Reference time for defaults and expiry (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
    /// Exit with status 2 when any record is rejected
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct CheckRulesArgs {
    /// Rule file; defaults to the configured rule source
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("application error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = JobnormConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Validate(args) => {
            if let Some(path) = args.rules {
                config.set_rules(RulesConfig::from_path(path));
            } else if args.builtin_rules {
                config.set_rules(RulesConfig::builtin());
            }
            if args.sequential {
                config.batch.parallel = false;
            }
            telemetry::init(&config)?;
            info!(
                environment = %config.environment,
                input = %args.input.display(),
                "validate_started"
            );

            let records = load_records(&args.input)?;
            let rules = resolve_rules(&config)?;
            let mut builder = JobListingBuilder::new(&rules);
            if let Some(now) = args.now {
                builder = builder.with_clock(now);
            }
            let report = validate_batch(&records, &builder, &config.batch);

            let writer: Box<dyn Write> = match &args.output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(writer);
            if args.pretty {
                serde_json::to_writer_pretty(&mut writer, &report)?;
            } else {
                serde_json::to_writer(&mut writer, &report)?;
            }
            writeln!(writer)?;
            writer.flush()?;

            if args.strict && report.failed() > 0 {
                return Ok(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckRules(args) => {
            if let Some(path) = args.path {
                config.set_rules(RulesConfig::from_path(path));
            }
            telemetry::init(&config)?;
            let rules = resolve_rules(&config)?;
            print_rules(&rules);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_rules(rules: &RuleSet) {
    let definition = rules.definition();
    let codes: Vec<&str> = rules.currency_codes().collect();
    let periods: Vec<&str> = definition.periods.keys().collect();
    let levels: Vec<&str> = definition.seniority.levels.keys().collect();

    println!("currencies:          {}", codes.join(", "));
    println!("salary patterns:     {}", rules.salary_pattern_count());
    println!("experience patterns: {}", rules.experience_pattern_count());
    println!("periods:             {}", periods.join(", "));
    println!("negotiable keywords: {}", definition.negotiable_keywords.join(", "));
    println!("seniority levels:    {}", levels.join(", "));
    println!("detection strategy:  {:?}", rules.detection_strategy());
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("'{value}' is not RFC 3339 or YYYY-MM-DD"))
}
