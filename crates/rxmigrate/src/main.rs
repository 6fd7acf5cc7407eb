//! `rxmigrate` command line

use std::path::PathBuf;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use rxmigrate::{run, DriverConfig};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("rxmigrate")
        .version(rxmigrate_core::VERSION)
        .about("Replace deprecated RxJS toPromise() calls with firstValueFrom/lastValueFrom")
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Files or directories to transform"),
        )
        .arg(
            Arg::new("dry")
                .long("dry")
                .action(ArgAction::SetTrue)
                .help("Transform without writing files"),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .action(ArgAction::SetTrue)
                .help("Print rewritten sources to stdout"),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .value_parser(value_parser!(usize))
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output the summary as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DriverConfig::new(),
    };
    if matches.get_flag("dry") {
        config = config.with_dry_run(true);
    }
    if matches.get_flag("print") {
        config = config.with_print(true);
    }
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        config = config.with_jobs(*jobs);
    }

    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("paths")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();

    let report = run(&config, &paths).context("migration run failed")?;

    for (path, source) in &report.printed {
        println!("// {}", path.display());
        print!("{source}");
    }
    if matches.get_flag("json") {
        println!("{}", report.to_json().context("serializing report")?);
    } else {
        eprint!("{}", report.generate_text());
    }

    std::process::exit(if report.passed() { 0 } else { 1 });
}
