use anyhow::{anyhow, Context, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use linenum::config::Config;
use linenum::run::Runner;
use log::LevelFilter;
use std::path::{Path, PathBuf};

fn main() {
    let matches = App::new("linenum")
        .version(crate_version!())
        .about("Adds line-number gutters to the code samples of a blog's pages")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .global(true)
                .help("Logs more; repeat for debug output"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .global(true)
                .value_name("FILE")
                .help("Configuration file (default: nearest linenum.yaml)"),
        )
        .subcommand(
            SubCommand::with_name("annotate")
                .about("Annotates HTML pages, walking directories recursively")
                .arg(
                    Arg::with_name("out-dir")
                        .long("out-dir")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Writes annotated pages here instead of in place"),
                )
                .arg(
                    Arg::with_name("no-guard")
                        .long("no-guard")
                        .help("Doesn't mark annotated blocks; repeated runs stack gutters"),
                )
                .arg(
                    Arg::with_name("PATH")
                        .required(true)
                        .multiple(true)
                        .help("HTML files or directories"),
                ),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders a Markdown article to HTML on stdout")
                .arg(
                    Arg::with_name("drafts")
                        .long("drafts")
                        .help("Renders the article even if it's a draft"),
                )
                .arg(Arg::with_name("FILE").required(true).help("Markdown article")),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));
    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    match matches.subcommand() {
        ("annotate", Some(sub)) => annotate(config, sub),
        ("render", Some(sub)) => render(config, sub),
        (name, _) => Err(anyhow!("Unknown subcommand `{}`", name)),
    }
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    // `--config` is global, so it may sit on either side of the subcommand
    let explicit = matches
        .value_of("config")
        .or_else(|| matches.subcommand().1.and_then(|sub| sub.value_of("config")));
    match explicit {
        Some(path) => Config::from_file(Path::new(path)),
        None => Config::from_directory(
            &std::env::current_dir().context("Getting the working directory")?,
        ),
    }
}

fn annotate(mut config: Config, matches: &ArgMatches) -> Result<()> {
    if let Some(dir) = matches.value_of("out-dir") {
        config.output_directory = Some(PathBuf::from(dir));
    }
    if matches.is_present("no-guard") {
        config.guard = false;
    }

    let options = config.options();
    let runner = Runner {
        options: &options,
        extensions: &config.extensions,
        output_directory: config.output_directory.as_deref(),
    };
    let paths: Vec<&str> = matches.values_of("PATH").into_iter().flatten().collect();
    let stats = runner.run(&paths[..])?;
    log::info!(
        "{} page(s) read, {} written; {} sample(s) annotated, {} skipped",
        stats.pages,
        stats.written,
        stats.samples.annotated,
        stats.samples.skipped
    );
    Ok(())
}

fn render(config: Config, matches: &ArgMatches) -> Result<()> {
    let path = Path::new(matches.value_of("FILE").unwrap_or_default());
    let include_drafts = config.include_drafts || matches.is_present("drafts");
    let options = config.options();
    let runner = Runner {
        options: &options,
        extensions: &config.extensions,
        output_directory: None,
    };
    let (html, _) = runner.render(path, include_drafts)?;
    println!("{}", html);
    Ok(())
}
