use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use augur::commands::App;
use augur::config::{LOG_FILE, Paths};
use augur::error::AugurError;
use clap::{ArgGroup, CommandFactory, Parser};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const BANNER: &str = r"
     /\
    /  \  _   _  __ _ _   _ _ __
   / /\ \| | | |/ _` | | | | '__|
  / ____ \ |_| | (_| | |_| | |
 /_/    \_\__,_|\__, |\__,_|_|
                 __/ |
                |___/
";

/// Exit code for `--check --exit-code` when drift was found
const DRIFT_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "augur")]
#[command(version, about = "Check the Winry repository for updates from the AUR.")]
#[command(before_help = BANNER)]
#[command(group(
    ArgGroup::new("verb")
        .args(["init", "update", "check", "blacklist", "whitelist", "print_blacklist"])
        .multiple(false)
))]
struct Cli {
    /// Initialize the list of AUR packages and versions, optionally from a snapshot file
    #[arg(short, long, value_name = "PATH", num_args = 0..=1)]
    init: Option<Option<PathBuf>>,

    /// Update the list of AUR packages and versions
    #[arg(short, long)]
    update: bool,

    /// Check the list of AUR packages against the repository
    #[arg(short, long)]
    check: bool,

    /// Blacklist a package from being checked
    #[arg(short, long, value_name = "PACKAGE")]
    blacklist: Option<String>,

    /// Whitelist a package so it is checked again
    #[arg(short, long, value_name = "PACKAGE")]
    whitelist: Option<String>,

    /// Print the blacklist
    #[arg(short = 'p', long = "print-blacklist")]
    print_blacklist: bool,

    /// Replace an existing cache without asking
    #[arg(short, long)]
    yes: bool,

    /// With --check, exit with status 2 when upgrades or downgrades are found
    #[arg(
        long,
        conflicts_with_all = ["init", "update", "blacklist", "whitelist", "print_blacklist"]
    )]
    exit_code: bool,
}

/// The single action selected on the command line
#[derive(Debug, PartialEq, Eq)]
enum Verb<'a> {
    Init(Option<&'a Path>),
    Update,
    Check,
    Blacklist(&'a str),
    Whitelist(&'a str),
    PrintBlacklist,
}

impl Cli {
    fn verb(&self) -> Option<Verb<'_>> {
        if let Some(seed) = &self.init {
            Some(Verb::Init(seed.as_deref()))
        } else if self.update {
            Some(Verb::Update)
        } else if self.check {
            Some(Verb::Check)
        } else if let Some(name) = &self.blacklist {
            Some(Verb::Blacklist(name))
        } else if let Some(name) = &self.whitelist {
            Some(Verb::Whitelist(name))
        } else if self.print_blacklist {
            Some(Verb::PrintBlacklist)
        } else {
            None
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    if running_as_root() {
        println!("=> This program cannot be ran as root");
        return Ok(ExitCode::SUCCESS);
    }

    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    }

    let cli = Cli::parse();
    let Some(verb) = cli.verb() else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    let paths = Paths::from_env();
    let _guard = init_logging(&paths);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let app = App::new(paths);

    match runtime.block_on(run(&app, verb, &cli)) {
        Ok(code) => Ok(code),
        Err(AugurError::Declined) => {
            println!("=> Exiting...");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("{}", e);
            println!("=> Error! {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(app: &App, verb: Verb<'_>, cli: &Cli) -> Result<ExitCode, AugurError> {
    let confirm: &dyn Fn() -> bool = if cli.yes { &assume_yes } else { &ask_overwrite };

    match verb {
        Verb::Init(seed) => app.init(seed, confirm).await?,
        Verb::Update => app.update(confirm).await?,
        Verb::Check => {
            let report = app.check().await?;
            if cli.exit_code && report.has_drift() {
                return Ok(ExitCode::from(DRIFT_EXIT_CODE));
            }
        }
        Verb::Blacklist(name) => app.blacklist_add(name)?,
        Verb::Whitelist(name) => app.whitelist(name)?,
        Verb::PrintBlacklist => app.print_blacklist(),
    }

    Ok(ExitCode::SUCCESS)
}

fn assume_yes() -> bool {
    true
}

fn ask_overwrite() -> bool {
    println!("=> There's already a cache present, are you sure you would like to download another one?");
    print!("=[y/N]> ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y")
}

/// Log to `$XDG_DATA_HOME/augur/augur.log`, or to stderr when that directory
/// cannot be created. `AUGUR_LOG` overrides the filter.
fn init_logging(paths: &Paths) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_env("AUGUR_LOG").unwrap_or_else(|_| EnvFilter::new("augur=info"));

    match std::fs::create_dir_all(&paths.data_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(&paths.data_dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("warn"))
                .with_writer(io::stderr)
                .init();
            None
        }
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}
