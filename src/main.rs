//! Command-line front end.
//!
//! A thin shell over the library: every subcommand builds a [`Session`],
//! drives it through the same operations an interactive front end would use,
//! and prints the resulting state.
//!
//! ```text
//! applang [--config FILE] [--manifest FILE] <command>
//!
//!   mode                                 probe and print the privilege channel
//!   list [--query Q] [--system] [--modified]
//!   get <package>                        print the locale override
//!   set <package> <tag,tag,...>          replace the locale override
//!   reset <package>                      remove the locale override
//!   select <package>                     record a selection in history
//!   history [--clear]                    print or clear selection history
//! ```
//!
//! Packages come from the JSON manifest named by `--manifest` or the config's
//! `packages_file`. There is no broker service on a plain host, so the only
//! elevated channel is `su`.

use applang::domain::AppLabel;
use applang::infrastructure::ManifestPackageInfo;
use applang::privilege::NoBroker;
use applang::search::SearchPhase;
use applang::{initialize, observability, ApplangError, Config, LocaleOverride, Notification, Result, Session};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "\
usage: applang [--config FILE] [--manifest FILE] <command>

commands:
  mode
  list [--query Q] [--system] [--modified]
  get <package>
  set <package> <tag,tag,...>
  reset <package>
  select <package>
  history [--clear]";

#[derive(Debug)]
enum Command {
    Mode,
    List {
        query: String,
        system: bool,
        modified: bool,
    },
    Get(String),
    Set(String, LocaleOverride),
    Reset(String),
    Select(String),
    History {
        clear: bool,
    },
}

struct Cli {
    config: Option<PathBuf>,
    manifest: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> std::result::Result<Cli, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        return Err(USAGE.to_string());
    }

    let config = args
        .opt_value_from_str("--config")
        .map_err(|e| e.to_string())?;
    let manifest = args
        .opt_value_from_str("--manifest")
        .map_err(|e| e.to_string())?;

    let subcommand = args.subcommand().map_err(|e| e.to_string())?;
    let command = match subcommand.as_deref() {
        Some("mode") => Command::Mode,
        Some("list") => Command::List {
            query: args
                .opt_value_from_str("--query")
                .map_err(|e| e.to_string())?
                .unwrap_or_default(),
            system: args.contains("--system"),
            modified: args.contains("--modified"),
        },
        Some("get") => Command::Get(args.free_from_str().map_err(|e| e.to_string())?),
        Some("set") => {
            let package: String = args.free_from_str().map_err(|e| e.to_string())?;
            let tags: String = args.free_from_str().map_err(|e| e.to_string())?;
            Command::Set(package, LocaleOverride::parse_tag_list(&tags))
        }
        Some("reset") => Command::Reset(args.free_from_str().map_err(|e| e.to_string())?),
        Some("select") => Command::Select(args.free_from_str().map_err(|e| e.to_string())?),
        Some("history") => Command::History {
            clear: args.contains("--clear"),
        },
        Some(other) => return Err(format!("unknown command: {other}\n\n{USAGE}")),
        None => return Err(USAGE.to_string()),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(format!("unexpected arguments: {rest:?}\n\n{USAGE}"));
    }

    Ok(Cli {
        config,
        manifest,
        command,
    })
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("applang").join("config.toml"))
            .filter(|path| path.exists())
    });
    let mut config = match path {
        Some(path) => Config::from_toml_file(&path)?,
        None => Config::default(),
    };
    if let Some(manifest) = &cli.manifest {
        config.packages_file = Some(manifest.clone());
    }
    Ok(config)
}

fn build_session(config: &Config) -> Result<Session> {
    let packages = match &config.packages_file {
        Some(path) => ManifestPackageInfo::load(path)?,
        None => {
            tracing::warn!("no package manifest configured, directory will be empty");
            ManifestPackageInfo::default()
        }
    };
    initialize(config, Arc::new(packages), Arc::new(NoBroker))
}

fn print_records<'a>(records: impl IntoIterator<Item = &'a applang::ApplicationRecord>) {
    for record in records {
        let mut flags = String::new();
        if record.is_modified() {
            flags.push('M');
        }
        if record.is_system_app() {
            flags.push('S');
        }
        println!("{flags:<2} {:<32} {}", record.display_name, record.package_id);
    }
}

async fn require_privilege(session: &Session) -> Result<()> {
    if session.resolve_mode().await.is_privileged() {
        Ok(())
    } else {
        Err(ApplangError::NotPrivileged)
    }
}

fn report(package_id: &str, notification: Option<Notification>) {
    match notification {
        Some(Notification::MovedToTop) => println!("{package_id}: now modified"),
        Some(Notification::MovedToBottom) => println!("{package_id}: override removed"),
        _ => println!("{package_id}: updated"),
    }
}

async fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Mode => {
            println!("{}", session.resolve_mode().await);
        }
        Command::List {
            query,
            system,
            modified,
        } => {
            session.refresh_directory().await?;
            if system {
                session.toggle_facet(AppLabel::SystemApp);
            }
            if modified {
                session.toggle_facet(AppLabel::Modified);
            }
            let mut phase = session.subscribe_search_phase();
            session.set_query(&format!("{query}\n"));
            let settled = *phase
                .wait_for(|p| matches!(p, SearchPhase::Complete | SearchPhase::Idle))
                .await
                .map_err(|e| ApplangError::Worker(format!("search stopped: {e}")))?;
            if settled == SearchPhase::Idle {
                return Err(ApplangError::Worker("search did not complete".to_string()));
            }

            let state = session.snapshot();
            print_records(state.search_results.iter());
            if state.privilege_lost {
                eprintln!("warning: elevated channel lost during build, modified flags may be incomplete");
            }
        }
        Command::Get(package_id) => {
            require_privilege(session).await?;
            let locales = session.locale_override(&package_id).await?;
            if locales.is_empty() {
                println!("{package_id}: no override");
            } else {
                for entry in locales.entries() {
                    println!("{}", entry.encode());
                }
            }
        }
        Command::Set(package_id, locales) => {
            require_privilege(session).await?;
            session.refresh_directory().await?;
            let notification = session.set_locale_override(&package_id, &locales).await?;
            report(&package_id, notification);
        }
        Command::Reset(package_id) => {
            require_privilege(session).await?;
            session.refresh_directory().await?;
            let notification = session
                .set_locale_override(&package_id, &LocaleOverride::none())
                .await?;
            report(&package_id, notification);
        }
        Command::Select(package_id) => {
            session.refresh_directory().await?;
            session.select_app(&package_id).await?;
            println!("{package_id}: recorded");
        }
        Command::History { clear } => {
            if clear {
                session.clear_history().await?;
                println!("history cleared");
            } else {
                session.refresh_directory().await?;
                print_records(session.snapshot().history.iter());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("applang: {e}");
            return ExitCode::FAILURE;
        }
    };
    observability::init_tracing(&config);

    let result = match build_session(&config) {
        Ok(session) => run(&session, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("applang: {e}");
            ExitCode::FAILURE
        }
    }
}
