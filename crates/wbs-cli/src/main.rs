//! `wbs-sync` command line
//!
//! Operates on a project hierarchy saved as a JSON store snapshot. Commands
//! that write save the snapshot back in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wbs_driver::{ApprovalDecision, SyncDriver, SyncReport, SyncScanner, SyncSettings, SyncStatus};
use wbs_hierarchy::{MemoryStore, StoreSnapshot};
use wbs_model::HierarchyPath;

fn project_arg() -> Arg {
    Arg::new("project")
        .required(true)
        .value_parser(value_parser!(HierarchyPath))
        .help("Any hierarchy path inside the project")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output the report as JSON")
}

fn cli() -> Command {
    Command::new("wbs-sync")
        .version(wbs_driver::VERSION)
        .about("Synchronize project hierarchies with their team WBS")
        .subcommand_required(true)
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON snapshot of the project hierarchy"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML sync settings"),
        )
        .subcommand(
            Command::new("check")
                .about("Report what a sync would change without writing")
                .arg(project_arg())
                .arg(
                    Arg::new("brief")
                        .long("brief")
                        .action(ArgAction::SetTrue)
                        .help("Stop at the first change"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Synchronize the project")
                .arg(project_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("approve")
                .about("Resume a run suspended for approval")
                .arg(project_arg())
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["delete", "complete"])
                        .help("Approve every pending operation"),
                )
                .arg(
                    Arg::new("delete")
                        .long("delete")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(HierarchyPath))
                        .help("Approve deleting this node"),
                )
                .arg(
                    Arg::new("complete")
                        .long("complete")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(HierarchyPath))
                        .help("Approve marking this node complete"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply a pending template migration")
                .arg(project_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("scan")
                .about("Check every project and flag those needing a sync")
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_parser(value_parser!(u64))
                        .help("Keep scanning every N seconds until interrupted"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let store_path = matches
        .get_one::<PathBuf>("store")
        .cloned()
        .context("--store is required")?;
    let settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => SyncSettings::load(path).await?,
        None => SyncSettings::default(),
    };
    let store = Arc::new(load_store(&store_path).await?);
    let driver = SyncDriver::new(Arc::clone(&store), settings);

    let Some((command, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    let report = match command {
        "check" => {
            let project = project(args)?;
            if args.get_flag("brief") {
                driver.check_brief(project).await?
            } else {
                driver.check(project).await?
            }
        }
        "run" => driver.run(project(args)?).await?,
        "approve" => {
            let project = project(args)?;
            let decision = if args.get_flag("all") {
                let pending = driver.check(project).await?.pending;
                ApprovalDecision::approve_all(&pending)
            } else {
                ApprovalDecision {
                    deletions: paths(args, "delete"),
                    completions: paths(args, "complete"),
                }
            };
            driver.approve(project, &decision).await?
        }
        "migrate" => driver.migrate(project(args)?).await?,
        "scan" => {
            let scanner = SyncScanner::new(driver.clone());
            match args.get_one::<u64>("interval") {
                Some(&secs) => {
                    let settings = driver.settings().scanner.clone().with_interval_secs(secs.max(1));
                    watch(scanner.with_settings(settings)).await?;
                }
                None => {
                    for project in scanner.scan_once().await {
                        println!("{project} needs to be synchronized");
                    }
                }
            }
            return Ok(());
        }
        other => bail!("unknown command '{other}'"),
    };

    driver.flush().await;
    if writes(command, &report) {
        save_store(&store, &store_path).await?;
    }
    print_report(&report, args.get_flag("json"))?;
    if report.status.needs_sync() {
        std::process::exit(2);
    }
    Ok(())
}

fn project(args: &ArgMatches) -> Result<&HierarchyPath> {
    args.get_one::<HierarchyPath>("project")
        .context("a project path is required")
}

fn paths(args: &ArgMatches, name: &str) -> Vec<HierarchyPath> {
    args.get_many::<HierarchyPath>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn writes(command: &str, report: &SyncReport) -> bool {
    command != "check" && !matches!(report.status, SyncStatus::MigrationNeeded | SyncStatus::UnknownInitials)
}

fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

async fn watch(scanner: SyncScanner<MemoryStore>) -> Result<()> {
    let (shutdown, receiver) = tokio::sync::watch::channel(false);
    let handle = scanner.spawn(receiver);
    tokio::signal::ctrl_c().await.context("waiting for interrupt")?;
    info!("interrupt received, stopping scanner");
    shutdown.send(true).ok();
    tokio::time::timeout(Duration::from_secs(30), handle)
        .await
        .context("scanner did not stop")??;
    Ok(())
}

async fn load_store(path: &Path) -> Result<MemoryStore> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(MemoryStore::from_snapshot(snapshot)?)
}

async fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.to_snapshot())?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replacing {}", path.display()))?;
    info!(path = %path.display(), "saved hierarchy");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_takes_explicit_paths() {
        let matches = cli()
            .try_get_matches_from([
                "wbs-sync", "--store", "s.json", "approve", "/Proj", "--delete", "/Proj/A", "--delete", "/Proj/B",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "approve");
        assert_eq!(paths(args, "delete").len(), 2);
        assert!(paths(args, "complete").is_empty());
    }

    #[test]
    fn all_conflicts_with_explicit_paths() {
        assert!(cli()
            .try_get_matches_from(["wbs-sync", "approve", "/Proj", "--all", "--delete", "/Proj/A"])
            .is_err());
    }
}
