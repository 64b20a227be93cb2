//! Argument parsing and dispatch

use crate::commands::{self, DiffOptions, PromoteOptions};
use crate::logging::{self, LogFormat};
use agm_asset::AssetPath;
use agm_core::AgmConfig;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::PathBuf;

/// Build the `agm` command
#[must_use]
pub fn command() -> Command {
    Command::new("agm")
        .version(agm_core::VERSION)
        .about("Asset group metadata: duplicate-root promotion and store reconciliation")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare simulated, sidecar and live metadata")
                .arg(snapshot_arg())
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(AssetPath))
                        .help("Only show this asset path"),
                ),
        )
        .subcommand(
            Command::new("promote")
                .about("Promote duplicate roots into selected groups")
                .arg(snapshot_arg())
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .value_parser(value_parser!(usize))
                        .help("Round cap (clamped to 1..=10)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the promoted snapshot to this file"),
                ),
        )
}

fn snapshot_arg() -> Arg {
    Arg::new("snapshot")
        .long("snapshot")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Snapshot JSON file")
}

/// Load the configuration named by `--config`, or the default
///
/// # Errors
/// Fails if the file cannot be read or is invalid
pub fn load_config(matches: &ArgMatches) -> anyhow::Result<AgmConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => AgmConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AgmConfig::default()),
    }
}

/// Install logging as requested by the global flags
pub fn init_logging(matches: &ArgMatches, config: &AgmConfig) {
    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init(matches.get_count("verbose"), &config.logging.filter, format);
}

/// Run the selected subcommand; returns whether it succeeded
///
/// `diff` fails when anything drifted. `promote` fails when the round cap
/// stopped it.
///
/// # Errors
/// Propagates the subcommand's failure
pub fn dispatch(matches: &ArgMatches, config: AgmConfig, out: &mut dyn Write) -> anyhow::Result<bool> {
    match matches.subcommand() {
        Some(("diff", args)) => {
            let options = DiffOptions {
                snapshot: required_path(args, "snapshot")?,
                path: args.get_one::<AssetPath>("path").cloned(),
            };
            let drifted = commands::diff(config, &options, out)?;
            Ok(!drifted)
        }
        Some(("promote", args)) => {
            let options = PromoteOptions {
                snapshot: required_path(args, "snapshot")?,
                rounds: args.get_one::<usize>("rounds").copied(),
                json: args.get_flag("json"),
                output: args.get_one::<PathBuf>("output").cloned(),
            };
            let report = commands::promote(config, &options, out)?;
            Ok(report.converged())
        }
        Some((other, _)) => anyhow::bail!("unknown subcommand {other}"),
        None => anyhow::bail!("no subcommand given"),
    }
}

fn required_path(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("--{name} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let matches = command()
            .try_get_matches_from(["agm", "promote", "--snapshot", "s.json", "-vv", "--rounds", "3"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "promote");
        assert_eq!(args.get_one::<usize>("rounds"), Some(&3));
        assert!(!args.get_flag("json"));
    }

    #[test]
    fn diff_requires_snapshot() {
        assert!(command().try_get_matches_from(["agm", "diff"]).is_err());
    }

    #[test]
    fn bad_asset_path_is_rejected() {
        assert!(command()
            .try_get_matches_from(["agm", "diff", "--snapshot", "s.json", "--path", ""])
            .is_err());
    }
}
