//! Subcommand implementations
//!
//! Each command writes its report to `out` so it can be captured in tests.

use crate::snapshot::Snapshot;
use agm_asset::AssetPath;
use agm_core::{AgmConfig, PromotionReport, Session};
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

/// Options for `agm diff`
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Only this path; every differing path when absent
    pub path: Option<AssetPath>,
}

/// Options for `agm promote`
#[derive(Debug, Clone)]
pub struct PromoteOptions {
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Round cap override
    pub rounds: Option<usize>,
    /// Print the report as JSON
    pub json: bool,
    /// Write the promoted snapshot here
    pub output: Option<PathBuf>,
}

/// Print comparison trees; returns whether anything drifted
///
/// # Errors
/// Fails if the snapshot cannot be loaded or output cannot be written
pub fn diff(config: AgmConfig, options: &DiffOptions, out: &mut dyn Write) -> anyhow::Result<bool> {
    let snapshot = Snapshot::load(&options.snapshot)
        .with_context(|| format!("loading snapshot {}", options.snapshot.display()))?;
    let (stores, _) = snapshot.into_stores()?;
    let mut session = Session::open(stores, config)?;

    let drifted = match &options.path {
        Some(path) => {
            let tree = session.diff(path);
            write!(out, "{tree}")?;
            tree.has_drift()
        }
        None => {
            let report = session.diff_all();
            for tree in &report.drifted {
                write!(out, "{tree}")?;
            }
            writeln!(
                out,
                "{} of {} paths differ",
                report.drifted.len(),
                report.checked
            )?;
            !report.is_clean()
        }
    };
    Ok(drifted)
}

/// Run promotion over a snapshot and print the report
///
/// # Errors
/// Fails if the snapshot cannot be loaded, facts cannot be derived, or
/// output cannot be written
pub fn promote(
    mut config: AgmConfig,
    options: &PromoteOptions,
    out: &mut dyn Write,
) -> anyhow::Result<PromotionReport> {
    if let Some(rounds) = options.rounds {
        config = config.with_max_rounds(rounds);
    }
    let snapshot = Snapshot::load(&options.snapshot)
        .with_context(|| format!("loading snapshot {}", options.snapshot.display()))?;
    let mut graph = snapshot.graph()?;
    let (stores, assets) = snapshot.into_stores()?;
    let mut session = Session::open(stores, config)?;

    let report = session.promote(&mut graph)?;

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        write_report(&report, out)?;
    }

    if let Some(output) = &options.output {
        let assets = assets
            .into_iter()
            .map(|mut asset| {
                if let Some(group) = graph.group_of(&asset.guid) {
                    asset.group = Some(group.name().to_string());
                }
                asset
            })
            .collect();
        Snapshot::from_stores(session.finish(), assets)
            .save(output)
            .with_context(|| format!("writing snapshot {}", output.display()))?;
    }
    Ok(report)
}

fn write_report(report: &PromotionReport, out: &mut dyn Write) -> std::io::Result<()> {
    for promotion in &report.promotions {
        let labels: Vec<_> = promotion.labels.iter().map(String::as_str).collect();
        writeln!(
            out,
            "round {}: {} -> {} as {:?} [{}]",
            promotion.round,
            promotion.path,
            promotion.group.name(),
            promotion.address,
            labels.join(", ")
        )?;
    }
    for skip in &report.skipped {
        writeln!(out, "round {}: skipped {}: {}", skip.round, skip.path, skip.reason)?;
    }
    let outcome = if report.converged() {
        "converged"
    } else {
        "stopped at round cap"
    };
    writeln!(
        out,
        "{} promoted, {} skipped, {} rounds, {outcome}",
        report.promotions.len(),
        report.skipped.len(),
        report.rounds
    )
}
