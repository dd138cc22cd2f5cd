//! @dose
//! purpose: This module implements the check command. It runs pass one only and reports
//!     how many identity ids were assigned, or the collision that stopped the run.
//!
//! when-editing:
//!     - !Check must never render; it exists to validate ids cheaply before a full render
//!
//! gotchas:
//!     - Non-fatal diagnostics (missing source, malformed docstrings) are logged, not counted

use crate::cli::CheckArgs;
use crate::reconcile::reconcile_package;
use crate::types::PackageSnapshot;
use anyhow::{Context, Result};

pub fn run_check(args: &CheckArgs) -> Result<()> {
    let snapshot = PackageSnapshot::load(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;

    let package = reconcile_package(&snapshot).context("Identity check failed")?;

    println!(
        "{} {}: {} unique ids",
        snapshot.package_name,
        snapshot.package_version,
        package.index.len()
    );
    Ok(())
}
