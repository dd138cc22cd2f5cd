//! @dose
//! purpose: This module implements the render command: load a package snapshot, run pass
//!     one (reconcile + index) and pass two (token tree), then write the review file as
//!     JSON or a plain-text preview.
//!
//! when-editing:
//!     - !Pass two only starts after pass one finished without a collision
//!     - !Config package values override the snapshot header field by field
//!     - Output goes to stdout unless --output is given
//!
//! invariants:
//!     - The written tree has passed validate_line_ids
//!     - Nothing is written when any fatal error occurs
//!
//! flows:
//!     - Load: snapshot + config
//!     - Build: reconcile_package -> TokenTreeBuilder::render -> CodeFile
//!     - Write: serialize -> stdout or file

use crate::cli::{OutputFormat, RenderArgs};
use crate::config::Config;
use crate::formatter::{render_lines, TokenTreeBuilder};
use crate::reconcile::reconcile_package;
use crate::types::{CodeFile, PackageSnapshot};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub fn run_render(args: &RenderArgs, config_path: Option<&Path>) -> Result<()> {
    let snapshot = PackageSnapshot::load(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    let config = Config::discover(&args.snapshot, config_path).context("Failed to load config")?;

    let code_file = build_code_file(&snapshot, &config)?;
    let output = match args.format {
        OutputFormat::Json => code_file
            .to_json(args.pretty)
            .context("Failed to serialize review file")?,
        OutputFormat::Text => render_lines(&code_file.review_lines),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote review file");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.ends_with('\n') {
                writeln!(stdout).context("Failed to write to stdout")?;
            }
        }
    }
    Ok(())
}

/// Run both passes over `snapshot` and assemble the review file.
pub fn build_code_file(snapshot: &PackageSnapshot, config: &Config) -> Result<CodeFile> {
    let package = reconcile_package(snapshot).context("Failed to reconcile declarations")?;

    let options = config.render_options();
    let lines = TokenTreeBuilder::new(&package.index, &options)
        .render(&package.modules)
        .context("Failed to render review tree")?;

    let name = config
        .package
        .name
        .clone()
        .unwrap_or_else(|| snapshot.package_name.clone());
    let version = config
        .package
        .version
        .clone()
        .unwrap_or_else(|| snapshot.package_version.clone());

    let mut code_file = CodeFile::new(name, version, lines);
    code_file.cross_language_package_id = config.package.cross_language_package_id.clone();
    info!(
        package = %code_file.package_name,
        lines = code_file.review_lines.len(),
        "rendered package"
    );
    Ok(code_file)
}
