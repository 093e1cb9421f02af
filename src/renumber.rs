//! Directory renumbering: produce the `{n}.{ext}` layout discovery expects.
//!
//! Two operations share one executor:
//! - numbering: files not yet named `<digits>.<ext>` continue the sequence
//!   after the highest existing number;
//! - ordering: files listed in an `order.json` become `1.ext, 2.ext, ...`
//!   in list order.
//!
//! Renames run in two passes through temporary names so that a target name
//! held by another file in the same plan never gets clobbered.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;

use crate::manifest::is_image_name;

/// Staging prefix for `number` renames.
pub const NUMBER_TEMP_PREFIX: &str = "_temp_number_";
/// Staging prefix for `apply-order` renames.
pub const ORDER_TEMP_PREFIX: &str = "_temp_reorder_";

/// Whether `name` is a staging file left behind by an interrupted run.
fn is_staging_name(name: &str) -> bool {
    name.starts_with(NUMBER_TEMP_PREFIX) || name.starts_with(ORDER_TEMP_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl Rename {
    pub fn from_name(&self) -> String {
        file_name(&self.from)
    }

    pub fn to_name(&self) -> String {
        file_name(&self.to)
    }
}

fn file_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lowercased extension, empty if none.
fn ext_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// `Some(n)` if `name` is `<digits>.<ext>`.
pub fn numbered(name: &str) -> Option<u32> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Accepted confirmation answers.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "oui" | "o" | "yes" | "y"
    )
}

fn image_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_staging_name(&name) {
            warn!("number: {name} looks like a leftover staging file, skipped");
            continue;
        }
        if is_image_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct NumberingPlan {
    pub already_numbered: usize,
    pub next_number: u32,
    pub renames: Vec<Rename>,
}

/// Plan numbering for every unnumbered image in `dir`, sorted by name.
pub fn plan_numbering(dir: &Path) -> Result<NumberingPlan> {
    let names = image_names(dir)?;
    let (numbered_names, unnumbered): (Vec<&String>, Vec<&String>) =
        names.iter().partition(|n| numbered(n).is_some());
    let max = numbered_names.iter().filter_map(|n| numbered(n)).max();
    let next_number = max.map_or(1, |m| m + 1);

    let renames = unnumbered
        .iter()
        .enumerate()
        .map(|(i, name)| Rename {
            from: dir.join(name),
            to: dir.join(format!("{}.{}", next_number + i as u32, ext_of(name))),
        })
        .collect();

    Ok(NumberingPlan {
        already_numbered: numbered_names.len(),
        next_number,
        renames,
    })
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// `order.json` as written by the reordering page.
#[derive(Debug, Deserialize)]
pub struct OrderFile {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

pub fn load_order(path: &Path) -> Result<OrderFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let order: OrderFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(order)
}

#[derive(Debug)]
pub struct OrderPlan {
    pub renames: Vec<Rename>,
    /// Listed names with no file behind them.
    pub missing: Vec<String>,
}

/// Plan renaming `order[i]` to consecutive numbers starting at 1.
///
/// Missing entries and repeats are skipped and do not consume a number, so
/// the result has no gaps. Fails if a target name belongs to a file outside
/// the plan.
pub fn plan_order(dir: &Path, order: &OrderFile) -> Result<OrderPlan> {
    if order.order.is_empty() {
        anyhow::bail!("order file lists no photos");
    }
    let mut renames = Vec::new();
    let mut missing = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for name in &order.order {
        if !seen.insert(name.as_str()) {
            warn!("apply-order: {name} listed more than once, keeping the first");
            continue;
        }
        if is_staging_name(name) {
            warn!("apply-order: {name} looks like a leftover staging file, skipped");
            continue;
        }
        let from = dir.join(name);
        if !from.is_file() {
            warn!("apply-order: {name} does not exist, skipped");
            missing.push(name.clone());
            continue;
        }
        let n = renames.len() + 1;
        renames.push(Rename {
            from,
            to: dir.join(format!("{n}.{}", ext_of(name))),
        });
    }
    if renames.is_empty() {
        anyhow::bail!("none of the listed photos exist in {}", dir.display());
    }

    let sources: HashSet<&Path> = renames.iter().map(|r| r.from.as_path()).collect();
    if let Some(clash) = renames
        .iter()
        .find(|r| r.to.exists() && !sources.contains(r.to.as_path()))
    {
        anyhow::bail!(
            "{} already exists and is not part of the order; refusing to overwrite",
            clash.to.display()
        );
    }
    Ok(OrderPlan { renames, missing })
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: usize,
    pub errors: usize,
}

/// First `{prefix}{n}.{ext}` at or after `*next` that does not exist yet.
fn free_staging_path(dir: &Path, prefix: &str, ext: &str, next: &mut u32) -> PathBuf {
    loop {
        let candidate = dir.join(format!("{prefix}{}.{ext}", *next));
        *next += 1;
        if !candidate.exists() {
            return candidate;
        }
    }
}

/// Two-pass rename: sources → free `{temp_prefix}{n}.{ext}` names → targets.
///
/// Staging names never overwrite an existing file. A failure on one file
/// is counted and logged; the rest continue.
pub fn execute(renames: &[Rename], temp_prefix: &str) -> RenameReport {
    let mut report = RenameReport::default();

    let mut staged = Vec::with_capacity(renames.len());
    let mut next_suffix = 0u32;
    for r in renames {
        let dir = r.from.parent().unwrap_or_else(|| Path::new("."));
        let temp = free_staging_path(dir, temp_prefix, &ext_of(&r.to_name()), &mut next_suffix);
        match std::fs::rename(&r.from, &temp) {
            Ok(()) => {
                debug!("rename pass 1: {} -> {}", r.from_name(), file_name(&temp));
                staged.push((temp, r));
            }
            Err(e) => {
                warn!("rename pass 1: {} failed: {e}", r.from_name());
                report.errors += 1;
            }
        }
    }

    for (temp, r) in staged {
        match std::fs::rename(&temp, &r.to) {
            Ok(()) => {
                debug!("rename pass 2: {} -> {}", r.from_name(), r.to_name());
                report.renamed += 1;
            }
            Err(e) => {
                warn!("rename pass 2: {} failed: {e}", r.from_name());
                report.errors += 1;
            }
        }
    }
    report
}
