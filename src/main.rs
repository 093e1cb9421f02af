use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use photowall::config::{self, Config};
use photowall::discovery::{self, StopReason};
use photowall::manifest;
use photowall::probe;
use photowall::renumber::{self, Rename, RenameReport};
use photowall::resource::Base;

/// Renames shown before asking for confirmation.
const PREVIEW_LIMIT: usize = 10;

#[derive(Parser)]
#[command(
    name = "photowall",
    about = "Discover numbered photos and browse them as a masonry wall"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Image directory or URL prefix (viewer mode)
    base: Option<String>,

    /// Image file extension probed during discovery
    #[arg(long, global = true)]
    ext: Option<String>,

    /// Indices probed concurrently per batch
    #[arg(long, global = true)]
    batch_size: Option<u32>,

    /// Consecutive misses that end discovery
    #[arg(long, global = true)]
    max_failures: Option<u32>,

    /// Log output file path (enables logging when specified)
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run discovery and print the location of every image found
    Discover {
        /// Image directory or URL prefix
        base: Option<String>,
    },

    /// Rewrite the hardcoded image list in a gallery script
    UpdateList {
        /// Image directory to scan
        dir: PathBuf,

        /// Script carrying the marker-delimited list
        #[arg(long, default_value = "script.js")]
        source: PathBuf,
    },

    /// Give unnumbered photos the next free numbers
    Number {
        /// Photo directory
        dir: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Renumber photos following an order.json file
    ApplyOrder {
        /// Photo directory
        dir: PathBuf,

        /// Order file (defaults to <DIR>/order.json)
        #[arg(long)]
        order: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        let file = match std::fs::File::create(log_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    } else if cli.command.is_some() {
        env_logger::init();
    }
    // viewer mode + no --log → logger not initialized (no log output)

    // Load config file and merge CLI overrides
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let base = match &cli.command {
        Some(Command::Discover { base }) => base.clone(),
        _ => cli.base.clone(),
    };
    cfg.merge_cli(config::CliOverrides {
        base,
        ext: cli.ext,
        batch_size: cli.batch_size,
        max_failures: cli.max_failures,
    });

    let config = cfg.resolve();

    let result = match cli.command {
        Some(Command::Discover { .. }) => cmd_discover(&config),
        Some(Command::UpdateList { dir, source }) => cmd_update_list(&dir, &source),
        Some(Command::Number { dir, yes }) => cmd_number(&dir, yes),
        Some(Command::ApplyOrder { dir, order, yes }) => {
            let order = order.unwrap_or_else(|| dir.join("order.json"));
            cmd_apply_order(&dir, &order, yes)
        }
        None => photowall::viewer::run(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_discover(config: &Config) -> Result<()> {
    let base = Base::parse(&config.base);
    let prober = probe::for_base(&base, config.discovery.probe_timeout);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let report = discovery::run(prober.as_ref(), &config.ext, &config.discovery, |id| {
        match writeln!(out, "{}", base.locate(&id)) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                write_error = Some(e);
                ControlFlow::Break(())
            }
        }
    });
    if let Some(e) = write_error {
        // Closed pipe (e.g. `| head`) ends the run quietly.
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(e).context("failed to write to stdout");
        }
    }

    match report.stop {
        StopReason::FailureThreshold { last_index } => eprintln!(
            "discovered {} image(s) in {} ({} probed, stopped after {last_index})",
            report.found,
            base.display_name(),
            report.probed
        ),
        StopReason::Cancelled => eprintln!("discovery cancelled after {} image(s)", report.found),
        StopReason::Exhausted => eprintln!(
            "discovered {} image(s) in {} (index space exhausted)",
            report.found,
            base.display_name()
        ),
    }
    Ok(())
}

fn cmd_update_list(dir: &Path, source: &Path) -> Result<()> {
    let report = manifest::update_image_list(dir, source)?;
    eprintln!(
        "updated {} with {} image(s):",
        report.source.display(),
        report.images.len()
    );
    for name in &report.images {
        eprintln!("  {name}");
    }
    Ok(())
}

fn cmd_number(dir: &Path, yes: bool) -> Result<()> {
    let plan = renumber::plan_numbering(dir)?;
    eprintln!(
        "{} numbered photo(s), {} new photo(s)",
        plan.already_numbered,
        plan.renames.len()
    );
    if plan.renames.is_empty() {
        eprintln!("nothing to number");
        return Ok(());
    }
    eprintln!("new photos start at {}", plan.next_number);
    print_preview(&plan.renames);
    if !yes && !confirm()? {
        eprintln!("cancelled");
        return Ok(());
    }
    let report = renumber::execute(&plan.renames, renumber::NUMBER_TEMP_PREFIX);
    print_report(&report);
    Ok(())
}

fn cmd_apply_order(dir: &Path, order_path: &Path, yes: bool) -> Result<()> {
    let order = renumber::load_order(order_path)?;
    if let Some(ts) = &order.timestamp {
        info!("apply-order: order file timestamp {ts}");
    }
    let plan = renumber::plan_order(dir, &order)?;
    eprintln!(
        "{} photo(s) to reorder, {} listed name(s) missing",
        plan.renames.len(),
        plan.missing.len()
    );
    for name in &plan.missing {
        eprintln!("  missing: {name}");
    }
    print_preview(&plan.renames);
    if !yes && !confirm()? {
        eprintln!("cancelled");
        return Ok(());
    }
    let report = renumber::execute(&plan.renames, renumber::ORDER_TEMP_PREFIX);
    print_report(&report);
    Ok(())
}

fn print_preview(renames: &[Rename]) {
    for r in renames.iter().take(PREVIEW_LIMIT) {
        eprintln!("  {} -> {}", r.from_name(), r.to_name());
    }
    if renames.len() > PREVIEW_LIMIT {
        eprintln!("  ... and {} more", renames.len() - PREVIEW_LIMIT);
    }
}

fn confirm() -> Result<bool> {
    eprint!("proceed? [y/N] ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(renumber::is_affirmative(&answer))
}

fn print_report(report: &RenameReport) {
    eprintln!("{} renamed, {} error(s)", report.renamed, report.errors);
}
