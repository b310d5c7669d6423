//! Unveil CLI
//!
//! Simulate and check scroll reveals for page descriptions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use unveil_reveal::RevealConfig;

mod config;
mod simulate;

use config::PageConfig;
use simulate::{SimulationOptions, SimulationReport};

#[derive(Parser)]
#[command(name = "unveil")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unveil scroll reveal CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll through a page and log every reveal
    Simulate {
        /// Page description (TOML)
        page: PathBuf,

        /// Viewport height in pixels
        #[arg(long, default_value = "800")]
        viewport_height: f32,

        /// Pixels scrolled per frame
        #[arg(long, default_value = "40")]
        scroll_step: f32,

        /// Frame interval in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },

    /// Validate every section's reveal configuration
    Check {
        /// Page description (TOML)
        page: PathBuf,
    },

    /// Show the default reveal configuration
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            page,
            viewport_height,
            scroll_step,
            frame_ms,
        } => cmd_simulate(
            &page,
            SimulationOptions {
                viewport_height,
                scroll_step,
                frame_ms,
            },
        ),

        Commands::Check { page } => cmd_check(&page),

        Commands::Info => cmd_info(),
    }
}

fn cmd_simulate(path: &Path, options: SimulationOptions) -> Result<()> {
    let page = PageConfig::load(path)?;

    info!(
        "Simulating {} ({} sections, {}px tall) with a {}px viewport",
        page.page.name,
        page.sections.len(),
        page.total_height(),
        options.viewport_height
    );

    let report = simulate::simulate(&page, &options)?;
    for record in &report.records {
        debug!(
            "{:>7}ms  {:<20} {:?} -> {:?}",
            record.at.as_millis(),
            record.label,
            record.from,
            record.to
        );
    }
    print_report(&report);

    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let page = PageConfig::load(path)?;

    info!("Checking page: {}", page.page.name);

    let mut invalid = 0;
    for section in &page.sections {
        match section.reveal_config(&page.defaults) {
            Ok(config) => info!(
                "  {:<16} threshold {:<4} margin {:<20} step {}ms",
                section.id,
                config.threshold(),
                config.root_margin().to_string(),
                config.cascade().step_ms()
            ),
            Err(err) => {
                error!("  {:<16} {}", section.id, err);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} section(s) have an invalid reveal config", invalid);
    }

    info!("All {} sections OK", page.sections.len());
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("Unveil Scroll Reveals");
    println!("=====================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Default reveal config:");
    println!();
    let defaults = toml::to_string(&RevealConfig::default())?;
    for line in defaults.lines() {
        println!("  {}", line);
    }
    println!();
    println!("Entrance presets: fade-in, fade-up, slide-in, scale-in, instant");
    println!("Stagger directions: forward, reverse, from-center");

    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!();
    println!("Page: {}", report.page);
    println!(
        "Frames: {}  scroll ended at {}ms, last reveal at {}ms, {} observer(s)",
        report.frames,
        report.scroll_end.as_millis(),
        report.finished.as_millis(),
        report.observers
    );
    println!();
    println!(
        "{:<16} {:>8} {:>8} {:>10} {:>10} {:>8}  counters",
        "section", "elements", "revealed", "first", "last", "settled"
    );
    println!("{}", "-".repeat(80));

    for section in &report.sections {
        let counters = section
            .counters
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<16} {:>8} {:>8} {:>10} {:>10} {:>8}  {}",
            section.id,
            section.elements,
            section.revealed,
            format_time(section.first_reveal),
            format_time(section.last_reveal),
            section.settled,
            counters
        );
    }

    println!();
    println!("{} of {} elements revealed", report.revealed(), report.elements());
}

fn format_time(time: Option<Duration>) -> String {
    match time {
        Some(t) => format!("{}ms", t.as_millis()),
        None => "-".to_string(),
    }
}
