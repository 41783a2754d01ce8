// Desktop tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod flash;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// Cross target for the STM32F103C8 (Cortex-M3, no FPU).
pub const TARGET: &str = "thumbv7m-none-eabi";

/// probe-rs chip name.
pub const CHIP: &str = "STM32F103C8";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Pneumatic rig controller development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flash firmware to the STM32F103 via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
    },
    /// Check the hardware build, no_std library builds, clippy and formatting
    Check,
    /// Run host tests (unit, integration, doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("{}", platform::config::banner().dimmed());

    match cli.command {
        Commands::Flash { release } => flash::run(release),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}

/// Run `cargo <args>` and capture its output.
pub fn cargo(args: &[&str]) -> Result<Output> {
    Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))
}

/// Run one cargo step with progress output.
///
/// A failing required step aborts with its stderr; a failing optional step is
/// reported as a warning.
pub fn step(label: &str, args: &[&str], required: bool) -> Result<Output> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();
    let output = cargo(args)?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
    } else if required {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{label} failed");
    } else {
        eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
    }
    println!();
    Ok(output)
}
