use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::{step, TARGET};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    step(
        "Hardware firmware (STM32F103C8)",
        &["check", "-p", "firmware", "--target", TARGET, "--features", "hardware"],
        true,
    )?;

    // Library crates must stay no_std for the target.
    for krate in ["platform", "protocol"] {
        step(
            &format!("{krate} crate (no_std)"),
            &["check", "-p", krate, "--target", TARGET, "--no-default-features"],
            true,
        )?;
    }

    step(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        false,
    )?;

    let fmt = step("Formatting", &["fmt", "--all", "--check"], false)?;
    if !fmt.status.success() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
