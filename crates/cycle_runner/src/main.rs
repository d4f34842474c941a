//! Cycle Runner CLI
//!
//! 전투 리포트 배치 → 정산 → 아카이브 커맨드라인 도구
//! 시드 데모 사이클 생성, 아카이브 검사, 중계 재생 지원

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::collections::HashMap;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "cycle_runner")]
#[command(about = "Settle battle cycles and inspect cycle archives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Settle a cycle input file into an archive
    Settle {
        /// Input cycle JSON file path
        #[arg(long)]
        r#in: PathBuf,

        /// Output archive file path (.orla)
        #[arg(long)]
        out: PathBuf,

        /// Output ledger snapshot JSON file
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Verify archive after writing
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Narrate settled battles as broadcast commentary
        #[arg(long, default_value = "false")]
        narrate: bool,

        /// Commentary locale (e.g., "en-US", "ko")
        #[arg(long, default_value = "en-US")]
        locale: String,
    },

    /// Generate, settle and narrate a seeded demo cycle
    Demo {
        /// RNG seed (same seed reproduces the same cycle)
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Cycle number stamped on every battle
        #[arg(long, default_value = "1")]
        cycle: u32,

        /// Scenario shape YAML (defaults to the embedded standard cycle)
        #[arg(long)]
        shape: Option<PathBuf>,

        /// Output archive file path (.orla)
        #[arg(long)]
        out: PathBuf,

        /// Commentary locale (e.g., "en-US", "ko")
        #[arg(long, default_value = "en-US")]
        locale: String,

        /// Verify archive after writing
        #[arg(long, default_value = "false")]
        verify: bool,
    },

    /// Inspect a cycle archive
    Inspect {
        /// Archive file path (.orla)
        #[arg(long)]
        archive: PathBuf,

        /// Replay archived battles as commentary (robots shown by id)
        #[arg(long, default_value = "false")]
        narrate: bool,

        /// Commentary locale (e.g., "en-US", "ko")
        #[arg(long, default_value = "en-US")]
        locale: String,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Settle { r#in, out, ledger, verify, narrate, locale } => {
            println!("🔧 Settling cycle input...");
            println!("   Input:   {}", r#in.display());
            println!("   Archive: {}", out.display());

            let input = cycle_runner::read_input(&r#in)?;
            let report = cycle_runner::settle_input(&input, &out, ledger.as_deref())?;

            print_run_report(&report);

            if let Some(ledger_path) = ledger {
                println!("\n📄 Ledger snapshot saved to: {}", ledger_path.display());
            }

            if verify {
                verify_archive_consistency(&out, &report)?;
            }

            if narrate {
                let archive = cycle_runner::load_archive(&out)?;
                let names = cycle_runner::roster_names(&input);
                let lines = cycle_runner::narrate_cycle(
                    &archive,
                    &names,
                    &[locale],
                    u64::from(report.cycle_number),
                )?;
                print_commentary(&lines);
            }
        }

        Commands::Demo { seed, cycle, shape, out, locale, verify } => {
            println!("🤖 Generating demo cycle...");
            println!("   Seed:    {}", seed);
            println!("   Cycle:   {}", cycle);
            if let Some(shape_path) = &shape {
                println!("   Shape:   {}", shape_path.display());
            }

            let input = cycle_runner::demo_input(seed, cycle, shape.as_deref())?;
            println!(
                "   Roster:  {} robots across {} stables, {} battles",
                input.robots.len(),
                input.stables.len(),
                input.reports.len()
            );

            let report = cycle_runner::settle_input(&input, &out, None)?;
            print_run_report(&report);

            if verify {
                verify_archive_consistency(&out, &report)?;
            }

            let archive = cycle_runner::load_archive(&out)?;
            let names = cycle_runner::roster_names(&input);
            let lines = cycle_runner::narrate_cycle(&archive, &names, &[locale], seed)?;
            print_commentary(&lines);
        }

        Commands::Inspect { archive, narrate, locale } => {
            println!("🔍 Inspecting archive...");
            println!("   Path: {}", archive.display());

            let cycle_archive = cycle_runner::load_archive(&archive)?;
            print_archive_digest(&cycle_archive);

            if narrate {
                let lines = cycle_runner::narrate_cycle(
                    &cycle_archive,
                    &HashMap::new(),
                    &[locale],
                    u64::from(cycle_archive.cycle_number),
                )?;
                print_commentary(&lines);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_run_report(report: &cycle_runner::RunReport) {
    println!("\n✅ Cycle {} settled successfully!", report.cycle_number);
    println!("   Scheduled:    {} battles", report.scheduled);
    println!("   Settled:      {}", report.settled);
    println!("   Failed:       {}", report.failed);
    println!("   Revenue paid: {} credits", report.total_revenue_paid);
    println!("   Ledger rows:  {}", report.ledger_rows);
    println!("   Audit events: {}", report.audit_events);
    println!(
        "   Archive size: {} bytes ({:.2} KB)",
        report.archive_size,
        report.archive_size as f64 / 1024.0
    );
    println!("   Created:      {}", report.created_at);

    if report.failed > 0 {
        println!(
            "\n⚠️  {} battles failed to settle; details are in the archive summary",
            report.failed
        );
    }
}

#[cfg(feature = "cli")]
fn verify_archive_consistency(
    archive_path: &std::path::Path,
    report: &cycle_runner::RunReport,
) -> Result<()> {
    println!("\n🔍 Verifying archive...");
    let archive = cycle_runner::load_archive(archive_path)?;

    if archive.cycle_number == report.cycle_number
        && archive.summary.settled == report.settled
        && archive.events.len() == report.audit_events
    {
        println!("✅ Archive verification passed");
        Ok(())
    } else {
        anyhow::bail!("❌ Archive verification failed - summary mismatch!")
    }
}

#[cfg(feature = "cli")]
fn print_archive_digest(archive: &cycle_runner::CycleArchive) {
    let summary = &archive.summary;
    println!("\n📦 Archive loaded (checksum ok)");
    println!("   Format version: {}", archive.version);
    println!("   Cycle:          {}", archive.cycle_number);
    println!("   Written at:     {}", written_at(archive.timestamp));
    println!("   Audit events:   {}", archive.events.len());
    println!(
        "   Battles:        {} settled, {} failed of {} scheduled",
        summary.settled, summary.failed, summary.scheduled
    );
    println!(
        "   Outcomes:       {} decisive, {} draws, {} byes",
        summary.decisive, summary.draws, summary.byes
    );
    println!("   Ledger rows:    {}", archive.ledger_rows.len());
    println!("   Revenue paid:   {} credits", summary.total_revenue_paid);

    for failure in &summary.failures {
        println!("   ⚠️  Battle {}: {}", failure.battle_id, failure.error);
    }
}

#[cfg(feature = "cli")]
fn print_commentary(lines: &[String]) {
    println!("\n📣 Broadcast commentary");
    for line in lines {
        println!("   {}", line);
    }
}

#[cfg(feature = "cli")]
fn written_at(timestamp_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|written| written.to_rfc3339())
        .unwrap_or_else(|| format!("{} ms", timestamp_ms))
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("cycle_runner CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
