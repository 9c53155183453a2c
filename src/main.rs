//! CLI tool for removing the open password from a PDF document.
//!
//! This binary reads a file, runs it through the unlockpdf pipeline and writes
//! the unprotected copy next to it (or to the given output path).

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use unlockpdf::{unlocked_file_name, Result, UnlockConfig, UnlockPipeline, MIB};

#[derive(Parser, Debug)]
#[command(
    name = "unlockpdf",
    version,
    about = "Remove password protection from a PDF when you know the password"
)]
struct Args {
    /// Path to the password-protected PDF
    input: PathBuf,

    /// Where to write the unlocked copy (default: "<input> - unlocked.pdf")
    output: Option<PathBuf>,

    /// The user or owner password (case-sensitive)
    #[arg(short, long, env = "UNLOCKPDF_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Refuse inputs larger than this many MiB
    #[arg(long, default_value_t = 150)]
    max_size_mb: usize,

    /// Warn about inputs larger than this many MiB
    #[arg(long, default_value_t = 80)]
    warn_size_mb: usize,

    /// Do not copy title, author and other document metadata
    #[arg(long)]
    no_metadata: bool,

    /// Compress streams in the unlocked copy
    #[arg(long)]
    compress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => println!("\n✅ Done!"),
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    println!("🔍 Unlocking PDF: {}", args.input.display());
    println!("📁 Output file: {}", output.display());
    println!("{}", "─".repeat(60));

    let config = UnlockConfig {
        copy_metadata: !args.no_metadata,
        compress_output: args.compress,
        ..Default::default()
    }
    .with_size_limits_mib(args.max_size_mb, args.warn_size_mb);

    let bytes = std::fs::read(&args.input)?;
    println!("📏 Input size: {}", format_bytes(bytes.len()));

    let unlocked = UnlockPipeline::with_config(config).run(&bytes, &args.password)?;
    unlocked.save_to_disk(&output)?;

    let report = &unlocked.report;
    println!("🔓 {}", report.outcome.describe());
    println!("📄 Pages: {}", report.pages);
    println!("📏 Output size: {}", format_bytes(report.output_bytes));
    if !report.metadata_copied {
        println!("⚠️  Document metadata could not be copied");
    }
    println!("⏱️  Elapsed: {:.2?}", report.elapsed);
    println!("💾 Saved to: {}", output.display());

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    input.with_file_name(unlocked_file_name(&name))
}

/// Sizes in the same binary units as `--max-size-mb`.
fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    if bytes < MIB {
        return format!("{:.1} KiB", bytes as f64 / 1024.0);
    }
    format!("{:.1} MiB", bytes as f64 / MIB as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(150 * MIB), "150.0 MiB");
    }

    #[test]
    fn default_output_sits_next_to_input() {
        let out = default_output_path(Path::new("/tmp/in/statement.pdf"));
        assert_eq!(out, PathBuf::from("/tmp/in/statement - unlocked.pdf"));
    }
}
