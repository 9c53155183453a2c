//! Minimal program that unlocks every PDF passed on the command line with the
//! same password.
//!
//! Usage:
//!   cargo run --example unlock_file -- <password> a.pdf [b.pdf ...]

use unlockpdf::{unlocked_file_name, UnlockError, UnlockPipeline};
use std::path::Path;
use std::{env, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <password> <pdf_file>...", args[0]);
        process::exit(1);
    }

    let password = &args[1];
    let pipeline = UnlockPipeline::new();
    let mut failures = 0;

    for input in &args[2..] {
        println!("\n  {input}");

        let bytes = match std::fs::read(input) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("    ✗ Cannot read: {e}");
                failures += 1;
                continue;
            }
        };

        match pipeline.run(&bytes, password) {
            Ok(unlocked) => {
                let name = Path::new(input)
                    .file_name()
                    .map(|n| unlocked_file_name(&n.to_string_lossy()))
                    .unwrap_or_else(|| "unlocked.pdf".into());
                let dest = Path::new(input).with_file_name(name);

                println!("    {}", unlocked.report.outcome);
                println!("    Pages : {}", unlocked.report.pages);
                match unlocked.save_to_disk(&dest) {
                    Ok(()) => println!("    ✓ Saved to {}", dest.display()),
                    Err(e) => {
                        eprintln!("    ✗ Save failed: {e}");
                        failures += 1;
                    }
                }
            }
            Err(UnlockError::IncorrectPassword) => {
                println!("    ⚠ Wrong password, skipped");
                failures += 1;
            }
            Err(e) => {
                eprintln!("    ✗ {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        process::exit(1);
    }
}
