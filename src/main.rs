//! Duplicate Record Checker CLI
//!
//! Checks a data file of fixed-width records (6-byte `AAA000`-style code
//! plus 2 trailing bytes per record) for duplicate codes, using N
//! parallel workers over a shared perfect-hash owner table.
//!
//! # Output Format
//!
//! The verdict goes to stdout: `duplicates found (key=ABC123)` or
//! `no duplicates`.
//!
//! Statistics are written to stderr upon completion:
//! `records=N workers=N policy=P duplicate=B elapsed_ms=N throughput_mib_s=N`
//!
//! # Exit Codes
//!
//! - `0`: Check completed, no duplicates
//! - `1`: Check completed, duplicates found
//! - `2`: Invalid arguments, unreadable input, or check failure

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use dupscan_rs::{find_duplicates, Config, InputFile, MAX_WORKERS};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <path>

OPTIONS:
    --workers=<N>   Number of parallel workers, 1..={} (default: 8)
    --lazy          Defer all duplicate detection to the verify phase
                    (default: abort a worker early on a proven duplicate)
    --help, -h      Show this help message",
        exe.to_string_lossy(),
        MAX_WORKERS
    );
}

fn main() -> ExitCode {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "dupscan".into());
    let mut path: Option<PathBuf> = None;
    let mut config = Config::default();

    for arg in args {
        if let Some(flag) = arg.to_str() {
            if let Some(value) = flag.strip_prefix("--workers=") {
                match value.parse::<usize>() {
                    Ok(n) if (1..=MAX_WORKERS).contains(&n) => config.worker_count = n,
                    _ => {
                        eprintln!("invalid --workers value: {value}");
                        return ExitCode::from(2);
                    }
                }
                continue;
            }
            match flag {
                "--lazy" => {
                    config.strict_intra_partition_check = false;
                    continue;
                }
                "--help" | "-h" => {
                    print_usage(&exe);
                    return ExitCode::SUCCESS;
                }
                _ if flag.starts_with("--") => {
                    eprintln!("unknown option: {flag}");
                    print_usage(&exe);
                    return ExitCode::from(2);
                }
                _ => {}
            }
        }
        if path.replace(PathBuf::from(&arg)).is_some() {
            eprintln!("multiple input paths given");
            print_usage(&exe);
            return ExitCode::from(2);
        }
    }

    let Some(path) = path else {
        eprintln!("no input file given");
        print_usage(&exe);
        return ExitCode::from(2);
    };

    let input = match InputFile::open(&path) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("dupscan: {}: {err}", path.display());
            return ExitCode::from(2);
        }
    };

    let start = Instant::now();
    let outcome = match find_duplicates(input.bytes(), &config) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("dupscan: {err}");
            return ExitCode::from(2);
        }
    };
    let elapsed = start.elapsed();

    match outcome.first_duplicate {
        Some(code) => println!("duplicates found (key={})", String::from_utf8_lossy(&code)),
        None if outcome.duplicate_found => println!("duplicates found"),
        None => println!("no duplicates"),
    }

    let bytes = input.bytes().len();
    let elapsed_ms = elapsed.as_millis();
    let throughput = if elapsed.as_secs_f64() > 0.0 {
        bytes as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64()
    } else {
        0.0
    };
    eprintln!(
        "records={} workers={} policy={} duplicate={} elapsed_ms={} throughput_mib_s={:.1}",
        bytes / dupscan_rs::key::RECORD_WIDTH,
        config.worker_count,
        if config.strict_intra_partition_check {
            "strict"
        } else {
            "lazy"
        },
        outcome.duplicate_found,
        elapsed_ms,
        throughput
    );

    if outcome.duplicate_found {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
