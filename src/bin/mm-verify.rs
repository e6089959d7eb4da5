//! CLI front-end: load a `.mm` database from disk, verify every provable,
//! and report the outcome (spec §6).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mm_verifier::database::{Database, DbOptions};
use mm_verifier::{Diagnostic, MmError, ProofOutcome};

/// Verify a Metamath (`.mm`) database.
#[derive(Parser, Debug)]
#[command(name = "mm-verify", version, about)]
struct Args {
    /// Path to the root `.mm` file to load.
    path: PathBuf,

    /// Number of worker threads to use while verifying proofs.
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Print timing information for each pass.
    #[arg(long)]
    timing: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let options = DbOptions {
        timing: args.timing,
        jobs: args.jobs,
    };
    let mut db = Database::new(options);

    if let Err(e) = db.parse(&args.path) {
        report(&e);
        return ExitCode::FAILURE;
    }

    let result = db.verify_pass();
    let mut had_failure = false;
    for label in db.provables() {
        let name = String::from_utf8_lossy(db.nameset().atom_name(label)).into_owned();
        match result.outcome(label) {
            Some(ProofOutcome::Verified) | None => {}
            Some(ProofOutcome::Incomplete) => {
                eprintln!("warning: proof for '{name}' is incomplete");
            }
            Some(ProofOutcome::Failed(e)) => {
                had_failure = true;
                eprintln!("error: {e}");
            }
        }
    }

    if had_failure {
        ExitCode::FAILURE
    } else {
        log::info!("verified {} provable(s)", db.provables().count());
        ExitCode::SUCCESS
    }
}

fn report(err: &MmError) {
    eprintln!("{}", Diagnostic(err));
}
