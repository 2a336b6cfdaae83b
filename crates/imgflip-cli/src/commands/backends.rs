//! Backends command

use anyhow::Result;
use tracing::debug;

use imgflip_compute::{describe_backends, select_best_backend};

use crate::Globals;

pub fn run(globals: &Globals) -> Result<()> {
    debug!(verbose = globals.verbose, "probing backends");
    println!("Compute backends:");
    println!("{}", describe_backends());
    println!("Selected (auto): {}", select_best_backend());
    Ok(())
}
