//! Flip command

use anyhow::Result;
use tracing::{debug, info, warn};

use imgflip_compute::FlipExecutor;

use super::{load_config, load_image, make_dispatcher, resolve_modes, save_image};
use crate::{FlipArgs, Globals};

pub fn run(args: FlipArgs, globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    let modes = resolve_modes(&args.select, &config);
    let dispatcher = make_dispatcher(globals, &config)?;

    let image = load_image(&args.input)?;
    let (w, h, c) = image.dimensions();
    debug!(width = w, height = h, channels = c, "loaded {}", args.input.display());

    if modes.is_empty() {
        warn!("no flips enabled, writing input unchanged");
    }

    let flipped = dispatcher.flip(&image, &modes)?;
    debug!(pool = ?dispatcher.pool_stats(), "flip done");

    save_image(&args.output, &flipped)?;

    if globals.verbose > 0 {
        let names: Vec<_> = modes.iter().map(|m| m.name()).collect();
        info!(
            "Flipped {} -> {} [{}] on {} ({}x{} -> {}x{})",
            args.input.display(),
            args.output.display(),
            names.join(", "),
            dispatcher.name(),
            w,
            h,
            flipped.width(),
            flipped.height(),
        );
    }

    Ok(())
}
