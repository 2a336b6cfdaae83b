//! Run command: per-frame flip loop

use anyhow::{Result, bail};
use tracing::{info, trace, warn};

use imgflip_compute::{DisplaySink, FrameDriver, Viewport};
use imgflip_core::Image;

use super::{load_config, load_image, make_dispatcher, resolve_toggles, save_image};
use crate::{Globals, RunArgs};

/// Keeps the latest frame and logs viewport changes.
#[derive(Default)]
struct LogSink {
    frame: Option<Image>,
    viewport: Option<Viewport>,
}

impl DisplaySink for LogSink {
    fn present(&mut self, frame: &Image, viewport: Viewport) {
        if self.viewport != Some(viewport) {
            info!(
                width = viewport.width,
                height = viewport.height,
                ortho_size = viewport.ortho_size,
                "viewport resized"
            );
        }
        self.viewport = Some(viewport);
        self.frame = Some(frame.clone());
    }
}

pub fn run(args: RunArgs, globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    if !args.select.mode.is_empty() {
        warn!("--mode is ignored by run; frames use the x, y, diagonal toggles");
    }
    let toggles = resolve_toggles(&args.select, &config);
    let dispatcher = make_dispatcher(globals, &config)?;
    let source = load_image(&args.input)?;

    let mut driver = FrameDriver::new(dispatcher, source, toggles, LogSink::default());
    for frame in 0..args.frames {
        match driver.tick() {
            Ok(vp) => trace!(frame, width = vp.width, height = vp.height, "frame presented"),
            Err(e) => trace!(frame, "frame skipped: {}", e),
        }
    }

    info!(
        "{} frames, {} failed, pool {:?}",
        driver.ticks(),
        driver.failures(),
        driver.dispatcher().pool_stats()
    );

    let Some(frame) = driver.into_sink().frame else {
        bail!("no frame was presented in {} ticks", args.frames);
    };
    save_image(&args.output, &frame)
}
