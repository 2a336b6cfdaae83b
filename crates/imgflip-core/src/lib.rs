//! # imgflip-core
//!
//! Core types shared by the imgflip crates.
//!
//! - [`Image`] - owned, interleaved `f32` pixel buffer
//! - [`PixelFormat`] - storage depth the samples originated from
//! - [`FlipMode`] - a single flip transform
//! - [`FlipToggles`] - the three boolean switches that select flips
//!
//! ## Crate Structure
//!
//! ```text
//! imgflip-core (this crate)
//!    ^
//!    |
//!    +-- imgflip-compute (kernels, backends, dispatcher)
//!    +-- imgflip-cli (PNG I/O, command line)
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod mode;

pub use error::{Error, Result};
pub use image::{Image, PixelFormat};
pub use mode::{FlipMode, FlipToggles};
