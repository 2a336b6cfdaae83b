//! Flip modes and the toggles that select them.

use serde::{Deserialize, Serialize};

use crate::Error;

/// A single flip transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlipMode {
    /// Leave the image unchanged.
    #[default]
    None,
    /// Mirror across the vertical axis: `out(x, y) = in(w - 1 - x, y)`.
    FlipX,
    /// Mirror across the horizontal axis: `out(x, y) = in(x, h - 1 - y)`.
    FlipY,
    /// Transpose: output is `h x w` and `out(x, y) = in(y, x)`.
    FlipDiagonal,
}

impl FlipMode {
    /// Name of the compute kernel that implements this mode.
    ///
    /// `None` has no kernel.
    pub fn kernel_name(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::FlipX => Some("FlipXAxis"),
            Self::FlipY => Some("FlipYAxis"),
            Self::FlipDiagonal => Some("FlipDiag"),
        }
    }

    /// Output dimensions for an input of `width x height`.
    pub fn output_dims(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::FlipDiagonal => (height, width),
            _ => (width, height),
        }
    }

    /// Short name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FlipX => "x",
            Self::FlipY => "y",
            Self::FlipDiagonal => "diag",
        }
    }
}

impl std::fmt::Display for FlipMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FlipMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "x" | "flip-x" | "horizontal" | "h" => Ok(Self::FlipX),
            "y" | "flip-y" | "vertical" | "v" => Ok(Self::FlipY),
            "diag" | "diagonal" | "flip-diagonal" | "transpose" | "t" => Ok(Self::FlipDiagonal),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// The three independent switches that enable flips.
///
/// Enabled flips always run in the order X, Y, diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipToggles {
    /// Flip across the x axis.
    #[serde(alias = "flipXAxis")]
    pub flip_x_axis: bool,
    /// Flip across the y axis.
    #[serde(alias = "flipYAxis")]
    pub flip_y_axis: bool,
    /// Flip across the diagonal.
    #[serde(alias = "flipDiag")]
    pub flip_diag: bool,
}

impl FlipToggles {
    /// Create toggles from the three switches.
    pub fn new(flip_x_axis: bool, flip_y_axis: bool, flip_diag: bool) -> Self {
        Self { flip_x_axis, flip_y_axis, flip_diag }
    }

    /// Enabled modes in application order.
    pub fn modes(&self) -> Vec<FlipMode> {
        let mut modes = Vec::with_capacity(3);
        if self.flip_x_axis {
            modes.push(FlipMode::FlipX);
        }
        if self.flip_y_axis {
            modes.push(FlipMode::FlipY);
        }
        if self.flip_diag {
            modes.push(FlipMode::FlipDiagonal);
        }
        modes
    }

    /// Whether any flip is enabled.
    pub fn any(&self) -> bool {
        self.flip_x_axis || self.flip_y_axis || self.flip_diag
    }

    /// Combine with another set, enabling a flip if either enables it.
    pub fn union(self, other: Self) -> Self {
        Self {
            flip_x_axis: self.flip_x_axis || other.flip_x_axis,
            flip_y_axis: self.flip_y_axis || other.flip_y_axis,
            flip_diag: self.flip_diag || other.flip_diag,
        }
    }
}
