//! Frame description, independent of any terminal.
//!
//! [`build_scene`] turns the game into an ordered list of [`DrawCommand`]s
//! on the logical 400x600 field; [`rasterize`] turns those into a grid of
//! colored pixels plus text labels that the UI copies into terminal cells.

pub mod raster;
pub mod scene;

pub use raster::{rasterize, Label, PixelCanvas};
pub use scene::{bird_colors, build_scene, cloud_positions, BirdColors, Toast};

use crate::game::Rect;
use crate::themes::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One drawing primitive, painted in list order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Rgb,
    },
    /// Translucent layer over everything drawn so far.
    Shade {
        color: Rgb,
        alpha: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: Rgb,
        align: Align,
        bold: bool,
    },
}

impl DrawCommand {
    pub fn rect(x: f64, y: f64, width: f64, height: f64, color: Rgb) -> Self {
        DrawCommand::FillRect {
            rect: Rect::new(x, y, width, height),
            color,
        }
    }

    pub fn circle(cx: f64, cy: f64, radius: f64, color: Rgb) -> Self {
        DrawCommand::FillCircle {
            cx,
            cy,
            radius,
            color,
        }
    }

    pub fn text(x: f64, y: f64, text: impl Into<String>, color: Rgb, align: Align) -> Self {
        DrawCommand::Text {
            x,
            y,
            text: text.into(),
            color,
            align,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        if let DrawCommand::Text { bold, .. } = &mut self {
            *bold = true;
        }
        self
    }
}
