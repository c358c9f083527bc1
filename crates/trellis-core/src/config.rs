//! Session configuration, passed to every skin through its context instead of
//! living in globals.

use crate::{Color, PixelSnap};

/// Colors skins paint with.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Palette {
    /// Scene clear color.
    pub background: Color,
    /// Panels and title bars.
    pub surface: Color,
    /// Foreground on top of `surface`/`background`.
    pub on_surface: Color,
    /// Slider fill, progress bars, spinners.
    pub primary: Color,
    /// Low-emphasis borders.
    pub outline: Color,
    /// Slider and progress tracks.
    pub track: Color,
    pub scrollbar_thumb: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::from_hex("#121212"),
            surface: Color::from_hex("#1E1E1E"),
            on_surface: Color::from_hex("#DDDDDD"),
            primary: Color::from_hex("#34AF82"),
            outline: Color::from_hex("#555555"),
            track: Color(0xDD, 0xDD, 0xDD, 32),
            scrollbar_thumb: Color(0xDD, 0xDD, 0xDD, 140),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Physical pixels per layout unit.
    pub render_scale: f32,
    pub snap_to_pixel: bool,
    /// Upper bound on change notifications handled in one frame; the rest
    /// carry over to the next frame.
    pub max_dispatch_per_frame: usize,
    pub palette: Palette,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            snap_to_pixel: true,
            max_dispatch_per_frame: 10_000,
            palette: Palette::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    pub fn with_snap_to_pixel(mut self, on: bool) -> Self {
        self.snap_to_pixel = on;
        self
    }

    pub fn with_dispatch_budget(mut self, n: usize) -> Self {
        self.max_dispatch_per_frame = n.max(1);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn pixel_snap(&self) -> PixelSnap {
        if self.snap_to_pixel {
            PixelSnap::new(self.render_scale)
        } else {
            PixelSnap::disabled()
        }
    }
}
