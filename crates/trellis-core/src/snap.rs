//! # Pixel snapping
//!
//! Layout happens in logical units; paint happens on a device grid of
//! `scale` pixels per unit. Positions and spacing round to the nearest device
//! pixel, sizes round up so content never gets clipped by a hairline.
//!
//! ```rust
//! use trellis_core::PixelSnap;
//!
//! let snap = PixelSnap::new(2.0);
//! assert_eq!(snap.snap_position(10.3), 10.5);
//! assert_eq!(snap.snap_size(10.1), 10.5);
//! assert_eq!(snap.snap_size(snap.snap_size(10.1)), 10.5);
//! ```
//!
//! Every function here is deterministic, idempotent and monotonic
//! non-decreasing for finite input. NaN snaps to `0.0`.

use crate::{Insets, Rect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSnap {
    scale: f32,
    enabled: bool,
}

impl Default for PixelSnap {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PixelSnap {
    /// `scale` is device pixels per logical unit; non-positive or non-finite
    /// scales fall back to `1.0`.
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            log::warn!("PixelSnap: invalid render scale {scale}; using 1.0");
            1.0
        };
        Self {
            scale,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            scale: 1.0,
            enabled: false,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn snap_position(&self, v: f32) -> f32 {
        self.apply(v, f64::round)
    }

    pub fn snap_space(&self, v: f32) -> f32 {
        self.apply(v, f64::round)
    }

    pub fn snap_size(&self, v: f32) -> f32 {
        self.apply(v, ceil_with_tolerance)
    }

    pub fn snap_insets(&self, insets: Insets) -> Insets {
        let insets = insets.sanitized();
        Insets {
            top: self.snap_space(insets.top),
            right: self.snap_space(insets.right),
            bottom: self.snap_space(insets.bottom),
            left: self.snap_space(insets.left),
        }
    }

    pub fn snap_rect(&self, r: Rect) -> Rect {
        Rect {
            x: self.snap_position(r.x),
            y: self.snap_position(r.y),
            w: self.snap_size(r.w),
            h: self.snap_size(r.h),
        }
    }

    fn apply(&self, v: f32, round: fn(f64) -> f64) -> f32 {
        if v.is_nan() {
            return 0.0;
        }
        if !self.enabled || v.is_infinite() {
            return v;
        }
        let s = self.scale as f64;
        (round(v as f64 * s) / s) as f32
    }
}

// A value that already sits on the grid (up to f32 representation error)
// must map to itself, otherwise `snap_size` would creep up one pixel per call.
fn ceil_with_tolerance(scaled: f64) -> f64 {
    let nearest = scaled.round();
    let tol = 1e-3_f64.max(scaled.abs() * 1e-6);
    if (scaled - nearest).abs() <= tol {
        nearest
    } else {
        scaled.ceil()
    }
}
