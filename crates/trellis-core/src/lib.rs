//! # Skins, properties and layout
//!
//! Trellis separates a widget into two halves:
//!
//! - the widget itself: a plain struct holding a [`Control`] and any number
//!   of [`Property`] fields. It knows nothing about drawing.
//! - its [`Skin`]: creates nodes, observes properties and computes geometry.
//!
//! Skins never run on their own. A [`FrameScheduler`] owns them and advances
//! the session with [`FrameScheduler::pulse`]: property changes are batched
//! and handled first, then every dirty subtree gets one position pass.
//!
//! ```rust
//! use trellis_core::*;
//!
//! let padding = Property::new(Insets::ZERO);
//! let calls = std::rc::Rc::new(std::cell::Cell::new(0));
//! let sub = padding.subscribe({
//!     let calls = calls.clone();
//!     move |_old, _new| calls.set(calls.get() + 1)
//! });
//!
//! padding.set(Insets::uniform(4.0));
//! padding.set(Insets::uniform(4.0)); // unchanged, not notified
//! assert_eq!(calls.get(), 1);
//! drop(sub);
//! ```
//!
//! ## Layout protocol
//!
//! A parent asks its children for their sizes through a [`MeasureContext`]
//! (`pref_width`, `min_height`, ...). Results include the child's padding and
//! are pixel snapped. A hint on the cross axis is handed to the child only
//! when its [`Skin::content_bias`] asks for it.
//!
//! The parent then places every child with [`LayoutContext::layout_child`].
//! A child whose controller is clean and whose area did not change is skipped,
//! so repeated passes over an unchanged tree do no work.
//!
//! ## Failures
//!
//! A skin that panics while measuring reports a size of zero. A skin that
//! panics while laying out is reported in [`FrameReport::failures`] and left
//! alone until something requests layout again. Neither affects its siblings.

pub mod animation;
pub mod color;
pub mod config;
pub mod context;
pub mod control;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod node;
pub mod prelude;
pub mod property;
pub mod scene;
pub mod scheduler;
pub mod skin;
pub mod snap;

#[cfg(test)]
mod tests;

pub use animation::{
    AnimatedValue, AnimationSpec, Clock, Easing, Interpolate, SystemClock, TestClock,
};
pub use color::Color;
pub use config::{Palette, SessionConfig};
pub use context::{LayoutContext, MeasureContext, SkinContext};
pub use control::Control;
pub use controller::{DirtyFlags, LayoutController, LayoutState, Measure};
pub use error::{LayoutError, LayoutFailure};
pub use geometry::*;
pub use node::{Node, NodeId, NodeKind, NodeTree};
pub use property::{Property, Subscription, property};
pub use scene::{Scene, SceneNode};
pub use scheduler::{FrameReport, FrameScheduler, SkinId};
pub use skin::{PropertyTag, Skin};
pub use snap::PixelSnap;
pub use taffy;
pub use web_time::{Duration, Instant};
