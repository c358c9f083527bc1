//! # Skins
//!
//! A skin is the visual half of a widget. It implements [`Skin`] and is
//! installed into a [`FrameScheduler`](crate::FrameScheduler), which owns it
//! together with its [`LayoutController`](crate::LayoutController):
//!
//! - `install` creates nodes below the skin's root and registers the widget
//!   properties the skin observes, each under a tag of the skin's own closed
//!   tag enum (see [`property_tags!`](crate::property_tags)).
//! - `handle_property_changed` runs once per changed tag, before any layout of
//!   the frame. It either updates visual attributes in place or calls
//!   `request_layout`.
//! - `compute_*` answer measure queries from property state and the hint.
//!   They report the content box; the controller adds the control's padding.
//! - `layout_children` receives the content box in the skin's local space and
//!   is the only place geometry may change.
//!
//! ```rust
//! use std::rc::Rc;
//! use trellis_core::*;
//!
//! property_tags! {
//!     pub enum SwatchProperty { Fill }
//! }
//!
//! pub struct Swatch {
//!     pub control: Control,
//!     pub fill: Property<Color>,
//! }
//!
//! pub struct SwatchSkin {
//!     swatch: Rc<Swatch>,
//!     rect: Option<NodeId>,
//! }
//!
//! impl Skin for SwatchSkin {
//!     type Property = SwatchProperty;
//!
//!     fn control(&self) -> &Control {
//!         &self.swatch.control
//!     }
//!
//!     fn install(&mut self, cx: &mut SkinContext<'_, SwatchProperty>) {
//!         let root = cx.root();
//!         let color = self.swatch.fill.get();
//!         self.rect = Some(cx.nodes().add(root, NodeKind::Rect { color, radius: 0.0 }));
//!         cx.register(&self.swatch.fill, SwatchProperty::Fill);
//!     }
//!
//!     fn handle_property_changed(&mut self, p: SwatchProperty, cx: &mut SkinContext<'_, SwatchProperty>) {
//!         match p {
//!             SwatchProperty::Fill => {
//!                 if let Some(rect) = self.rect {
//!                     cx.nodes().set_color(rect, self.swatch.fill.get());
//!                 }
//!             }
//!         }
//!     }
//!
//!     fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
//!         24.0
//!     }
//!
//!     fn compute_pref_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
//!         24.0
//!     }
//!
//!     fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
//!         if let Some(rect) = self.rect {
//!             cx.resize_relocate(rect, content);
//!         }
//!     }
//! }
//!
//! let swatch = Rc::new(Swatch { control: Control::new(), fill: Property::new(Color::BLACK) });
//! let mut scheduler = FrameScheduler::new(SessionConfig::default());
//! let id = scheduler.install(SwatchSkin { swatch: swatch.clone(), rect: None });
//! scheduler.set_root(id, Rect::new(0.0, 0.0, 24.0, 24.0)).unwrap();
//! assert_eq!(scheduler.pulse().laid_out, vec![id]);
//! assert!(scheduler.pulse().laid_out.is_empty());
//! ```

use std::any::Any;
use std::fmt::Debug;

use web_time::Instant;

use crate::context::Parts;
use crate::controller::Measure;
use crate::{Control, LayoutContext, MeasureContext, NodeId, Orientation, Rect, SkinContext};

/// Closed set of property identifiers for one skin type. Implement it with
/// [`property_tags!`](crate::property_tags).
pub trait PropertyTag: Copy + Eq + Debug + 'static {
    fn to_raw(self) -> u32;
    fn from_raw(raw: u32) -> Option<Self>;
}

/// Declares a fieldless enum and implements [`PropertyTag`] for it.
#[macro_export]
macro_rules! property_tags {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::PropertyTag for $name {
            fn to_raw(self) -> u32 {
                self as u32
            }

            fn from_raw(raw: u32) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),+];
                ALL.get(raw as usize).copied()
            }
        }
    };
}

pub trait Skin: Any {
    type Property: PropertyTag;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn control(&self) -> &Control;

    fn install(&mut self, cx: &mut SkinContext<'_, Self::Property>);

    fn handle_property_changed(
        &mut self,
        property: Self::Property,
        cx: &mut SkinContext<'_, Self::Property>,
    );

    /// `Some(Horizontal)`: height depends on the width, so height queries
    /// receive a width hint. `Some(Vertical)`: the converse.
    fn content_bias(&self) -> Option<Orientation> {
        None
    }

    fn compute_pref_width(&self, height: Option<f32>, cx: &MeasureContext<'_>) -> f32;

    fn compute_pref_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32;

    fn compute_min_width(&self, height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        self.compute_pref_width(height, cx)
    }

    fn compute_min_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        self.compute_pref_height(width, cx)
    }

    fn compute_max_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        f32::INFINITY
    }

    fn compute_max_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        f32::INFINITY
    }

    /// Distance from the top of the content box to the first text baseline.
    /// `None` puts the baseline at the bottom edge.
    fn compute_baseline_offset(&self, _cx: &MeasureContext<'_>) -> Option<f32> {
        None
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>);

    /// Node under which attached child skins are hosted; the skin root when
    /// `None`.
    fn child_container(&self) -> Option<NodeId> {
        None
    }

    /// Called once per frame while the skin is animating. Returning `false`
    /// stops the animation.
    fn tick(&mut self, _now: Instant, _cx: &mut SkinContext<'_, Self::Property>) -> bool {
        false
    }

    fn dispose(&mut self, _cx: &mut SkinContext<'_, Self::Property>) {}
}

pub(crate) trait ErasedSkin {
    fn install(&mut self, parts: Parts<'_>);
    fn dispatch(&mut self, raw: u32, parts: Parts<'_>);
    fn tick(&mut self, parts: Parts<'_>) -> bool;
    fn dispose(&mut self, parts: Parts<'_>);
    fn content_bias(&self) -> Option<Orientation>;
    fn measure(&self, m: Measure, hint: Option<f32>, cx: &MeasureContext<'_>) -> f32;
    fn baseline_offset(&self, cx: &MeasureContext<'_>) -> Option<f32>;
    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>);
    fn child_container(&self) -> Option<NodeId>;
    fn as_any(&self) -> &dyn Any;
}

impl<S: Skin> ErasedSkin for S {
    fn install(&mut self, parts: Parts<'_>) {
        let mut cx = SkinContext::new(parts);
        <S as Skin>::install(self, &mut cx);
    }

    fn dispatch(&mut self, raw: u32, parts: Parts<'_>) {
        match S::Property::from_raw(raw) {
            Some(tag) => {
                let mut cx = SkinContext::new(parts);
                <S as Skin>::handle_property_changed(self, tag, &mut cx);
            }
            None => log::warn!("{}: unknown property tag {raw}", <S as Skin>::name(self)),
        }
    }

    fn tick(&mut self, parts: Parts<'_>) -> bool {
        let now = parts.now;
        let mut cx = SkinContext::new(parts);
        <S as Skin>::tick(self, now, &mut cx)
    }

    fn dispose(&mut self, parts: Parts<'_>) {
        let mut cx = SkinContext::new(parts);
        <S as Skin>::dispose(self, &mut cx);
    }

    fn content_bias(&self) -> Option<Orientation> {
        <S as Skin>::content_bias(self)
    }

    fn measure(&self, m: Measure, hint: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        match m {
            Measure::MinWidth => self.compute_min_width(hint, cx),
            Measure::MinHeight => self.compute_min_height(hint, cx),
            Measure::PrefWidth => self.compute_pref_width(hint, cx),
            Measure::PrefHeight => self.compute_pref_height(hint, cx),
            Measure::MaxWidth => self.compute_max_width(hint, cx),
            Measure::MaxHeight => self.compute_max_height(hint, cx),
        }
    }

    fn baseline_offset(&self, cx: &MeasureContext<'_>) -> Option<f32> {
        self.compute_baseline_offset(cx)
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        <S as Skin>::layout_children(self, content, cx);
    }

    fn child_container(&self) -> Option<NodeId> {
        <S as Skin>::child_container(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
