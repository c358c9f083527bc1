pub use crate::animation::{AnimatedValue, AnimationSpec, Easing};
pub use crate::color::Color;
pub use crate::geometry::{Insets, Orientation, Rect, Size, Vec2};
pub use crate::node::{NodeId, NodeKind};
pub use crate::property::{Property, property};
pub use crate::property_tags;
pub use crate::{
    Control, FrameReport, FrameScheduler, LayoutContext, MeasureContext, SessionConfig, Skin,
    SkinContext, SkinId,
};
