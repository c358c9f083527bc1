use std::cell::Cell;
use std::rc::Rc;

use crate::{Insets, Property, Rect, SkinId};

/// State every skinnable widget shares. Cloning yields another handle to the
/// same control.
#[derive(Clone)]
pub struct Control {
    inner: Rc<ControlInner>,
}

struct ControlInner {
    padding: Property<Insets>,
    visible: Property<bool>,
    bounds: Cell<Rect>,
    skin: Cell<Option<SkinId>>,
}

impl Control {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ControlInner {
                padding: Property::new(Insets::ZERO),
                visible: Property::new(true),
                bounds: Cell::new(Rect::ZERO),
                skin: Cell::new(None),
            }),
        }
    }

    pub fn with_padding(self, padding: Insets) -> Self {
        self.inner.padding.set(padding);
        self
    }

    pub fn padding(&self) -> &Property<Insets> {
        &self.inner.padding
    }

    pub fn visible(&self) -> &Property<bool> {
        &self.inner.visible
    }

    /// Bounds assigned by the last committed layout pass, in the parent's
    /// coordinate space.
    pub fn layout_bounds(&self) -> Rect {
        self.inner.bounds.get()
    }

    pub fn width(&self) -> f32 {
        self.inner.bounds.get().w
    }

    pub fn height(&self) -> f32 {
        self.inner.bounds.get().h
    }

    /// The live skin for this control, if any.
    pub fn skin(&self) -> Option<SkinId> {
        self.inner.skin.get()
    }

    pub fn same_control(&self, other: &Control) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_layout_bounds(&self, r: Rect) {
        self.inner.bounds.set(r);
    }

    pub(crate) fn set_skin(&self, id: Option<SkinId>) {
        self.inner.skin.set(id);
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("padding", &self.inner.padding.get())
            .field("visible", &self.inner.visible.get())
            .field("bounds", &self.inner.bounds.get())
            .field("skin", &self.inner.skin.get())
            .finish()
    }
}
