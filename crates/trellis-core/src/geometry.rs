#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// NaN and negative extents become zero.
    pub fn sanitized(self) -> Self {
        Self {
            width: sanitize_extent(self.width),
            height: sanitize_extent(self.height),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn translate(mut self, dx: f32, dy: f32) -> Self {
        self.x += dx;
        self.y += dy;
        self
    }

    /// Shrinks the rect by `insets`; never produces a negative extent.
    pub fn inset(&self, insets: Insets) -> Rect {
        Rect {
            x: self.x + insets.left,
            y: self.y + insets.top,
            w: (self.w - insets.horizontal()).max(0.0),
            h: (self.h - insets.vertical()).max(0.0),
        }
    }

    /// Non-finite origins collapse to zero, extents are clamped to `>= 0`.
    pub fn sanitized(self) -> Rect {
        Rect {
            x: if self.x.is_finite() { self.x } else { 0.0 },
            y: if self.y.is_finite() { self.y } else { 0.0 },
            w: sanitize_extent(self.w),
            h: sanitize_extent(self.h),
        }
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);
        let w = x1 - x0;
        let h = y1 - y0;
        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect { x: x0, y: y0, w, h })
        }
    }
}

/// Padding around a control's content box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn sanitized(self) -> Self {
        Self {
            top: sanitize_extent(self.top),
            right: sanitize_extent(self.right),
            bottom: sanitize_extent(self.bottom),
            left: sanitize_extent(self.left),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn cross(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Horizontal placement of a box inside an area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of a box inside an area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl Rect {
    /// A box of `size` placed inside `self`. A box larger than the area
    /// keeps its size and overflows it.
    pub fn align(&self, size: Size, h: HAlign, v: VAlign) -> Rect {
        let size = size.sanitized();
        let x = match h {
            HAlign::Left => self.x,
            HAlign::Center => self.x + (self.w - size.width) * 0.5,
            HAlign::Right => self.x + self.w - size.width,
        };
        let y = match v {
            VAlign::Top => self.y,
            VAlign::Center => self.y + (self.h - size.height) * 0.5,
            VAlign::Bottom => self.y + self.h - size.height,
        };
        Rect::new(x, y, size.width, size.height)
    }
}

impl From<Orientation> for taffy::FlexDirection {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Horizontal => taffy::FlexDirection::Row,
            Orientation::Vertical => taffy::FlexDirection::Column,
        }
    }
}

/// Maps NaN and negative values to zero; `+inf` is kept.
pub fn sanitize_extent(v: f32) -> f32 {
    if v.is_nan() || v < 0.0 { 0.0 } else { v }
}

/// Clamps `value` into `[min, max]`. A NaN value resolves to `min`; an inverted
/// range resolves to `min`.
pub fn clamp_value(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || max < min || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Position of `value` inside `[min, max]` as a fraction in `[0, 1]`.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if !(max > min) {
        return 0.0;
    }
    (clamp_value(value, min, max) - min) / (max - min)
}

pub fn denormalize(t: f64, min: f64, max: f64) -> f64 {
    min + t.clamp(0.0, 1.0) * (max - min)
}
