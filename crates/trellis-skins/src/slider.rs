use std::rc::Rc;

use trellis_core::*;

pub const TRACK_THICKNESS: f32 = 4.0;
pub const THUMB_SIZE: f32 = 20.0;
pub const PREF_LENGTH: f32 = 140.0;

property_tags! {
    pub enum SliderProperty {
        Value,
        Min,
        Max,
        Orientation,
        Step,
    }
}

pub struct Slider {
    pub control: Control,
    pub value: Property<f64>,
    pub min: Property<f64>,
    pub max: Property<f64>,
    pub orientation: Property<Orientation>,
    /// Granularity for values picked with the pointer.
    pub step: Property<Option<f64>>,
}

impl Slider {
    pub fn new(min: f64, max: f64, value: f64) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            value: Property::new(value),
            min: Property::new(min),
            max: Property::new(max),
            orientation: Property::new(Orientation::Horizontal),
            step: Property::new(None),
        })
    }

    pub fn set_value(&self, v: f64) {
        self.value.set(v);
    }

    /// Clamps and steps `v`, then stores it.
    pub fn adjust_value(&self, v: f64) {
        let (min, max) = (self.min.get(), self.max.get());
        self.set_value(snap_step(clamp_value(v, min, max), self.step.get(), min, max));
    }

    /// The value clamped into `[min, max]`; what the thumb shows.
    pub fn clamped_value(&self) -> f64 {
        clamp_value(self.value.get(), self.min.get(), self.max.get())
    }
}

fn snap_step(v: f64, step: Option<f64>, min: f64, max: f64) -> f64 {
    match step {
        Some(s) if s > 0.0 && s.is_finite() => {
            clamp_value(min + ((v - min) / s).round() * s, min, max)
        }
        _ => v,
    }
}

pub struct SliderSkin {
    slider: Rc<Slider>,
    track: Option<NodeId>,
    fill: Option<NodeId>,
    thumb: Option<NodeId>,
    // Local track span from the last pass: (start, length) along the main axis.
    span: (f32, f32),
}

impl SliderSkin {
    pub fn new(slider: Rc<Slider>) -> Self {
        Self {
            slider,
            track: None,
            fill: None,
            thumb: None,
            span: (0.0, 0.0),
        }
    }

    pub fn thumb(&self) -> Option<NodeId> {
        self.thumb
    }

    /// Maps a point in the slider's local space to a value, for pointer
    /// handling. Commit it with `Slider::adjust_value`.
    pub fn value_at(&self, p: Vec2) -> f64 {
        let (start, len) = self.span;
        let (min, max) = (self.slider.min.get(), self.slider.max.get());
        if len <= 0.0 {
            return clamp_value(min, min, max);
        }
        let t = match self.slider.orientation.get() {
            Orientation::Horizontal => (p.x - start) / len,
            Orientation::Vertical => 1.0 - (p.y - start) / len,
        };
        let v = denormalize(f64::from(t), min, max);
        snap_step(v, self.slider.step.get(), min, max)
    }
}

impl Skin for SliderSkin {
    type Property = SliderProperty;

    fn name(&self) -> &'static str {
        "Slider"
    }

    fn control(&self) -> &Control {
        &self.slider.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, SliderProperty>) {
        let root = cx.root();
        let palette = *cx.palette();
        let r = TRACK_THICKNESS * 0.5;
        self.track = Some(cx.nodes().add(root, NodeKind::Rect { color: palette.track, radius: r }));
        self.fill = Some(cx.nodes().add(root, NodeKind::Rect { color: palette.primary, radius: r }));
        self.thumb = Some(cx.nodes().add(
            root,
            NodeKind::Rect {
                color: palette.surface,
                radius: THUMB_SIZE * 0.5,
            },
        ));
        cx.register(&self.slider.value, SliderProperty::Value);
        cx.register(&self.slider.min, SliderProperty::Min);
        cx.register(&self.slider.max, SliderProperty::Max);
        cx.register(&self.slider.orientation, SliderProperty::Orientation);
        cx.register(&self.slider.step, SliderProperty::Step);
    }

    fn handle_property_changed(
        &mut self,
        p: SliderProperty,
        cx: &mut SkinContext<'_, SliderProperty>,
    ) {
        match p {
            SliderProperty::Value
            | SliderProperty::Min
            | SliderProperty::Max
            | SliderProperty::Orientation => cx.request_layout(),
            SliderProperty::Step => {}
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        match self.slider.orientation.get() {
            Orientation::Horizontal => PREF_LENGTH,
            Orientation::Vertical => THUMB_SIZE,
        }
    }

    fn compute_pref_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        match self.slider.orientation.get() {
            Orientation::Horizontal => THUMB_SIZE,
            Orientation::Vertical => PREF_LENGTH,
        }
    }

    fn compute_min_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        match self.slider.orientation.get() {
            Orientation::Horizontal => THUMB_SIZE * 2.0,
            Orientation::Vertical => THUMB_SIZE,
        }
    }

    fn compute_min_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        match self.slider.orientation.get() {
            Orientation::Horizontal => THUMB_SIZE,
            Orientation::Vertical => THUMB_SIZE * 2.0,
        }
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let (Some(track), Some(fill), Some(thumb)) = (self.track, self.fill, self.thumb) else {
            return;
        };
        let (min, max) = (self.slider.min.get(), self.slider.max.get());
        let t = normalize(self.slider.clamped_value(), min, max) as f32;
        let half = THUMB_SIZE * 0.5;

        let knob = Size::new(THUMB_SIZE, THUMB_SIZE);
        match self.slider.orientation.get() {
            Orientation::Horizontal => {
                let start = content.x + half;
                let len = (content.w - THUMB_SIZE).max(0.0);
                let at = start + t * len;
                self.span = (start, len);
                let along = Rect::new(start, content.y, len, content.h);
                let (left, mid) = (HAlign::Left, VAlign::Center);
                cx.position_in_area(track, along, Size::new(len, TRACK_THICKNESS), left, mid);
                cx.position_in_area(fill, along, Size::new(t * len, TRACK_THICKNESS), left, mid);
                let slot = Rect::new(at - half, content.y, THUMB_SIZE, content.h);
                cx.position_in_area(thumb, slot, knob, HAlign::Center, mid);
            }
            Orientation::Vertical => {
                let start = content.y + half;
                let len = (content.h - THUMB_SIZE).max(0.0);
                // Minimum at the bottom.
                let at = start + (1.0 - t) * len;
                self.span = (start, len);
                let along = Rect::new(content.x, start, content.w, len);
                let filled = Size::new(TRACK_THICKNESS, start + len - at);
                let mid = HAlign::Center;
                cx.position_in_area(track, along, Size::new(TRACK_THICKNESS, len), mid, VAlign::Top);
                cx.position_in_area(fill, along, filled, mid, VAlign::Bottom);
                let slot = Rect::new(content.x, at - half, content.w, THUMB_SIZE);
                cx.position_in_area(thumb, slot, knob, mid, VAlign::Center);
            }
        }
    }
}
