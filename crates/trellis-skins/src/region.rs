use std::rc::Rc;

use trellis_core::*;

property_tags! {
    pub enum RegionProperty {
        PrefWidth,
        PrefHeight,
        Fill,
    }
}

/// A filled box with a fixed preferred size.
pub struct Region {
    pub control: Control,
    pub pref_width: Property<f32>,
    pub pref_height: Property<f32>,
    pub fill: Property<Color>,
}

impl Region {
    pub fn new(width: f32, height: f32) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            pref_width: Property::new(width),
            pref_height: Property::new(height),
            fill: Property::new(Color::TRANSPARENT),
        })
    }

    pub fn filled(width: f32, height: f32, fill: Color) -> Rc<Self> {
        let r = Self::new(width, height);
        r.fill.set(fill);
        r
    }
}

pub struct RegionSkin {
    region: Rc<Region>,
    background: Option<NodeId>,
}

impl RegionSkin {
    pub fn new(region: Rc<Region>) -> Self {
        Self {
            region,
            background: None,
        }
    }
}

impl Skin for RegionSkin {
    type Property = RegionProperty;

    fn name(&self) -> &'static str {
        "Region"
    }

    fn control(&self) -> &Control {
        &self.region.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, RegionProperty>) {
        let root = cx.root();
        let color = self.region.fill.get();
        self.background = Some(cx.nodes().add(root, NodeKind::Rect { color, radius: 0.0 }));
        cx.register(&self.region.pref_width, RegionProperty::PrefWidth);
        cx.register(&self.region.pref_height, RegionProperty::PrefHeight);
        cx.register(&self.region.fill, RegionProperty::Fill);
    }

    fn handle_property_changed(
        &mut self,
        p: RegionProperty,
        cx: &mut SkinContext<'_, RegionProperty>,
    ) {
        match p {
            RegionProperty::PrefWidth | RegionProperty::PrefHeight => cx.request_layout(),
            RegionProperty::Fill => {
                if let Some(bg) = self.background {
                    cx.nodes().set_color(bg, self.region.fill.get());
                }
            }
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        self.region.pref_width.get()
    }

    fn compute_pref_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        self.region.pref_height.get()
    }

    fn compute_min_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        0.0
    }

    fn compute_min_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        0.0
    }

    fn layout_children(&mut self, _content: Rect, cx: &mut LayoutContext<'_>) {
        // The background covers the padding too.
        let size = self.region.control.layout_bounds().size();
        if let Some(bg) = self.background {
            cx.resize_relocate(bg, Rect::from_size(size));
        }
    }
}
