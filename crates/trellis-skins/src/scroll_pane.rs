//! Scrolling viewport over a single content skin.
//!
//! The content is the first attached child. It is sized to its preferred size
//! (bounded by its min and max), or stretched to the viewport on an axis with
//! `fit_to_width` / `fit_to_height`. `vvalue` and `hvalue` are fractions in
//! `[0, 1]` of the scrollable range.
//!
//! When the content grows or shrinks while scrolled, the values are rewritten
//! during the same position pass so that the content under the top-left corner
//! of the viewport does not move.

use std::rc::Rc;

use trellis_core::*;

pub const SCROLLBAR_THICKNESS: f32 = 6.0;
pub const MIN_VIEWPORT: f32 = 24.0;

property_tags! {
    pub enum ScrollPaneProperty {
        VValue,
        HValue,
        FitToWidth,
        FitToHeight,
    }
}

pub struct ScrollPane {
    pub control: Control,
    pub vvalue: Property<f64>,
    pub hvalue: Property<f64>,
    pub fit_to_width: Property<bool>,
    pub fit_to_height: Property<bool>,
}

impl ScrollPane {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            vvalue: Property::new(0.0),
            hvalue: Property::new(0.0),
            fit_to_width: Property::new(false),
            fit_to_height: Property::new(false),
        })
    }
}

/// Extent along one axis: content node size, viewport size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Span {
    content: f32,
    viewport: f32,
}

impl Span {
    fn range(self) -> f32 {
        (self.content - self.viewport).max(0.0)
    }
}

pub struct ScrollPaneSkin {
    pane: Rc<ScrollPane>,
    viewport: Option<NodeId>,
    vbar: Option<NodeId>,
    hbar: Option<NodeId>,
    last_v: Option<Span>,
    last_h: Option<Span>,
    // Values this skin wrote itself; their change notifications are echoes.
    written_v: Option<f64>,
    written_h: Option<f64>,
}

impl ScrollPaneSkin {
    pub fn new(pane: Rc<ScrollPane>) -> Self {
        Self {
            pane,
            viewport: None,
            vbar: None,
            hbar: None,
            last_v: None,
            last_h: None,
            written_v: None,
            written_h: None,
        }
    }

    pub fn viewport(&self) -> Option<NodeId> {
        self.viewport
    }

    /// Scrolls by a pixel delta, as a wheel would. Positive `dy` reveals
    /// content further down.
    pub fn scroll_by(&self, dx: f32, dy: f32) {
        let step = |value: &Property<f64>, span: Option<Span>, d: f32| {
            let range = span.map_or(0.0, Span::range);
            if range > 0.0 && d != 0.0 {
                value.set(clamp_value(value.get() + f64::from(d / range), 0.0, 1.0));
            }
        };
        step(&self.pane.hvalue, self.last_h, dx);
        step(&self.pane.vvalue, self.last_v, dy);
    }

    /// Keeps the leading edge in place across a change of scrollable range.
    /// Returns the value to use for this pass.
    fn rescale(value: &Property<f64>, old: Option<Span>, new: Span, written: &mut Option<f64>) -> f64 {
        let v = clamp_value(value.get(), 0.0, 1.0);
        let Some(old) = old else {
            return v;
        };
        if old.content <= 0.0 || old.content == new.content || new.range() <= 0.0 {
            return v;
        }
        let offset = f64::from(old.range()) * v;
        let next = clamp_value(offset / f64::from(new.range()), 0.0, 1.0);
        if next != v {
            log::debug!("scroll value rescaled {v} -> {next}");
            *written = Some(next);
            value.set(next);
        }
        next
    }

    fn content_size(&self, child: SkinId, viewport: Size, m: &MeasureContext<'_>) -> Size {
        let bounded = |pref: f32, min: f32, max: f32| pref.max(min).min(max.max(min));
        let fit_w = self.pane.fit_to_width.get();
        let fit_h = self.pane.fit_to_height.get();
        match m.content_bias(child) {
            Some(Orientation::Vertical) => {
                let h = if fit_h {
                    viewport.height
                } else {
                    bounded(
                        m.pref_height(child, None),
                        m.min_height(child, None),
                        m.max_height(child, None),
                    )
                };
                let w = if fit_w {
                    viewport.width
                } else {
                    bounded(
                        m.pref_width(child, Some(h)),
                        m.min_width(child, Some(h)),
                        m.max_width(child, Some(h)),
                    )
                };
                Size::new(w, h)
            }
            _ => {
                let w = if fit_w {
                    viewport.width
                } else {
                    bounded(
                        m.pref_width(child, None),
                        m.min_width(child, None),
                        m.max_width(child, None),
                    )
                };
                let h = if fit_h {
                    viewport.height
                } else {
                    bounded(
                        m.pref_height(child, Some(w)),
                        m.min_height(child, Some(w)),
                        m.max_height(child, Some(w)),
                    )
                };
                Size::new(w, h)
            }
        }
    }

    fn place_bars(&self, view: Rect, v: f64, h: f64, vs: Span, hs: Span, cx: &mut LayoutContext<'_>) {
        if let Some(bar) = self.vbar {
            let show = vs.range() > 0.0;
            cx.nodes().set_visible(bar, show);
            if show {
                let len = (view.h * view.h / vs.content).max(SCROLLBAR_THICKNESS);
                let y = view.y + (view.h - len) * v as f32;
                let x = view.x + view.w - SCROLLBAR_THICKNESS;
                cx.resize_relocate(bar, Rect::new(x, y, SCROLLBAR_THICKNESS, len));
            }
        }
        if let Some(bar) = self.hbar {
            let show = hs.range() > 0.0;
            cx.nodes().set_visible(bar, show);
            if show {
                let len = (view.w * view.w / hs.content).max(SCROLLBAR_THICKNESS);
                let x = view.x + (view.w - len) * h as f32;
                let y = view.y + view.h - SCROLLBAR_THICKNESS;
                cx.resize_relocate(bar, Rect::new(x, y, len, SCROLLBAR_THICKNESS));
            }
        }
    }
}

impl Skin for ScrollPaneSkin {
    type Property = ScrollPaneProperty;

    fn name(&self) -> &'static str {
        "ScrollPane"
    }

    fn control(&self) -> &Control {
        &self.pane.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, ScrollPaneProperty>) {
        let root = cx.root();
        let thumb = cx.palette().scrollbar_thumb;
        let viewport = cx.nodes().add(root, NodeKind::Group);
        cx.nodes().set_clip(viewport, true);
        self.viewport = Some(viewport);
        let r = SCROLLBAR_THICKNESS * 0.5;
        self.vbar = Some(cx.nodes().add(root, NodeKind::Rect { color: thumb, radius: r }));
        self.hbar = Some(cx.nodes().add(root, NodeKind::Rect { color: thumb, radius: r }));
        cx.register(&self.pane.vvalue, ScrollPaneProperty::VValue);
        cx.register(&self.pane.hvalue, ScrollPaneProperty::HValue);
        cx.register(&self.pane.fit_to_width, ScrollPaneProperty::FitToWidth);
        cx.register(&self.pane.fit_to_height, ScrollPaneProperty::FitToHeight);
    }

    fn handle_property_changed(
        &mut self,
        p: ScrollPaneProperty,
        cx: &mut SkinContext<'_, ScrollPaneProperty>,
    ) {
        let echo = match p {
            ScrollPaneProperty::VValue => {
                self.written_v.take() == Some(self.pane.vvalue.get())
            }
            ScrollPaneProperty::HValue => {
                self.written_h.take() == Some(self.pane.hvalue.get())
            }
            ScrollPaneProperty::FitToWidth | ScrollPaneProperty::FitToHeight => false,
        };
        if !echo {
            cx.request_layout();
        }
    }

    fn compute_pref_width(&self, height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        cx.children()
            .first()
            .map_or(0.0, |c| cx.pref_width(*c, height))
    }

    fn compute_pref_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        cx.children()
            .first()
            .map_or(0.0, |c| cx.pref_height(*c, width))
    }

    fn compute_min_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        MIN_VIEWPORT
    }

    fn compute_min_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        MIN_VIEWPORT
    }

    fn child_container(&self) -> Option<NodeId> {
        self.viewport
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let Some(viewport) = self.viewport else {
            return;
        };
        cx.resize_relocate(viewport, content);
        let view = Rect::from_size(content.size());

        let children = cx.children();
        let Some(&child) = children.first() else {
            self.place_bars(content, 0.0, 0.0, Span::default(), Span::default(), cx);
            return;
        };
        for extra in &children[1..] {
            log::warn!("ScrollPane shows a single content skin; {extra:?} is ignored");
        }

        let snap = cx.snap();
        let size = self.content_size(child, view.size(), &cx.measure());
        let size = Size::new(snap.snap_size(size.width), snap.snap_size(size.height));
        let vs = Span {
            content: size.height,
            viewport: view.h,
        };
        let hs = Span {
            content: size.width,
            viewport: view.w,
        };

        let v = Self::rescale(&self.pane.vvalue, self.last_v, vs, &mut self.written_v);
        let h = Self::rescale(&self.pane.hvalue, self.last_h, hs, &mut self.written_h);
        self.last_v = Some(vs);
        self.last_h = Some(hs);

        let x = -snap.snap_position(h as f32 * hs.range());
        let y = -snap.snap_position(v as f32 * vs.range());
        cx.layout_child(child, Rect::new(x, y, size.width, size.height));
        self.place_bars(content, v, h, vs, hs, cx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Region, RegionSkin};

    fn pane_with_content(
        content_h: f32,
    ) -> (FrameScheduler, Rc<ScrollPane>, Rc<Region>, SkinId, SkinId) {
        let mut s = FrameScheduler::new(SessionConfig::default());
        let pane = ScrollPane::new();
        let region = Region::new(100.0, content_h);
        let p = s.install(ScrollPaneSkin::new(pane.clone()));
        let c = s.install(RegionSkin::new(region.clone()));
        s.attach_child(p, c).unwrap();
        s.set_root(p, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        s.pulse();
        (s, pane, region, p, c)
    }

    fn content_bounds(s: &FrameScheduler, c: SkinId) -> Rect {
        s.nodes().get(s.root_node(c).unwrap()).unwrap().bounds()
    }

    #[test]
    fn test_offset_follows_vvalue() {
        let (mut s, pane, _region, _p, c) = pane_with_content(300.0);
        assert_eq!(content_bounds(&s, c), Rect::new(0.0, 0.0, 100.0, 300.0));
        pane.vvalue.set(1.0);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, -200.0);
        // Out of range values are read clamped.
        pane.vvalue.set(7.0);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, -200.0);
    }

    #[test]
    fn test_content_shorter_than_viewport_does_not_scroll() {
        let (mut s, pane, _region, _p, c) = pane_with_content(50.0);
        pane.vvalue.set(1.0);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, 0.0);
    }

    #[test]
    fn test_fit_to_height_stretches_content() {
        let (mut s, pane, _region, _p, c) = pane_with_content(50.0);
        pane.fit_to_height.set(true);
        s.pulse();
        assert_eq!(content_bounds(&s, c).h, 100.0);
    }

    #[test]
    fn test_rescale_echo_does_not_relayout() {
        let (mut s, pane, region, p, c) = pane_with_content(200.0);
        pane.vvalue.set(0.5);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, -50.0);

        region.pref_height.set(400.0);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, -50.0);
        assert!((pane.vvalue.get() - 1.0 / 6.0).abs() < 1e-9);

        // The rewritten value arrives as a notification next frame.
        let report = s.pulse();
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.layouts_of(p), 0);
    }

    #[test]
    fn test_scroll_by_moves_by_pixels() {
        let (mut s, _pane, _region, p, c) = pane_with_content(300.0);
        s.skin::<ScrollPaneSkin>(p).unwrap().scroll_by(0.0, 40.0);
        s.pulse();
        assert_eq!(content_bounds(&s, c).y, -40.0);
    }
}
