use std::rc::Rc;

use trellis_core::*;

use crate::label::{DEFAULT_FONT_SIZE, baseline, line_height, text_width};

pub const HEADER_HEIGHT: f32 = 24.0;
pub const TITLE_PADDING: f32 = 8.0;

property_tags! {
    pub enum TitledPaneProperty {
        Title,
        Expanded,
        Animated,
    }
}

/// Collapsible section: a header with a title and one content skin below it.
pub struct TitledPane {
    pub control: Control,
    pub title: Property<String>,
    pub expanded: Property<bool>,
    pub animated: Property<bool>,
}

impl TitledPane {
    pub fn new(title: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            title: Property::new(title.into()),
            expanded: Property::new(true),
            animated: Property::new(true),
        })
    }
}

pub struct TitledPaneSkin {
    pane: Rc<TitledPane>,
    header: Option<NodeId>,
    title: Option<NodeId>,
    container: Option<NodeId>,
    /// Visible share of the content height, 0 collapsed to 1 expanded.
    fraction: AnimatedValue<f32>,
}

impl TitledPaneSkin {
    pub fn new(pane: Rc<TitledPane>) -> Self {
        let open = if pane.expanded.get() { 1.0 } else { 0.0 };
        Self {
            pane,
            header: None,
            title: None,
            container: None,
            fraction: AnimatedValue::new(open, AnimationSpec::default()),
        }
    }

    pub fn fraction(&self) -> f32 {
        *self.fraction.get()
    }

    fn content_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        cx.children()
            .first()
            .map_or(0.0, |c| cx.pref_height(*c, width))
    }
}

impl Skin for TitledPaneSkin {
    type Property = TitledPaneProperty;

    fn name(&self) -> &'static str {
        "TitledPane"
    }

    fn control(&self) -> &Control {
        &self.pane.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, TitledPaneProperty>) {
        let root = cx.root();
        let palette = *cx.palette();
        self.header = Some(cx.nodes().add(
            root,
            NodeKind::Rect {
                color: palette.surface,
                radius: 0.0,
            },
        ));
        self.title = Some(cx.nodes().add(
            root,
            NodeKind::Text {
                text: self.pane.title.get(),
                color: palette.on_surface,
                size: DEFAULT_FONT_SIZE,
            },
        ));
        let container = cx.nodes().add(root, NodeKind::Group);
        cx.nodes().set_clip(container, true);
        self.container = Some(container);

        cx.register(&self.pane.title, TitledPaneProperty::Title);
        cx.register(&self.pane.expanded, TitledPaneProperty::Expanded);
        cx.register(&self.pane.animated, TitledPaneProperty::Animated);
    }

    fn handle_property_changed(
        &mut self,
        p: TitledPaneProperty,
        cx: &mut SkinContext<'_, TitledPaneProperty>,
    ) {
        match p {
            TitledPaneProperty::Title => {
                if let Some(t) = self.title {
                    cx.nodes().set_text(t, self.pane.title.get());
                }
                cx.request_layout();
            }
            TitledPaneProperty::Expanded => {
                let target = if self.pane.expanded.get() { 1.0 } else { 0.0 };
                if self.pane.animated.get() {
                    self.fraction.set_target(target, cx.now());
                    cx.set_animating(true);
                } else {
                    self.fraction.snap_to(target);
                }
                cx.request_layout();
            }
            TitledPaneProperty::Animated => {
                // Turning animation off finishes a running transition.
                if !self.pane.animated.get() && self.fraction.is_animating() {
                    let target = *self.fraction.target();
                    self.fraction.snap_to(target);
                    cx.set_animating(false);
                    cx.request_layout();
                }
            }
        }
    }

    fn compute_pref_width(&self, height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        let title = text_width(&self.pane.title.get(), DEFAULT_FONT_SIZE) + 2.0 * TITLE_PADDING;
        let content = cx
            .children()
            .first()
            .map_or(0.0, |c| cx.pref_width(*c, height));
        title.max(content)
    }

    fn compute_pref_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        HEADER_HEIGHT + self.content_height(width, cx) * self.fraction()
    }

    fn compute_min_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        HEADER_HEIGHT
    }

    /// The title's baseline.
    fn compute_baseline_offset(&self, _cx: &MeasureContext<'_>) -> Option<f32> {
        let lh = line_height(DEFAULT_FONT_SIZE);
        Some((HEADER_HEIGHT - lh) * 0.5 + baseline(DEFAULT_FONT_SIZE))
    }

    fn child_container(&self) -> Option<NodeId> {
        self.container
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let (Some(header), Some(title), Some(container)) = (self.header, self.title, self.container)
        else {
            return;
        };
        let header_h = HEADER_HEIGHT.min(content.h);
        cx.resize_relocate(header, Rect::new(content.x, content.y, content.w, header_h));
        let lh = line_height(DEFAULT_FONT_SIZE);
        let tw = text_width(&self.pane.title.get(), DEFAULT_FONT_SIZE);
        let room = (content.w - 2.0 * TITLE_PADDING).max(0.0);
        cx.position_in_area(
            title,
            Rect::new(content.x + TITLE_PADDING, content.y, room, HEADER_HEIGHT),
            Size::new(tw.min(room), lh),
            HAlign::Left,
            VAlign::Center,
        );

        let body_h = (content.h - HEADER_HEIGHT).max(0.0);
        let open = self.fraction() > 0.0 && body_h > 0.0;
        cx.nodes().set_visible(container, open);
        cx.resize_relocate(
            container,
            Rect::new(content.x, content.y + HEADER_HEIGHT, content.w, body_h),
        );

        let children = cx.children();
        if let Some(&child) = children.first() {
            // Full height; the container clips the part not yet revealed.
            let h = cx.pref_height(child, Some(content.w));
            cx.layout_child(child, Rect::new(0.0, 0.0, content.w, h));
        }
    }

    fn tick(&mut self, now: Instant, cx: &mut SkinContext<'_, TitledPaneProperty>) -> bool {
        let running = self.fraction.update(now);
        cx.request_layout();
        running
    }
}
