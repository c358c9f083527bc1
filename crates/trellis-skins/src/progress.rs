use std::f32::consts::TAU;
use std::rc::Rc;

use trellis_core::*;

pub const BAR_HEIGHT: f32 = 6.0;
pub const PREF_WIDTH: f32 = 160.0;
pub const SPINNER_SIZE: f32 = 16.0;
/// One full spinner revolution.
pub const PERIOD: Duration = Duration::from_secs(1);

property_tags! {
    pub enum ProgressProperty {
        Progress,
    }
}

/// Determinate when `progress` is in `[0, 1]`, indeterminate when negative.
pub struct ProgressIndicator {
    pub control: Control,
    pub progress: Property<f64>,
}

impl ProgressIndicator {
    pub const INDETERMINATE: f64 = -1.0;

    pub fn new(progress: f64) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            progress: Property::new(progress),
        })
    }

    pub fn is_indeterminate(&self) -> bool {
        self.progress.get() < 0.0
    }
}

pub struct ProgressSkin {
    indicator: Rc<ProgressIndicator>,
    track: Option<NodeId>,
    bar: Option<NodeId>,
    spinner: Option<NodeId>,
    started: Option<Instant>,
}

impl ProgressSkin {
    pub fn new(indicator: Rc<ProgressIndicator>) -> Self {
        Self {
            indicator,
            track: None,
            bar: None,
            spinner: None,
            started: None,
        }
    }

    pub fn bar(&self) -> Option<NodeId> {
        self.bar
    }

    pub fn spinner(&self) -> Option<NodeId> {
        self.spinner
    }

    fn apply_mode(&mut self, cx: &mut SkinContext<'_, ProgressProperty>) {
        let indeterminate = self.indicator.is_indeterminate();
        for (node, show) in [
            (self.track, !indeterminate),
            (self.bar, !indeterminate),
            (self.spinner, indeterminate),
        ] {
            if let Some(n) = node {
                cx.nodes().set_visible(n, show);
            }
        }
        self.started = indeterminate.then(|| self.started.unwrap_or(cx.now()));
        cx.set_animating(indeterminate);
    }
}

impl Skin for ProgressSkin {
    type Property = ProgressProperty;

    fn name(&self) -> &'static str {
        "ProgressIndicator"
    }

    fn control(&self) -> &Control {
        &self.indicator.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, ProgressProperty>) {
        let root = cx.root();
        let palette = *cx.palette();
        let r = BAR_HEIGHT * 0.5;
        self.track = Some(cx.nodes().add(root, NodeKind::Rect { color: palette.track, radius: r }));
        self.bar = Some(cx.nodes().add(root, NodeKind::Rect { color: palette.primary, radius: r }));
        self.spinner = Some(cx.nodes().add(
            root,
            NodeKind::Rect {
                color: palette.primary,
                radius: 2.0,
            },
        ));
        cx.register(&self.indicator.progress, ProgressProperty::Progress);
        self.apply_mode(cx);
    }

    fn handle_property_changed(
        &mut self,
        p: ProgressProperty,
        cx: &mut SkinContext<'_, ProgressProperty>,
    ) {
        match p {
            ProgressProperty::Progress => {
                self.apply_mode(cx);
                cx.request_layout();
            }
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        if self.indicator.is_indeterminate() {
            SPINNER_SIZE
        } else {
            PREF_WIDTH
        }
    }

    fn compute_pref_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        if self.indicator.is_indeterminate() {
            SPINNER_SIZE
        } else {
            BAR_HEIGHT
        }
    }

    fn compute_min_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        if self.indicator.is_indeterminate() {
            SPINNER_SIZE
        } else {
            0.0
        }
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let fraction = clamp_value(self.indicator.progress.get(), 0.0, 1.0) as f32;
        let bar_h = BAR_HEIGHT.min(content.h);
        if let Some(track) = self.track {
            let size = Size::new(content.w, bar_h);
            cx.position_in_area(track, content, size, HAlign::Left, VAlign::Center);
        }
        if let Some(bar) = self.bar {
            let size = Size::new(content.w * fraction, bar_h);
            cx.position_in_area(bar, content, size, HAlign::Left, VAlign::Center);
        }
        if let Some(spinner) = self.spinner {
            let side = SPINNER_SIZE.min(content.w).min(content.h);
            let size = Size::new(side, side);
            cx.position_in_area(spinner, content, size, HAlign::Center, VAlign::Center);
        }
    }

    fn tick(&mut self, now: Instant, cx: &mut SkinContext<'_, ProgressProperty>) -> bool {
        let (Some(spinner), Some(started)) = (self.spinner, self.started) else {
            return false;
        };
        let elapsed = now.saturating_duration_since(started).as_secs_f32();
        let turns = (elapsed / PERIOD.as_secs_f32()).fract();
        cx.nodes().set_rotation(spinner, turns * TAU);
        true
    }
}
