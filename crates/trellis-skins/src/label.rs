//! Text label with approximate monospace metrics.
//!
//! Every grapheme is `CHAR_WIDTH_EM * font_size` wide and every line is
//! `LINE_HEIGHT_EM * font_size` tall. Good enough to exercise width-dependent
//! heights without a shaping engine.

use std::rc::Rc;

use smallvec::SmallVec;
use trellis_core::*;
use unicode_segmentation::UnicodeSegmentation;

pub const CHAR_WIDTH_EM: f32 = 0.6;
pub const LINE_HEIGHT_EM: f32 = 1.25;
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
/// Ascent of the approximate face, in em.
pub const ASCENT_EM: f32 = 0.8;

pub fn char_width(font_size: f32) -> f32 {
    CHAR_WIDTH_EM * font_size
}

pub fn line_height(font_size: f32) -> f32 {
    LINE_HEIGHT_EM * font_size
}

/// Baseline of a single line box: half the leading plus the ascent.
pub fn baseline(font_size: f32) -> f32 {
    (LINE_HEIGHT_EM - 1.0) * 0.5 * font_size + ASCENT_EM * font_size
}

fn graphemes(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Width of the widest hard line.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let widest = text.split('\n').map(graphemes).max().unwrap_or(0);
    widest as f32 * char_width(font_size)
}

/// Greedy word wrap into lines of at most `max_chars` graphemes. Words longer
/// than a line are split. Always returns at least one line.
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    for hard in text.split('\n') {
        let mut line = String::new();
        let mut len = 0usize;
        for word in hard.split_whitespace() {
            let mut word: Vec<&str> = word.graphemes(true).collect();
            let needed = if len == 0 { word.len() } else { len + 1 + word.len() };
            if needed > max_chars && len > 0 {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            while word.len() > max_chars {
                let rest = word.split_off(max_chars);
                out.push(word.concat());
                word = rest;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.push_str(&word.concat());
            len += word.len();
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

property_tags! {
    pub enum LabelProperty {
        Text,
        FontSize,
        Wrap,
        TextFill,
    }
}

pub struct Label {
    pub control: Control,
    pub text: Property<String>,
    pub font_size: Property<f32>,
    pub wrap: Property<bool>,
    pub text_fill: Property<Option<Color>>,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            text: Property::new(text.into()),
            font_size: Property::new(DEFAULT_FONT_SIZE),
            wrap: Property::new(false),
            text_fill: Property::new(None),
        })
    }

    pub fn wrapping(text: impl Into<String>) -> Rc<Self> {
        let l = Self::new(text);
        l.wrap.set(true);
        l
    }

    fn font(&self) -> f32 {
        let f = self.font_size.get();
        if f.is_finite() && f > 0.0 { f } else { DEFAULT_FONT_SIZE }
    }

    fn lines_for(&self, width: Option<f32>) -> Vec<String> {
        let text = self.text.get();
        match width {
            Some(w) if self.wrap.get() => {
                let max_chars = (w / char_width(self.font())).floor() as usize;
                wrap_lines(&text, max_chars)
            }
            _ => text.split('\n').map(str::to_string).collect(),
        }
    }
}

pub struct LabelSkin {
    label: Rc<Label>,
    fill: Color,
    lines: SmallVec<[NodeId; 2]>,
}

impl LabelSkin {
    pub fn new(label: Rc<Label>) -> Self {
        Self {
            label,
            fill: Color::WHITE,
            lines: SmallVec::new(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Skin for LabelSkin {
    type Property = LabelProperty;

    fn name(&self) -> &'static str {
        "Label"
    }

    fn control(&self) -> &Control {
        &self.label.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, LabelProperty>) {
        self.fill = self.label.text_fill.get().unwrap_or(cx.palette().on_surface);
        cx.register(&self.label.text, LabelProperty::Text);
        cx.register(&self.label.font_size, LabelProperty::FontSize);
        cx.register(&self.label.wrap, LabelProperty::Wrap);
        cx.register(&self.label.text_fill, LabelProperty::TextFill);
    }

    fn handle_property_changed(&mut self, p: LabelProperty, cx: &mut SkinContext<'_, LabelProperty>) {
        match p {
            LabelProperty::Text | LabelProperty::FontSize | LabelProperty::Wrap => {
                cx.request_layout()
            }
            LabelProperty::TextFill => {
                self.fill = self.label.text_fill.get().unwrap_or(cx.palette().on_surface);
                for line in &self.lines {
                    cx.nodes().set_color(*line, self.fill);
                }
            }
        }
    }

    fn content_bias(&self) -> Option<Orientation> {
        self.label.wrap.get().then_some(Orientation::Horizontal)
    }

    fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        text_width(&self.label.text.get(), self.label.font())
    }

    fn compute_pref_height(&self, width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        let lines = self.label.lines_for(width).len().max(1);
        lines as f32 * line_height(self.label.font())
    }

    /// Wrapping labels can shrink to their longest word.
    fn compute_min_width(&self, height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        if !self.label.wrap.get() {
            return self.compute_pref_width(height, cx);
        }
        let text = self.label.text.get();
        let longest = text.split_whitespace().map(graphemes).max().unwrap_or(0);
        longest as f32 * char_width(self.label.font())
    }

    fn compute_baseline_offset(&self, _cx: &MeasureContext<'_>) -> Option<f32> {
        Some(baseline(self.label.font()))
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let font = self.label.font();
        let lines = self.label.lines_for(Some(content.w));
        let root = cx.root();

        while self.lines.len() > lines.len() {
            if let Some(n) = self.lines.pop() {
                cx.nodes().remove(n);
            }
        }
        while self.lines.len() < lines.len() {
            let node = cx.nodes().add(
                root,
                NodeKind::Text {
                    text: String::new(),
                    color: self.fill,
                    size: font,
                },
            );
            self.lines.push(node);
        }

        let lh = line_height(font);
        for (i, (node, text)) in self.lines.iter().zip(&lines).enumerate() {
            let w = graphemes(text) as f32 * char_width(font);
            cx.nodes().set_text(*node, text.as_str());
            cx.resize_relocate(
                *node,
                Rect::new(content.x, content.y + i as f32 * lh, w.min(content.w), lh),
            );
        }
    }
}
