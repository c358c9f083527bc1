use std::fmt::Write as _;

use crate::{Color, Rect};

/// Renderable scene: what the backend receives after a frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        color: Color,
        radius: f32,
        rotation: f32,
    },
    Text {
        rect: Rect,
        text: String,
        color: Color,
        size: f32,
    },
    PushClip {
        rect: Rect,
    },
    PopClip,
}

impl Scene {
    /// One line per node; stable across runs, used by snapshot tests and the
    /// demo.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for n in &self.nodes {
            if matches!(n, SceneNode::PopClip) {
                depth = depth.saturating_sub(1);
            }
            let pad = "  ".repeat(depth);
            let _ = match n {
                SceneNode::Rect { rect, color, .. } => {
                    writeln!(out, "{pad}rect {} {}", fmt_rect(rect), color.to_hex())
                }
                SceneNode::Text { rect, text, .. } => {
                    writeln!(out, "{pad}text {} {text:?}", fmt_rect(rect))
                }
                SceneNode::PushClip { rect } => writeln!(out, "{pad}clip {}", fmt_rect(rect)),
                SceneNode::PopClip => writeln!(out, "{pad}end"),
            };
            if matches!(n, SceneNode::PushClip { .. }) {
                depth += 1;
            }
        }
        out
    }
}

fn fmt_rect(r: &Rect) -> String {
    format!("{},{} {}x{}", r.x, r.y, r.w, r.h)
}
