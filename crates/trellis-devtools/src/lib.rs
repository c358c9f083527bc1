use std::fmt::Write as _;

use web_time::Instant;

use trellis_core::{Color, FrameReport, FrameScheduler, Rect, Scene, SceneNode, SkinId};

pub struct Hud {
    pub inspector_enabled: bool,
    pub highlighted: Option<SkinId>,
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
    pub stats: Option<FrameStats>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            highlighted: None,
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
            stats: None,
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
    }

    pub fn highlight(&mut self, id: Option<SkinId>) {
        self.highlighted = id;
    }

    pub fn fps(&self) -> f32 {
        self.fps_smooth
    }

    pub fn overlay(&mut self, scene: &mut Scene) {
        self.overlay_at(Instant::now(), scene);
    }

    /// Draws the status line as of `now`, normally the session clock.
    pub fn overlay_at(&mut self, now: Instant, scene: &mut Scene) {
        self.frame_count += 1;
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = now.saturating_duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                // EMA
                let a = 0.2;
                self.fps_smooth = if self.fps_smooth == 0.0 {
                    fps
                } else {
                    (1.0 - a) * self.fps_smooth + a * fps
                };
            }
        }
        scene.nodes.push(SceneNode::Text {
            rect: Rect::new(8.0, 8.0, 320.0, 16.0),
            text: self.status_line(),
            color: Color::from_hex("#AAAAAA"),
            size: 14.0,
        });
    }

    pub fn status_line(&self) -> String {
        let mut lines = vec![
            format!("frame: {}", self.frame_count),
            format!("fps: {:.1}", self.fps_smooth),
        ];
        if let Some(s) = &self.stats {
            lines.push(format!("dispatched: {}", s.dispatched));
            if s.deferred > 0 {
                lines.push(format!("deferred: {}", s.deferred));
            }
            lines.push(format!("layouts: {}", s.laid_out));
            if s.failures > 0 {
                lines.push(format!("failures: {}", s.failures));
            }
            lines.push(format!("nodes: {}", s.scene_nodes));
        }
        lines.join("  |  ")
    }
}

/// Counters taken from one `FrameReport`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub ticked: usize,
    pub dispatched: usize,
    pub deferred: usize,
    pub laid_out: usize,
    pub failures: usize,
    pub scene_nodes: usize,
}

impl From<&FrameReport> for FrameStats {
    fn from(r: &FrameReport) -> Self {
        Self {
            frame: r.frame,
            ticked: r.ticked,
            dispatched: r.dispatched,
            deferred: r.deferred,
            laid_out: r.laid_out.len(),
            failures: r.failures.len(),
            scene_nodes: 0,
        }
    }
}

/// Outlines the skins that ran a position pass in the last frame.
pub struct LayoutInspector {
    pub hud: Hud,
    pub outline: Color,
    pub failure: Color,
}

impl Default for LayoutInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutInspector {
    pub fn new() -> Self {
        Self {
            hud: Hud::new(),
            outline: Color::from_hex("#44AAFF").with_alpha(48),
            failure: Color::from_hex("#FF4444").with_alpha(96),
        }
    }

    /// Call after `paint` with the report of the same frame.
    pub fn frame(&mut self, session: &FrameScheduler, report: &FrameReport, scene: &mut Scene) {
        let mut stats = FrameStats::from(report);
        stats.scene_nodes = scene.nodes.len();
        self.hud.stats = Some(stats);
        for f in &report.failures {
            log::warn!("frame {}: {} ({:?}) failed: {}", report.frame, f.name, f.skin, f.message);
        }
        if !self.hud.inspector_enabled {
            return;
        }

        let bounds = |id: SkinId| {
            session
                .root_node(id)
                .and_then(|n| session.nodes().absolute_bounds(n))
        };
        for id in &report.laid_out {
            if let Some(rect) = bounds(*id) {
                scene.nodes.push(SceneNode::Rect {
                    rect,
                    color: self.outline,
                    radius: 0.0,
                    rotation: 0.0,
                });
            }
        }
        for f in &report.failures {
            if let Some(rect) = bounds(f.skin) {
                scene.nodes.push(SceneNode::Rect {
                    rect,
                    color: self.failure,
                    radius: 0.0,
                    rotation: 0.0,
                });
            }
        }
        if let Some(rect) = self.hud.highlighted.and_then(bounds) {
            scene.nodes.push(SceneNode::Rect {
                rect,
                color: self.outline.with_alpha(128),
                radius: 0.0,
                rotation: 0.0,
            });
        }
        self.hud.overlay_at(session.now(), scene);
    }

    /// Skin tree of every root: name, state and last committed area.
    pub fn dump(session: &FrameScheduler) -> String {
        let mut out = String::new();
        for (id, _) in session.roots() {
            dump_skin(session, id, 0, &mut out);
        }
        out
    }
}

fn dump_skin(session: &FrameScheduler, id: SkinId, depth: usize, out: &mut String) {
    let name = session.name(id).unwrap_or("?");
    let area = match session.controller(id).and_then(|c| c.last_area()) {
        Some(r) => format!("{},{} {}x{}", r.x, r.y, r.w, r.h),
        None => "unplaced".to_string(),
    };
    let _ = writeln!(
        out,
        "{}{name} {:?} {area}",
        "  ".repeat(depth),
        session.state(id)
    );
    for child in session.children(id) {
        dump_skin(session, *child, depth + 1, out);
    }
}
