//! Contexts handed to skins.
//!
//! - [`SkinContext`]: install, change handlers, ticks and dispose. Nodes may
//!   be created and restyled; geometry may not be touched.
//! - [`MeasureContext`]: read-only, answers size queries about children.
//! - [`LayoutContext`]: the position pass. The only way to move or resize a
//!   node or lay out a child skin.

use std::marker::PhantomData;
use std::rc::Rc;

use smallvec::SmallVec;
use web_time::Instant;

use crate::controller::Measure;
use crate::error::{LayoutFailure, guarded};
use crate::scheduler::{FrameReport, SharedQueue, SkinArena};
use crate::skin::ErasedSkin;
use crate::{
    HAlign, Node, NodeId, NodeTree, Orientation, Palette, PixelSnap, Property, PropertyTag, Rect,
    SessionConfig, Size, SkinId, Subscription, VAlign,
};

pub(crate) struct Parts<'a> {
    pub(crate) id: SkinId,
    pub(crate) skins: &'a mut SkinArena,
    pub(crate) nodes: &'a mut NodeTree,
    pub(crate) queue: &'a SharedQueue,
    pub(crate) config: &'a SessionConfig,
    pub(crate) now: Instant,
}

/// Subscribes to `property` so that every change enqueues `(id, raw)`.
pub(crate) fn enqueue_on_change<T: 'static>(
    property: &Property<T>,
    queue: &SharedQueue,
    id: SkinId,
    raw: u32,
) -> Subscription {
    let queue = Rc::downgrade(queue);
    property.subscribe(move |_, _| {
        if let Some(q) = queue.upgrade() {
            q.borrow_mut().push(id, raw);
        }
    })
}

/// Marks `id` and its ancestors dirty. Returns `false` if `id` is unknown or
/// disposed.
pub(crate) fn request_layout_chain(skins: &mut SkinArena, id: SkinId) -> bool {
    let Some(rec) = skins.get_mut(id) else {
        return false;
    };
    if !rec.controller.request_layout() {
        return false;
    }
    let mut cur = rec.parent;
    while let Some(p) = cur {
        let Some(rec) = skins.get_mut(p) else { break };
        if !rec.controller.request_layout() {
            break;
        }
        cur = rec.parent;
    }
    true
}

pub struct SkinContext<'a, P> {
    parts: Parts<'a>,
    _tag: PhantomData<fn() -> P>,
}

impl<'a, P: PropertyTag> SkinContext<'a, P> {
    pub(crate) fn new(parts: Parts<'a>) -> Self {
        Self {
            parts,
            _tag: PhantomData,
        }
    }

    pub fn id(&self) -> SkinId {
        self.parts.id
    }

    /// Group node owned by this skin; everything the skin draws hangs below.
    pub fn root(&self) -> NodeId {
        self.parts
            .skins
            .get(self.parts.id)
            .map(|r| r.root)
            .unwrap_or_default()
    }

    pub fn nodes(&mut self) -> &mut NodeTree {
        &mut *self.parts.nodes
    }

    pub fn config(&self) -> &SessionConfig {
        self.parts.config
    }

    pub fn palette(&self) -> &Palette {
        &self.parts.config.palette
    }

    pub fn snap(&self) -> PixelSnap {
        self.parts.config.pixel_snap()
    }

    pub fn now(&self) -> Instant {
        self.parts.now
    }

    /// Starts observing `property`. A later registration under the same tag,
    /// or for the same property, replaces this one.
    pub fn register<T: 'static>(&mut self, property: &Property<T>, tag: P) {
        let id = self.parts.id;
        let Some(rec) = self.parts.skins.get_mut(id) else {
            return;
        };
        if rec.controller.is_disposed() {
            return;
        }
        let raw = tag.to_raw();
        let sub = enqueue_on_change(property, self.parts.queue, id, raw);
        rec.controller.register(raw, sub);
    }

    pub fn unregister(&mut self, tag: P) -> bool {
        self.parts
            .skins
            .get_mut(self.parts.id)
            .is_some_and(|r| r.controller.unregister(tag.to_raw()))
    }

    /// Schedules a position pass for this skin (and its ancestors) in the
    /// coming layout phase.
    pub fn request_layout(&mut self) {
        request_layout_chain(self.parts.skins, self.parts.id);
    }

    /// Keeps `tick` running every frame until it returns `false`.
    pub fn set_animating(&mut self, on: bool) {
        if let Some(rec) = self.parts.skins.get_mut(self.parts.id) {
            rec.controller.set_animating(on);
        }
    }

    pub fn children(&self) -> &[SkinId] {
        self.parts
            .skins
            .get(self.parts.id)
            .map(|r| &r.children[..])
            .unwrap_or(&[])
    }

    pub fn child_root(&self, child: SkinId) -> Option<NodeId> {
        self.parts.skins.get(child).map(|r| r.root)
    }

    pub fn measure(&self) -> MeasureContext<'_> {
        MeasureContext {
            skins: &*self.parts.skins,
            snap: self.parts.config.pixel_snap(),
            id: self.parts.id,
        }
    }
}

pub struct MeasureContext<'a> {
    skins: &'a SkinArena,
    snap: PixelSnap,
    id: SkinId,
}

impl<'a> MeasureContext<'a> {
    pub fn snap(&self) -> PixelSnap {
        self.snap
    }

    pub fn children(&self) -> &'a [SkinId] {
        self.skins
            .get(self.id)
            .map(|r| &r.children[..])
            .unwrap_or(&[])
    }

    pub fn is_visible(&self, child: SkinId) -> bool {
        self.skins
            .get(child)
            .is_some_and(|r| r.control.visible().get())
    }

    pub fn content_bias(&self, child: SkinId) -> Option<Orientation> {
        self.skins
            .get(child)
            .and_then(|r| r.skin.as_deref())
            .and_then(|s| s.content_bias())
    }

    pub fn min_width(&self, child: SkinId, height: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::MinWidth, height)
    }

    pub fn min_height(&self, child: SkinId, width: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::MinHeight, width)
    }

    pub fn pref_width(&self, child: SkinId, height: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::PrefWidth, height)
    }

    pub fn pref_height(&self, child: SkinId, width: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::PrefHeight, width)
    }

    pub fn max_width(&self, child: SkinId, height: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::MaxWidth, height)
    }

    pub fn max_height(&self, child: SkinId, width: Option<f32>) -> f32 {
        measure(self.skins, self.snap, child, Measure::MaxHeight, width)
    }

    /// Preferred size, resolving the biased axis first.
    pub fn pref_size(&self, child: SkinId) -> Size {
        pref_size(self.skins, self.snap, child)
    }

    /// Distance from the top of `child`'s box to its first baseline,
    /// padding included.
    pub fn baseline_offset(&self, child: SkinId) -> f32 {
        baseline_offset(self.skins, self.snap, child)
    }
}

pub(crate) fn baseline_offset(skins: &SkinArena, snap: PixelSnap, id: SkinId) -> f32 {
    let Some(rec) = skins.get(id) else {
        return 0.0;
    };
    let Some(skin) = rec.skin.as_deref().filter(|_| !rec.controller.is_disposed()) else {
        return 0.0;
    };
    let cx = MeasureContext { skins, snap, id };
    match guarded("baseline", rec.name, || skin.baseline_offset(&cx)) {
        Ok(Some(offset)) => {
            let top = snap.snap_insets(rec.control.padding().get()).top;
            snap.snap_position(top + crate::sanitize_extent(offset))
        }
        _ => pref_size(skins, snap, id).height,
    }
}

pub(crate) fn pref_size(skins: &SkinArena, snap: PixelSnap, id: SkinId) -> Size {
    let bias = skins
        .get(id)
        .and_then(|r| r.skin.as_deref())
        .and_then(|s| s.content_bias());
    if bias == Some(Orientation::Vertical) {
        let h = measure(skins, snap, id, Measure::PrefHeight, None);
        Size::new(measure(skins, snap, id, Measure::PrefWidth, Some(h)), h)
    } else {
        let w = measure(skins, snap, id, Measure::PrefWidth, None);
        Size::new(w, measure(skins, snap, id, Measure::PrefHeight, Some(w)))
    }
}

/// Measures `id` including its padding. The cross-axis hint is kept only when
/// the skin's content bias asks for it.
pub(crate) fn measure(
    skins: &SkinArena,
    snap: PixelSnap,
    id: SkinId,
    m: Measure,
    hint: Option<f32>,
) -> f32 {
    let Some(rec) = skins.get(id) else {
        return 0.0;
    };
    if rec.controller.is_disposed() {
        return 0.0;
    }
    let bias = match rec.skin.as_deref() {
        Some(skin) => skin.content_bias(),
        None => rec.busy_bias,
    };
    let hint = match (m.is_width(), bias) {
        (true, Some(Orientation::Vertical)) | (false, Some(Orientation::Horizontal)) => hint,
        _ => None,
    };
    let Some(skin) = rec.skin.as_deref() else {
        log::debug!("{}: measured while busy; using cached size", rec.name);
        return rec.controller.cached(m, hint).unwrap_or(0.0);
    };
    if let Some(v) = rec.controller.cached(m, hint) {
        return v;
    }
    let insets = snap.snap_insets(rec.control.padding().get());
    let (along, across) = if m.is_width() {
        (insets.horizontal(), insets.vertical())
    } else {
        (insets.vertical(), insets.horizontal())
    };
    let inner_hint = hint.map(|h| (crate::sanitize_extent(h) - across).max(0.0));
    let cx = MeasureContext { skins, snap, id };
    let raw = guarded("measure", rec.name, || skin.measure(m, inner_hint, &cx)).unwrap_or(0.0);
    let content = if raw.is_nan() || raw < 0.0 {
        log::warn!("{}: {m:?} returned {raw}; using 0", rec.name);
        0.0
    } else {
        raw
    };
    let v = snap.snap_size(content + along);
    rec.controller.store(m, hint, v);
    v
}

pub(crate) struct PassParts<'a> {
    pub(crate) skins: &'a mut SkinArena,
    pub(crate) nodes: &'a mut NodeTree,
    pub(crate) snap: PixelSnap,
    pub(crate) report: &'a mut FrameReport,
}

impl PassParts<'_> {
    fn reborrow(&mut self) -> PassParts<'_> {
        PassParts {
            skins: &mut *self.skins,
            nodes: &mut *self.nodes,
            snap: self.snap,
            report: &mut *self.report,
        }
    }
}

/// Runs the position pass of `id` over `area` (in its parent's space) if the
/// controller wants one. Returns the snapped area.
pub(crate) fn layout_skin(pass: &mut PassParts<'_>, id: SkinId, area: Rect) -> Rect {
    let snap = pass.snap;
    let clean = area.sanitized();
    if clean != area {
        log::warn!("layout area {area:?} is not a valid rectangle; clamped to {clean:?}");
    }
    let area = snap.snap_rect(clean);
    let Some(rec) = pass.skins.get_mut(id) else {
        return area;
    };
    if !rec.controller.wants_pass(area) {
        return area;
    }
    let Some(mut skin) = rec.take_skin() else {
        log::warn!("{}: re-entrant layout ignored", rec.name);
        return area;
    };
    rec.controller.begin_layout();
    rec.control.set_layout_bounds(area);
    let (root, name) = (rec.root, rec.name);
    let insets = snap.snap_insets(rec.control.padding().get());
    pass.nodes.relocate(root, area.x, area.y);
    pass.nodes.resize(root, area.w, area.h);
    let content = Rect::new(0.0, 0.0, area.w, area.h).inset(insets);
    pass.report.laid_out.push(id);

    let result = {
        let mut cx = LayoutContext {
            pass: pass.reborrow(),
            id,
        };
        guarded("layout_children", name, || skin.layout_children(content, &mut cx))
    };

    if let Some(rec) = pass.skins.get_mut(id) {
        rec.skin = Some(skin);
        match result {
            Ok(()) => rec.controller.commit_layout(area),
            Err(message) => {
                rec.controller.fail_layout(area);
                pass.report.failures.push(LayoutFailure {
                    skin: id,
                    name,
                    message,
                });
            }
        }
    }
    area
}

pub struct LayoutContext<'a> {
    pass: PassParts<'a>,
    id: SkinId,
}

impl LayoutContext<'_> {
    pub fn id(&self) -> SkinId {
        self.id
    }

    pub fn snap(&self) -> PixelSnap {
        self.pass.snap
    }

    pub fn nodes(&mut self) -> &mut NodeTree {
        &mut *self.pass.nodes
    }

    pub fn root(&self) -> NodeId {
        self.child_root(self.id).unwrap_or_default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.pass.nodes.get(id)
    }

    pub fn measure(&self) -> MeasureContext<'_> {
        MeasureContext {
            skins: &*self.pass.skins,
            snap: self.pass.snap,
            id: self.id,
        }
    }

    pub fn children(&self) -> SmallVec<[SkinId; 4]> {
        self.pass
            .skins
            .get(self.id)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    pub fn child_root(&self, child: SkinId) -> Option<NodeId> {
        self.pass.skins.get(child).map(|r| r.root)
    }

    pub fn pref_width(&self, child: SkinId, height: Option<f32>) -> f32 {
        self.measure().pref_width(child, height)
    }

    pub fn pref_height(&self, child: SkinId, width: Option<f32>) -> f32 {
        self.measure().pref_height(child, width)
    }

    pub fn pref_size(&self, child: SkinId) -> Size {
        self.measure().pref_size(child)
    }

    /// Positions `child` at `area` and runs its position pass. `area` is in
    /// the space of the node hosting the child (see `Skin::child_container`).
    /// Only attached children can be laid out.
    pub fn layout_child(&mut self, child: SkinId, area: Rect) -> Rect {
        let owned = self
            .pass
            .skins
            .get(child)
            .is_some_and(|r| r.parent == Some(self.id));
        if !owned {
            log::warn!("layout_child: {child:?} is not a child of {:?}", self.id);
            return Rect::ZERO;
        }
        layout_skin(&mut self.pass.reborrow(), child, area)
    }

    /// Lays `child` out at its preferred size, bounded by its min and max
    /// and cut to `area`, aligned inside `area`.
    pub fn layout_in_area(
        &mut self,
        child: SkinId,
        area: Rect,
        halign: HAlign,
        valign: VAlign,
    ) -> Rect {
        let size = {
            let m = self.measure();
            let bounded = |min: f32, pref: f32, max: f32| pref.min(max).max(min);
            if m.content_bias(child) == Some(Orientation::Vertical) {
                let h = bounded(
                    m.min_height(child, None),
                    m.pref_height(child, None),
                    m.max_height(child, None),
                )
                .min(area.h);
                let w = bounded(
                    m.min_width(child, Some(h)),
                    m.pref_width(child, Some(h)),
                    m.max_width(child, Some(h)),
                )
                .min(area.w);
                Size::new(w, h)
            } else {
                let w = bounded(
                    m.min_width(child, None),
                    m.pref_width(child, None),
                    m.max_width(child, None),
                )
                .min(area.w);
                let h = bounded(
                    m.min_height(child, Some(w)),
                    m.pref_height(child, Some(w)),
                    m.max_height(child, Some(w)),
                )
                .min(area.h);
                Size::new(w, h)
            }
        };
        self.layout_child(child, area.align(size, halign, valign))
    }

    /// Sizes `node` to `size` and aligns it inside `area`.
    pub fn position_in_area(
        &mut self,
        node: NodeId,
        area: Rect,
        size: Size,
        halign: HAlign,
        valign: VAlign,
    ) {
        self.resize_relocate(node, area.align(size, halign, valign));
    }

    pub fn relocate(&mut self, node: NodeId, x: f32, y: f32) {
        let s = self.pass.snap;
        self.pass
            .nodes
            .relocate(node, s.snap_position(x), s.snap_position(y));
    }

    pub fn resize(&mut self, node: NodeId, w: f32, h: f32) {
        let s = self.pass.snap;
        let (w, h) = (crate::sanitize_extent(w), crate::sanitize_extent(h));
        self.pass.nodes.resize(node, s.snap_size(w), s.snap_size(h));
    }

    pub fn resize_relocate(&mut self, node: NodeId, r: Rect) {
        let r = self.pass.snap.snap_rect(r.sanitized());
        self.pass.nodes.relocate(node, r.x, r.y);
        self.pass.nodes.resize(node, r.w, r.h);
    }

    /// A request made while laying out takes effect next frame.
    pub fn request_layout(&mut self) {
        request_layout_chain(self.pass.skins, self.id);
    }
}
