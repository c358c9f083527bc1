//! # Frame scheduler
//!
//! One `FrameScheduler` per UI session. It owns every installed skin, the
//! node tree they draw into and the queue of pending property changes, and it
//! advances the session one frame at a time with [`FrameScheduler::pulse`]:
//!
//! 1. Animation ticks for skins that asked for them.
//! 2. Change dispatch: queued `(skin, tag)` notifications are handled in the
//!    order they were raised. Changes raised by handlers join the same batch.
//!    Duplicate notifications still pending collapse into one.
//! 3. Layout: every root whose subtree is dirty gets one position pass.
//!
//! Requests raised during step 3 are recorded and served by the next pulse.
//! Everything runs on the thread that owns the scheduler.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use web_time::Instant;

use crate::context::{Parts, PassParts, enqueue_on_change, layout_skin, request_layout_chain};
use crate::controller::Measure;
use crate::error::{LayoutError, LayoutFailure, guarded};
use crate::skin::ErasedSkin;
use crate::{
    Clock, Control, LayoutController, LayoutState, NodeId, NodeKind, NodeTree, Orientation,
    PixelSnap, Rect, Scene, SessionConfig, Size, Skin, SystemClock,
};

new_key_type! {
    pub struct SkinId;
}

// Tags reserved for the control's own properties; skin tags are small indices.
pub(crate) const CONTROL_PADDING: u32 = u32::MAX;
pub(crate) const CONTROL_VISIBLE: u32 = u32::MAX - 1;

pub(crate) struct SkinRecord {
    pub(crate) skin: Option<Box<dyn ErasedSkin>>,
    pub(crate) name: &'static str,
    pub(crate) controller: LayoutController,
    pub(crate) control: Control,
    pub(crate) root: NodeId,
    pub(crate) parent: Option<SkinId>,
    pub(crate) children: SmallVec<[SkinId; 4]>,
    /// Content bias of the skin while it is taken out of `skin`.
    pub(crate) busy_bias: Option<Orientation>,
}

impl SkinRecord {
    /// Takes the skin out of its slot for a call that needs the arena.
    pub(crate) fn take_skin(&mut self) -> Option<Box<dyn ErasedSkin>> {
        let skin = self.skin.take()?;
        self.busy_bias = skin.content_bias();
        Some(skin)
    }
}

pub(crate) type SkinArena = SlotMap<SkinId, SkinRecord>;

/// Where a replaced skin sat, so that its successor can take over.
#[derive(Default)]
struct Placement {
    slot: Slot,
    children: SmallVec<[SkinId; 4]>,
}

#[derive(Default)]
enum Slot {
    Child {
        parent: SkinId,
        index: usize,
        node_index: Option<usize>,
    },
    Root {
        index: usize,
        area: Rect,
    },
    #[default]
    Detached,
}

#[derive(Default)]
pub(crate) struct ChangeQueue {
    pending: VecDeque<(SkinId, u32)>,
    queued: HashSet<(SkinId, u32)>,
}

impl ChangeQueue {
    pub(crate) fn push(&mut self, id: SkinId, tag: u32) {
        if self.queued.insert((id, tag)) {
            self.pending.push_back((id, tag));
        }
    }

    fn pop(&mut self) -> Option<(SkinId, u32)> {
        let next = self.pending.pop_front()?;
        self.queued.remove(&next);
        Some(next)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

pub(crate) type SharedQueue = Rc<RefCell<ChangeQueue>>;

/// What one pulse did.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    pub frame: u64,
    /// Skins whose `tick` ran.
    pub ticked: usize,
    /// Change notifications handled.
    pub dispatched: usize,
    /// Notifications left for the next frame by the dispatch budget.
    pub deferred: usize,
    /// Skins that ran a position pass, parents before children.
    pub laid_out: Vec<SkinId>,
    pub failures: Vec<LayoutFailure>,
}

impl FrameReport {
    pub fn layouts_of(&self, id: SkinId) -> usize {
        self.laid_out.iter().filter(|s| **s == id).count()
    }

    pub fn is_idle(&self) -> bool {
        self.ticked == 0 && self.dispatched == 0 && self.laid_out.is_empty()
    }
}

pub struct FrameScheduler {
    config: SessionConfig,
    snap: PixelSnap,
    clock: Box<dyn Clock>,
    skins: SkinArena,
    nodes: NodeTree,
    queue: SharedQueue,
    roots: Vec<(SkinId, Rect)>,
    frame: u64,
}

impl FrameScheduler {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: SessionConfig, clock: impl Clock) -> Self {
        log::debug!(
            "FrameScheduler: scale={} snap={}",
            config.render_scale,
            config.snap_to_pixel
        );
        Self {
            snap: config.pixel_snap(),
            config,
            clock: Box::new(clock),
            skins: SlotMap::with_key(),
            nodes: NodeTree::new(),
            queue: Rc::new(RefCell::new(ChangeQueue::default())),
            roots: Vec::new(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snap(&self) -> PixelSnap {
        self.snap
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn nodes(&self) -> &NodeTree {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.skins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skins.is_empty()
    }

    fn parts(&mut self, id: SkinId, now: Instant) -> Parts<'_> {
        Parts {
            id,
            skins: &mut self.skins,
            nodes: &mut self.nodes,
            queue: &self.queue,
            config: &self.config,
            now,
        }
    }

    /// Installs `skin` for its control. A skin this session already holds for
    /// the same control is disposed first, and the new skin takes over its
    /// place: its parent and index there, or its root area, and its attached
    /// children.
    pub fn install<S: Skin>(&mut self, skin: S) -> SkinId {
        let control = skin.control().clone();
        let previous = control
            .skin()
            .filter(|old| {
                self.skins
                    .get(*old)
                    .is_some_and(|r| r.control.same_control(&control))
            })
            .map(|old| {
                log::debug!("install: replacing skin {old:?}");
                let placement = self.placement(old);
                self.dispose(old);
                placement
            });
        let name = skin.name();
        let root = self.nodes.create(NodeKind::Group);
        let id = self.skins.insert(SkinRecord {
            skin: None,
            name,
            controller: LayoutController::new(),
            control: control.clone(),
            root,
            parent: None,
            children: SmallVec::new(),
            busy_bias: None,
        });
        control.set_skin(Some(id));
        self.nodes.set_visible(root, control.visible().get());

        let padding = enqueue_on_change(control.padding(), &self.queue, id, CONTROL_PADDING);
        let visible = enqueue_on_change(control.visible(), &self.queue, id, CONTROL_VISIBLE);
        if let Some(rec) = self.skins.get_mut(id) {
            rec.controller.register(CONTROL_PADDING, padding);
            rec.controller.register(CONTROL_VISIBLE, visible);
        }

        let mut boxed: Box<dyn ErasedSkin> = Box::new(skin);
        let now = self.clock.now();
        let installed = guarded("install", name, || boxed.install(self.parts(id, now)));
        if let Some(rec) = self.skins.get_mut(id) {
            rec.skin = Some(boxed);
        }
        if installed.is_err() {
            log::warn!("{name}: installed with a failed install hook");
        }
        log::debug!("installed {name} as {id:?}");
        if let Some(placement) = previous {
            self.restore(id, placement);
        }
        id
    }

    fn placement(&self, id: SkinId) -> Placement {
        let Some(rec) = self.skins.get(id) else {
            return Placement::default();
        };
        let slot = if let Some(parent) = rec.parent {
            let index = self
                .children(parent)
                .iter()
                .position(|c| *c == id)
                .unwrap_or(usize::MAX);
            let node_index = self
                .nodes
                .get(rec.root)
                .and_then(|n| n.parent())
                .and_then(|host| self.nodes.get(host))
                .and_then(|host| host.children().iter().position(|n| *n == rec.root));
            Slot::Child {
                parent,
                index,
                node_index,
            }
        } else if let Some(index) = self.roots.iter().position(|(r, _)| *r == id) {
            Slot::Root {
                index,
                area: self.roots[index].1,
            }
        } else {
            Slot::Detached
        };
        Placement {
            slot,
            children: rec.children.clone(),
        }
    }

    fn restore(&mut self, id: SkinId, placement: Placement) {
        match placement.slot {
            Slot::Child {
                parent,
                index,
                node_index,
            } => {
                if let Err(err) = self.attach_at(parent, id, index, node_index) {
                    log::warn!("reskin: could not take over {parent:?}'s slot: {err}");
                }
            }
            Slot::Root { index, area } => {
                let index = index.min(self.roots.len());
                self.roots.insert(index, (id, area));
            }
            Slot::Detached => {}
        }
        for child in placement.children {
            if let Err(err) = self.attach_child(id, child) {
                log::warn!("reskin: could not reattach {child:?}: {err}");
            }
        }
    }

    /// Disposes the skin: listeners are released, nodes removed, child skins
    /// detached (not disposed). Returns `false` when there was nothing to do.
    pub fn dispose(&mut self, id: SkinId) -> bool {
        let Some(rec) = self.skins.get_mut(id) else {
            return false;
        };
        if !rec.controller.dispose() {
            return false;
        }
        let name = rec.name;
        if let Some(mut skin) = rec.take_skin() {
            let now = self.clock.now();
            let _ = guarded("dispose", name, || skin.dispose(self.parts(id, now)));
        }
        let Some(rec) = self.skins.remove(id) else {
            return true;
        };
        for child in &rec.children {
            if let Some(c) = self.skins.get_mut(*child) {
                c.parent = None;
                self.nodes.detach(c.root);
            }
        }
        if let Some(parent) = rec.parent {
            if let Some(p) = self.skins.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
            request_layout_chain(&mut self.skins, parent);
        }
        self.nodes.remove(rec.root);
        self.roots.retain(|(r, _)| *r != id);
        if rec.control.skin() == Some(id) {
            rec.control.set_skin(None);
        }
        log::debug!("disposed {name} ({id:?})");
        true
    }

    /// Makes `child` part of `parent`'s layout. The child's nodes move under
    /// the parent's child container.
    pub fn attach_child(&mut self, parent: SkinId, child: SkinId) -> Result<(), LayoutError> {
        self.attach_at(parent, child, usize::MAX, None)
    }

    /// Attaches `child` at `index` among `parent`'s children, and its root
    /// node at `node_index` in the host node (appended when `None`).
    fn attach_at(
        &mut self,
        parent: SkinId,
        child: SkinId,
        index: usize,
        node_index: Option<usize>,
    ) -> Result<(), LayoutError> {
        let host = {
            let p = self
                .skins
                .get(parent)
                .ok_or(LayoutError::UnknownSkin(parent))?;
            p.skin
                .as_deref()
                .and_then(|s| s.child_container())
                .unwrap_or(p.root)
        };
        let c = self
            .skins
            .get(child)
            .ok_or(LayoutError::UnknownSkin(child))?;
        match c.parent {
            Some(p) if p == parent => return Ok(()),
            Some(_) => return Err(LayoutError::AlreadyAttached(child)),
            None => {}
        }
        let child_root = c.root;
        let mut cur = Some(parent);
        while let Some(a) = cur {
            if a == child {
                return Err(LayoutError::Cycle { parent, child });
            }
            cur = self.skins.get(a).and_then(|r| r.parent);
        }

        if let Some(c) = self.skins.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.skins.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        self.roots.retain(|(r, _)| *r != child);
        self.nodes
            .insert(host, node_index.unwrap_or(usize::MAX), child_root);
        request_layout_chain(&mut self.skins, child);
        Ok(())
    }

    pub fn detach_child(&mut self, child: SkinId) -> Result<(), LayoutError> {
        let c = self
            .skins
            .get_mut(child)
            .ok_or(LayoutError::UnknownSkin(child))?;
        let Some(parent) = c.parent.take() else {
            return Ok(());
        };
        let root = c.root;
        self.nodes.detach(root);
        if let Some(p) = self.skins.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        request_layout_chain(&mut self.skins, parent);
        request_layout_chain(&mut self.skins, child);
        Ok(())
    }

    pub fn parent(&self, id: SkinId) -> Option<SkinId> {
        self.skins.get(id).and_then(|r| r.parent)
    }

    pub fn children(&self, id: SkinId) -> &[SkinId] {
        self.skins
            .get(id)
            .map(|r| &r.children[..])
            .unwrap_or(&[])
    }

    /// Lays `id` out at `area` every frame it is dirty. Calling it again moves
    /// the root.
    pub fn set_root(&mut self, id: SkinId, area: Rect) -> Result<(), LayoutError> {
        let rec = self.skins.get(id).ok_or(LayoutError::UnknownSkin(id))?;
        if rec.parent.is_some() {
            return Err(LayoutError::AlreadyAttached(id));
        }
        match self.roots.iter_mut().find(|(r, _)| *r == id) {
            Some(entry) => entry.1 = area,
            None => self.roots.push((id, area)),
        }
        Ok(())
    }

    pub fn remove_root(&mut self, id: SkinId) {
        self.roots.retain(|(r, _)| *r != id);
    }

    pub fn roots(&self) -> impl Iterator<Item = (SkinId, Rect)> + '_ {
        self.roots.iter().copied()
    }

    pub fn request_layout(&mut self, id: SkinId) -> bool {
        request_layout_chain(&mut self.skins, id)
    }

    /// Unknown and disposed skins both report `Disposed`.
    pub fn state(&self, id: SkinId) -> LayoutState {
        self.skins
            .get(id)
            .map_or(LayoutState::Disposed, |r| r.controller.state())
    }

    pub fn controller(&self, id: SkinId) -> Option<&LayoutController> {
        self.skins.get(id).map(|r| &r.controller)
    }

    pub fn root_node(&self, id: SkinId) -> Option<NodeId> {
        self.skins.get(id).map(|r| r.root)
    }

    pub fn name(&self, id: SkinId) -> Option<&'static str> {
        self.skins.get(id).map(|r| r.name)
    }

    pub fn skin<S: Skin>(&self, id: SkinId) -> Option<&S> {
        self.skins
            .get(id)?
            .skin
            .as_deref()?
            .as_any()
            .downcast_ref::<S>()
    }

    pub fn pending_changes(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn pref_size(&self, id: SkinId) -> Size {
        crate::context::pref_size(&self.skins, self.snap, id)
    }

    pub fn measure(&self, id: SkinId, m: Measure, hint: Option<f32>) -> f32 {
        crate::context::measure(&self.skins, self.snap, id, m, hint)
    }

    pub fn baseline_offset(&self, id: SkinId) -> f32 {
        crate::context::baseline_offset(&self.skins, self.snap, id)
    }

    /// Runs one frame.
    pub fn pulse(&mut self) -> FrameReport {
        self.frame += 1;
        let now = self.clock.now();
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };
        self.tick_animations(now, &mut report);
        self.dispatch_changes(now, &mut report);
        self.layout_roots(&mut report);
        log::trace!(
            "frame {}: ticked={} dispatched={} laid_out={} failures={}",
            report.frame,
            report.ticked,
            report.dispatched,
            report.laid_out.len(),
            report.failures.len()
        );
        report
    }

    /// Calls `f` with the skin taken out of its slot so that it can receive
    /// the arena through its context.
    fn with_skin<R>(
        &mut self,
        id: SkinId,
        now: Instant,
        what: &str,
        f: impl FnOnce(&mut dyn ErasedSkin, Parts<'_>) -> R,
    ) -> Option<R> {
        let rec = self.skins.get_mut(id)?;
        if rec.controller.is_disposed() {
            return None;
        }
        let name = rec.name;
        let mut skin = rec.take_skin()?;
        let result = guarded(what, name, || f(skin.as_mut(), self.parts(id, now)));
        if let Some(rec) = self.skins.get_mut(id) {
            rec.skin = Some(skin);
        }
        result.ok()
    }

    fn tick_animations(&mut self, now: Instant, report: &mut FrameReport) {
        let animating: SmallVec<[SkinId; 8]> = self
            .skins
            .iter()
            .filter(|(_, r)| r.controller.is_animating())
            .map(|(id, _)| id)
            .collect();
        for id in animating {
            let keep = self
                .with_skin(id, now, "tick", |skin, parts| skin.tick(parts))
                .unwrap_or(false);
            report.ticked += 1;
            if let Some(rec) = self.skins.get_mut(id) {
                rec.controller.set_animating(keep);
            }
        }
    }

    fn dispatch_changes(&mut self, now: Instant, report: &mut FrameReport) {
        let budget = self.config.max_dispatch_per_frame.max(1);
        loop {
            if report.dispatched >= budget {
                let left = self.queue.borrow().len();
                if left > 0 {
                    log::warn!("dispatch budget of {budget} reached; {left} changes deferred");
                    report.deferred = left;
                }
                break;
            }
            let next = self.queue.borrow_mut().pop();
            let Some((id, raw)) = next else {
                break;
            };
            report.dispatched += 1;
            match raw {
                CONTROL_PADDING => {
                    request_layout_chain(&mut self.skins, id);
                }
                CONTROL_VISIBLE => {
                    if let Some(rec) = self.skins.get(id) {
                        let root = rec.root;
                        let visible = rec.control.visible().get();
                        self.nodes.set_visible(root, visible);
                    }
                    request_layout_chain(&mut self.skins, id);
                }
                _ => {
                    self.with_skin(id, now, "handle_property_changed", |skin, parts| {
                        skin.dispatch(raw, parts)
                    });
                }
            }
        }
    }

    fn layout_roots(&mut self, report: &mut FrameReport) {
        let roots = self.roots.clone();
        for (id, area) in roots {
            let mut pass = PassParts {
                skins: &mut self.skins,
                nodes: &mut self.nodes,
                snap: self.snap,
                report: &mut *report,
            };
            layout_skin(&mut pass, id, area);
        }
    }

    /// Flattens every root into a scene, in root order.
    pub fn paint(&self) -> Scene {
        let mut scene = Scene {
            clear_color: self.config.palette.background,
            nodes: Vec::new(),
        };
        for (id, _) in &self.roots {
            if let Some(rec) = self.skins.get(*id) {
                self.nodes.paint_into(rec.root, &mut scene);
            }
        }
        scene
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        let ids: Vec<SkinId> = self.skins.keys().collect();
        for id in ids {
            self.dispose(id);
        }
    }
}
