//! # Layout controller
//!
//! Every installed skin owns one `LayoutController`. It decides when the
//! skin's geometry must be recomputed:
//!
//! ```text
//!   Clean --request--> Dirty --begin--> LayingOut --commit--> Clean
//!                                           |
//!                       request during pass +--commit--> Dirty (next frame)
//!
//!   any --dispose--> Disposed (terminal, requests ignored)
//! ```
//!
//! Requests are idempotent: any number of them before the next frame leave
//! the controller `Dirty` once, and the frame runs one position pass.

use std::cell::Cell;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Rect, Subscription};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        /// The next pass must run `layout_children`.
        const NEEDS_LAYOUT = 1 << 0;
        /// Cached measure results may not be reused.
        const SIZE_CACHE_INVALID = 1 << 1;
        /// A request arrived while the skin was being laid out.
        const RELAYOUT_REQUESTED = 1 << 2;
        /// The last position pass panicked.
        const FAILED = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
    Clean,
    Dirty,
    LayingOut,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Measure {
    MinWidth,
    MinHeight,
    PrefWidth,
    PrefHeight,
    MaxWidth,
    MaxHeight,
}

impl Measure {
    pub fn is_width(self) -> bool {
        matches!(self, Measure::MinWidth | Measure::PrefWidth | Measure::MaxWidth)
    }

    // Max queries are cheap and not cached.
    fn slot(self) -> Option<usize> {
        match self {
            Measure::MinWidth => Some(0),
            Measure::MinHeight => Some(1),
            Measure::PrefWidth => Some(2),
            Measure::PrefHeight => Some(3),
            Measure::MaxWidth | Measure::MaxHeight => None,
        }
    }
}

// One entry per measure kind, keyed by the hint's bit pattern.
#[derive(Default)]
struct SizeCache {
    entries: [Cell<Option<(Option<u32>, f32)>>; 4],
}

impl SizeCache {
    fn get(&self, m: Measure, hint: Option<f32>) -> Option<f32> {
        let key = hint.map(f32::to_bits);
        match self.entries[m.slot()?].get() {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    fn put(&self, m: Measure, hint: Option<f32>, v: f32) {
        if let Some(slot) = m.slot() {
            self.entries[slot].set(Some((hint.map(f32::to_bits), v)));
        }
    }

    fn clear(&self) {
        for e in &self.entries {
            e.set(None);
        }
    }
}

pub struct LayoutController {
    state: LayoutState,
    flags: DirtyFlags,
    cache: SizeCache,
    listeners: SmallVec<[(u32, Subscription); 8]>,
    last_area: Option<Rect>,
    passes: u64,
    animating: bool,
}

impl Default for LayoutController {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutController {
    /// A fresh controller is dirty: a skin is laid out at least once.
    pub fn new() -> Self {
        Self {
            state: LayoutState::Dirty,
            flags: DirtyFlags::NEEDS_LAYOUT | DirtyFlags::SIZE_CACHE_INVALID,
            cache: SizeCache::default(),
            listeners: SmallVec::new(),
            last_area: None,
            passes: 0,
            animating: false,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    pub fn is_disposed(&self) -> bool {
        self.state == LayoutState::Disposed
    }

    pub fn needs_layout(&self) -> bool {
        self.state == LayoutState::Dirty
    }

    /// Number of committed (or failed) position passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn last_area(&self) -> Option<Rect> {
        self.last_area
    }

    /// Marks geometry stale. Returns `false` when the request had no effect
    /// (already disposed).
    pub fn request_layout(&mut self) -> bool {
        match self.state {
            LayoutState::Disposed => return false,
            LayoutState::LayingOut => self.flags |= DirtyFlags::RELAYOUT_REQUESTED,
            LayoutState::Clean | LayoutState::Dirty => {
                self.state = LayoutState::Dirty;
                self.flags |= DirtyFlags::NEEDS_LAYOUT;
                self.flags.remove(DirtyFlags::FAILED);
            }
        }
        self.invalidate_size();
        true
    }

    pub fn invalidate_size(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.flags |= DirtyFlags::SIZE_CACHE_INVALID;
        self.cache.clear();
    }

    /// Entries stored since the last invalidation.
    pub fn cached(&self, m: Measure, hint: Option<f32>) -> Option<f32> {
        self.cache.get(m, hint)
    }

    pub fn store(&self, m: Measure, hint: Option<f32>, v: f32) {
        if !self.is_disposed() {
            self.cache.put(m, hint, v);
        }
    }

    /// Whether a pass over `area` has to run `layout_children`.
    pub fn wants_pass(&self, area: Rect) -> bool {
        match self.state {
            LayoutState::Dirty => true,
            LayoutState::Clean => self.last_area != Some(area),
            LayoutState::LayingOut | LayoutState::Disposed => false,
        }
    }

    pub fn begin_layout(&mut self) -> bool {
        match self.state {
            LayoutState::Clean | LayoutState::Dirty => {
                self.state = LayoutState::LayingOut;
                self.flags.remove(DirtyFlags::RELAYOUT_REQUESTED);
                true
            }
            LayoutState::LayingOut | LayoutState::Disposed => false,
        }
    }

    /// Ends a pass started with `begin_layout`.
    pub fn commit_layout(&mut self, area: Rect) {
        if self.state != LayoutState::LayingOut {
            return;
        }
        self.passes += 1;
        self.last_area = Some(area);
        self.flags.remove(DirtyFlags::NEEDS_LAYOUT | DirtyFlags::SIZE_CACHE_INVALID);
        if self.flags.contains(DirtyFlags::RELAYOUT_REQUESTED) {
            self.flags.remove(DirtyFlags::RELAYOUT_REQUESTED);
            self.flags |= DirtyFlags::NEEDS_LAYOUT;
            self.state = LayoutState::Dirty;
        } else {
            self.state = LayoutState::Clean;
        }
    }

    /// Ends a pass whose `layout_children` panicked. The skin is not retried
    /// until something requests layout again.
    pub fn fail_layout(&mut self, area: Rect) {
        if self.state != LayoutState::LayingOut {
            return;
        }
        self.passes += 1;
        self.last_area = Some(area);
        self.flags.remove(DirtyFlags::NEEDS_LAYOUT | DirtyFlags::RELAYOUT_REQUESTED);
        self.flags |= DirtyFlags::FAILED;
        self.state = LayoutState::Clean;
    }

    /// Stores `sub` under `tag`, replacing any subscription with the same tag
    /// or the same source property.
    pub fn register(&mut self, tag: u32, sub: Subscription) {
        if self.is_disposed() {
            return;
        }
        let source = sub.source_id();
        self.listeners
            .retain(|(t, s)| *t != tag && s.source_id() != source);
        self.listeners.push((tag, sub));
    }

    /// Drops every subscription registered under `tag`. Returns whether any
    /// existed.
    pub fn unregister(&mut self, tag: u32) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(t, _)| *t != tag);
        before != self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_animating(&mut self, on: bool) {
        self.animating = on && !self.is_disposed();
    }

    /// Releases listeners and stops animation. Returns `true` only on the
    /// first call.
    pub fn dispose(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.state = LayoutState::Disposed;
        self.flags = DirtyFlags::empty();
        self.listeners.clear();
        self.cache.clear();
        self.animating = false;
        true
    }
}

impl std::fmt::Debug for LayoutController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutController")
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("listeners", &self.listeners.len())
            .field("last_area", &self.last_area)
            .field("passes", &self.passes)
            .field("animating", &self.animating)
            .finish()
    }
}
