use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::*;

property_tags! {
    enum TileProperty {
        Width,
        Height,
        Fill,
    }
}

struct Tile {
    control: Control,
    width: Property<f32>,
    height: Property<f32>,
    fill: Property<Color>,
}

impl Tile {
    fn new(w: f32, h: f32) -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            width: Property::new(w),
            height: Property::new(h),
            fill: Property::new(Color::BLACK),
        })
    }
}

#[derive(Default)]
struct Knobs {
    log: RefCell<Vec<String>>,
    panic_in_layout: Cell<bool>,
    panic_in_measure: Cell<bool>,
    relayout_once: Cell<bool>,
    cascade_height: Cell<Option<f32>>,
    bias: Cell<Option<Orientation>>,
    hints: RefCell<Vec<(Measure, Option<f32>)>>,
    content: Cell<Rect>,
    ticks_left: Cell<u32>,
    measure_self: Cell<bool>,
    measured_self: Cell<Option<f32>>,
}

impl Knobs {
    fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

struct TileSkin {
    tile: Rc<Tile>,
    knobs: Rc<Knobs>,
    rect: Option<NodeId>,
}

fn tile_skin(tile: &Rc<Tile>) -> (TileSkin, Rc<Knobs>) {
    let knobs = Rc::new(Knobs::default());
    (
        TileSkin {
            tile: tile.clone(),
            knobs: knobs.clone(),
            rect: None,
        },
        knobs,
    )
}

impl Skin for TileSkin {
    type Property = TileProperty;

    fn name(&self) -> &'static str {
        "Tile"
    }

    fn control(&self) -> &Control {
        &self.tile.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, TileProperty>) {
        let root = cx.root();
        let color = self.tile.fill.get();
        self.rect = Some(cx.nodes().add(root, NodeKind::Rect { color, radius: 0.0 }));
        cx.register(&self.tile.width, TileProperty::Width);
        cx.register(&self.tile.height, TileProperty::Height);
        cx.register(&self.tile.fill, TileProperty::Fill);
        if self.knobs.ticks_left.get() > 0 {
            cx.set_animating(true);
        }
    }

    fn handle_property_changed(
        &mut self,
        p: TileProperty,
        cx: &mut SkinContext<'_, TileProperty>,
    ) {
        self.knobs.log.borrow_mut().push(format!("handle:{p:?}"));
        match p {
            TileProperty::Width | TileProperty::Height => {
                if let Some(h) = self.knobs.cascade_height.take() {
                    self.tile.height.set(h);
                }
                cx.request_layout();
            }
            TileProperty::Fill => {
                if let Some(rect) = self.rect {
                    cx.nodes().set_color(rect, self.tile.fill.get());
                }
            }
        }
    }

    fn content_bias(&self) -> Option<Orientation> {
        self.knobs.bias.get()
    }

    fn compute_pref_width(&self, height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        self.knobs
            .hints
            .borrow_mut()
            .push((Measure::PrefWidth, height));
        if self.knobs.panic_in_measure.get() {
            panic!("tile measure failure");
        }
        self.tile.width.get()
    }

    fn compute_pref_height(&self, width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        self.knobs
            .hints
            .borrow_mut()
            .push((Measure::PrefHeight, width));
        self.tile.height.get()
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        self.knobs.log.borrow_mut().push("layout".to_string());
        self.knobs.content.set(content);
        if self.knobs.panic_in_layout.get() {
            panic!("tile layout failure");
        }
        if self.knobs.measure_self.get() {
            let h = cx.pref_height(cx.id(), Some(content.w));
            self.knobs.measured_self.set(Some(h));
        }
        if self.knobs.relayout_once.replace(false) {
            cx.request_layout();
        }
        if let Some(rect) = self.rect {
            cx.resize_relocate(rect, content);
        }
    }

    fn tick(&mut self, _now: Instant, _cx: &mut SkinContext<'_, TileProperty>) -> bool {
        let left = self.knobs.ticks_left.get().saturating_sub(1);
        self.knobs.ticks_left.set(left);
        left > 0
    }
}

property_tags! {
    enum StackProperty {
        Spacing,
    }
}

/// Stacks its children top to bottom.
struct StackSkin {
    control: Control,
    spacing: Property<f32>,
}

impl Skin for StackSkin {
    type Property = StackProperty;

    fn control(&self) -> &Control {
        &self.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, StackProperty>) {
        cx.register(&self.spacing, StackProperty::Spacing);
    }

    fn handle_property_changed(
        &mut self,
        p: StackProperty,
        cx: &mut SkinContext<'_, StackProperty>,
    ) {
        match p {
            StackProperty::Spacing => cx.request_layout(),
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        cx.children()
            .iter()
            .map(|c| cx.pref_width(*c, None))
            .fold(0.0, f32::max)
    }

    fn compute_pref_height(&self, width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        let n = cx.children().len();
        let gaps = self.spacing.get() * n.saturating_sub(1) as f32;
        cx.children()
            .iter()
            .map(|c| cx.pref_height(*c, width))
            .sum::<f32>()
            + gaps
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let mut y = content.y;
        for child in cx.children() {
            let h = cx.pref_height(child, Some(content.w));
            cx.layout_child(child, Rect::new(content.x, y, content.w, h));
            y += h + self.spacing.get();
        }
    }
}

fn stack() -> StackSkin {
    StackSkin {
        control: Control::new(),
        spacing: Property::new(0.0),
    }
}

fn scheduler() -> FrameScheduler {
    FrameScheduler::with_clock(SessionConfig::default(), TestClock::new())
}

fn rooted(s: &mut FrameScheduler, skin: impl Skin, area: Rect) -> SkinId {
    let id = s.install(skin);
    s.set_root(id, area).unwrap();
    id
}

#[test]
fn test_first_pulse_lays_out_then_idles() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 50.0, 20.0));
    assert_eq!(s.state(id), LayoutState::Dirty);

    let report = s.pulse();
    assert_eq!(report.laid_out, vec![id]);
    assert_eq!(s.state(id), LayoutState::Clean);
    assert_eq!(
        tile.control.layout_bounds(),
        Rect::new(0.0, 0.0, 50.0, 20.0)
    );

    assert!(s.pulse().is_idle());
    assert_eq!(knobs.take_log(), vec!["layout"]);
}

#[test]
fn test_repeated_changes_coalesce_into_one_pass() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 50.0, 20.0));
    s.pulse();
    knobs.take_log();

    tile.width.set(11.0);
    tile.width.set(12.0);
    tile.width.set(13.0);
    s.request_layout(id);
    s.request_layout(id);
    assert_eq!(s.pending_changes(), 1);

    let report = s.pulse();
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.layouts_of(id), 1);
    assert_eq!(knobs.take_log(), vec!["handle:Width", "layout"]);
}

#[test]
fn test_visual_change_needs_no_layout() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, _knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();

    tile.fill.set(Color::WHITE);
    let report = s.pulse();
    assert_eq!(report.dispatched, 1);
    assert!(report.laid_out.is_empty());
    assert_eq!(s.state(id), LayoutState::Clean);
    assert!(s.paint().describe().contains("#FFFFFF"));
}

#[test]
fn test_handler_requests_wait_for_whole_batch() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();
    knobs.take_log();

    // The Width handler writes Height and requests layout; Height joins the
    // same batch and layout only runs after it.
    knobs.cascade_height.set(Some(30.0));
    tile.width.set(20.0);

    let report = s.pulse();
    assert_eq!(report.dispatched, 2);
    assert_eq!(
        knobs.take_log(),
        vec!["handle:Width", "handle:Height", "layout"]
    );
}

#[test]
fn test_request_during_layout_goes_to_next_frame() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    knobs.relayout_once.set(true);

    assert_eq!(s.pulse().layouts_of(id), 1);
    assert_eq!(s.state(id), LayoutState::Dirty);
    assert_eq!(s.pulse().layouts_of(id), 1);
    assert_eq!(s.state(id), LayoutState::Clean);
    assert!(s.pulse().is_idle());
}

#[test]
fn test_unchanged_children_are_skipped() {
    let mut s = scheduler();
    let parent = rooted(&mut s, stack(), Rect::new(0.0, 0.0, 40.0, 100.0));
    let a = Tile::new(10.0, 10.0);
    let b = Tile::new(10.0, 10.0);
    let (sa, _) = tile_skin(&a);
    let (sb, _) = tile_skin(&b);
    let ia = s.install(sa);
    let ib = s.install(sb);
    s.attach_child(parent, ia).unwrap();
    s.attach_child(parent, ib).unwrap();
    assert_eq!(s.pulse().laid_out, vec![parent, ia, ib]);

    // Growing `a` moves `b`; nothing about `b` itself changed but its area did.
    a.height.set(20.0);
    let report = s.pulse();
    assert_eq!(report.laid_out, vec![parent, ia, ib]);
    assert_eq!(b.control.layout_bounds().y, 20.0);

    // `b` changes without affecting the stack's arrangement of `a`.
    b.width.set(12.0);
    let report = s.pulse();
    assert_eq!(report.laid_out, vec![parent, ib]);
}

#[test]
fn test_dispose_is_idempotent_and_silences_listeners() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();
    assert_eq!(tile.width.listener_count(), 1);

    assert!(s.dispose(id));
    assert!(!s.dispose(id));
    assert_eq!(s.state(id), LayoutState::Disposed);
    assert_eq!(tile.width.listener_count(), 0);
    assert_eq!(tile.control.padding().listener_count(), 0);
    assert_eq!(tile.control.skin(), None);
    assert!(!s.request_layout(id));

    tile.width.set(99.0);
    assert_eq!(s.pending_changes(), 0);
    knobs.take_log();
    assert!(s.pulse().is_idle());
    assert!(knobs.take_log().is_empty());
    assert!(s.paint().nodes.is_empty());
}

#[test]
fn test_pending_change_for_disposed_skin_is_dropped() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();
    knobs.take_log();

    tile.width.set(20.0);
    s.dispose(id);
    s.pulse();
    assert!(knobs.take_log().is_empty());
}

#[test]
fn test_reinstall_disposes_previous_skin() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (first, _) = tile_skin(&tile);
    let (second, _) = tile_skin(&tile);
    let a = s.install(first);
    let b = s.install(second);
    assert_eq!(s.state(a), LayoutState::Disposed);
    assert_eq!(tile.control.skin(), Some(b));
    assert_eq!(tile.width.listener_count(), 1);
}

#[test]
fn test_install_ignores_skin_ids_from_other_sessions() {
    let mut a = scheduler();
    let mut b = scheduler();
    let shared = Tile::new(10.0, 10.0);
    let other = Tile::new(10.0, 10.0);
    let ia = a.install(tile_skin(&shared).0);
    let ib = b.install(tile_skin(&other).0);
    // Fresh arenas hand out the same first key.
    assert_eq!(ia, ib);

    let moved = b.install(tile_skin(&shared).0);
    assert_ne!(moved, ib);
    assert_eq!(b.state(ib), LayoutState::Dirty);
    assert_eq!(other.control.skin(), Some(ib));
    assert_eq!(other.width.listener_count(), 1);
    assert_eq!(shared.control.skin(), Some(moved));
    assert_eq!(a.state(ia), LayoutState::Dirty);
}

#[test]
fn test_reskin_keeps_the_slot_in_its_parent() {
    let mut s = scheduler();
    let parent = rooted(&mut s, stack(), Rect::new(0.0, 0.0, 40.0, 100.0));
    let tiles: Vec<_> = (0..3).map(|_| Tile::new(10.0, 10.0)).collect();
    let ids: Vec<SkinId> = tiles
        .iter()
        .map(|t| {
            let id = s.install(tile_skin(t).0);
            s.attach_child(parent, id).unwrap();
            id
        })
        .collect();
    s.pulse();

    let replaced = s.install(tile_skin(&tiles[1]).0);
    assert_eq!(s.state(ids[1]), LayoutState::Disposed);
    assert_eq!(s.children(parent), &[ids[0], replaced, ids[2]]);
    assert_eq!(s.parent(replaced), Some(parent));
    let host = s.nodes().get(s.root_node(parent).unwrap()).unwrap();
    assert_eq!(host.children()[1], s.root_node(replaced).unwrap());

    let report = s.pulse();
    assert_eq!(report.laid_out[0], parent);
    assert!(report.laid_out.contains(&replaced));
    assert_eq!(
        tiles[1].control.layout_bounds(),
        Rect::new(0.0, 10.0, 40.0, 10.0)
    );
}

#[test]
fn test_reskinned_root_keeps_area_and_children() {
    let mut s = scheduler();
    let first = stack();
    let control = first.control.clone();
    let area = Rect::new(0.0, 0.0, 40.0, 100.0);
    let old = rooted(&mut s, first, area);
    let tile = Tile::new(10.0, 10.0);
    let child = s.install(tile_skin(&tile).0);
    s.attach_child(old, child).unwrap();
    s.pulse();

    let next = s.install(StackSkin {
        control,
        spacing: Property::new(5.0),
    });
    assert_eq!(s.roots().collect::<Vec<_>>(), vec![(next, area)]);
    assert_eq!(s.children(next), &[child]);
    assert_eq!(s.parent(child), Some(next));

    let report = s.pulse();
    assert_eq!(report.laid_out, vec![next, child]);
    assert_eq!(tile.control.layout_bounds(), Rect::new(0.0, 0.0, 40.0, 10.0));
}

#[test]
fn test_disposing_child_relayouts_parent() {
    let mut s = scheduler();
    let parent = rooted(&mut s, stack(), Rect::new(0.0, 0.0, 40.0, 100.0));
    let a = Tile::new(10.0, 10.0);
    let b = Tile::new(10.0, 10.0);
    let (sa, _) = tile_skin(&a);
    let (sb, _) = tile_skin(&b);
    let ia = s.install(sa);
    let ib = s.install(sb);
    s.attach_child(parent, ia).unwrap();
    s.attach_child(parent, ib).unwrap();
    s.pulse();

    s.dispose(ia);
    assert_eq!(s.children(parent), &[ib]);
    let report = s.pulse();
    assert_eq!(report.laid_out, vec![parent, ib]);
    assert_eq!(b.control.layout_bounds().y, 0.0);
}

#[test]
fn test_panicking_layout_is_isolated_from_siblings() {
    let mut s = scheduler();
    let parent = rooted(&mut s, stack(), Rect::new(0.0, 0.0, 40.0, 100.0));
    let bad = Tile::new(10.0, 10.0);
    let good = Tile::new(10.0, 10.0);
    let (sbad, kbad) = tile_skin(&bad);
    let (sgood, _) = tile_skin(&good);
    let ibad = s.install(sbad);
    let igood = s.install(sgood);
    s.attach_child(parent, ibad).unwrap();
    s.attach_child(parent, igood).unwrap();
    kbad.panic_in_layout.set(true);

    let report = s.pulse();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].skin, ibad);
    assert_eq!(report.failures[0].message, "tile layout failure");
    assert_eq!(s.state(igood), LayoutState::Clean);
    assert_eq!(s.state(parent), LayoutState::Clean);
    assert_eq!(s.state(ibad), LayoutState::Clean);
    assert!(s.controller(ibad).unwrap().flags().contains(DirtyFlags::FAILED));
    assert_eq!(good.control.layout_bounds().y, 10.0);

    // Not retried on its own, but a fresh request clears the failure.
    assert!(s.pulse().is_idle());
    kbad.panic_in_layout.set(false);
    bad.width.set(11.0);
    let report = s.pulse();
    assert!(report.failures.is_empty());
    assert!(!s.controller(ibad).unwrap().flags().contains(DirtyFlags::FAILED));
}

#[test]
fn test_panicking_measure_reports_zero() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    tile.control.padding().set(Insets::uniform(2.0));
    let (skin, knobs) = tile_skin(&tile);
    let id = s.install(skin);
    knobs.panic_in_measure.set(true);
    assert_eq!(s.measure(id, Measure::PrefWidth, None), 4.0);
    assert_eq!(s.measure(id, Measure::PrefHeight, None), 14.0);
}

#[test]
fn test_forced_relayout_reproduces_positions() {
    let mut s = scheduler();
    let list = stack();
    list.spacing.set(3.0);
    let parent = rooted(&mut s, list, Rect::new(2.0, 4.0, 40.0, 100.0));
    let a = Tile::new(10.0, 12.0);
    let b = Tile::new(10.0, 7.5);
    let ia = s.install(tile_skin(&a).0);
    let ib = s.install(tile_skin(&b).0);
    s.attach_child(parent, ia).unwrap();
    s.attach_child(parent, ib).unwrap();
    s.pulse();

    let snapshot = |s: &FrameScheduler| {
        [parent, ia, ib].map(|id| {
            let root = s.root_node(id).unwrap();
            let rect = s.skin::<TileSkin>(id).and_then(|k| k.rect);
            let inner = rect.and_then(|r| s.nodes().get(r)).map(|n| n.bounds());
            (s.nodes().absolute_bounds(root).unwrap(), inner)
        })
    };
    let before = snapshot(&s);
    let paint = s.paint().describe();

    assert!(s.request_layout(ia));
    assert!(s.request_layout(ib));
    let report = s.pulse();
    assert_eq!(report.laid_out, vec![parent, ia, ib]);
    assert_eq!(snapshot(&s), before);
    assert_eq!(s.paint().describe(), paint);
}

#[test]
fn test_measure_during_own_layout_uses_biased_cache_entry() {
    let mut s = scheduler();
    let parent = rooted(&mut s, stack(), Rect::new(0.0, 0.0, 40.0, 100.0));
    let tile = Tile::new(10.0, 30.0);
    let (skin, knobs) = tile_skin(&tile);
    knobs.bias.set(Some(Orientation::Horizontal));
    knobs.measure_self.set(true);
    let id = s.install(skin);
    s.attach_child(parent, id).unwrap();
    s.pulse();
    // The stack measured (PrefHeight, Some(40)) before the pass; the skin
    // reads that entry back while it is busy.
    assert_eq!(knobs.measured_self.get(), Some(30.0));
}

property_tags! {
    enum AlignProperty {
        Align,
    }
}

/// Places its only child with `layout_in_area`.
struct AlignSkin {
    control: Control,
    align: Property<(HAlign, VAlign)>,
}

impl Skin for AlignSkin {
    type Property = AlignProperty;

    fn control(&self) -> &Control {
        &self.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, AlignProperty>) {
        cx.register(&self.align, AlignProperty::Align);
    }

    fn handle_property_changed(
        &mut self,
        p: AlignProperty,
        cx: &mut SkinContext<'_, AlignProperty>,
    ) {
        match p {
            AlignProperty::Align => cx.request_layout(),
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        0.0
    }

    fn compute_pref_height(&self, _width: Option<f32>, _cx: &MeasureContext<'_>) -> f32 {
        0.0
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        let (h, v) = self.align.get();
        for child in cx.children() {
            cx.layout_in_area(child, content, h, v);
        }
    }
}

#[test]
fn test_layout_in_area_aligns_at_preferred_size() {
    let mut s = scheduler();
    let align = Property::new((HAlign::Center, VAlign::Center));
    let host = rooted(
        &mut s,
        AlignSkin {
            control: Control::new(),
            align: align.clone(),
        },
        Rect::new(0.0, 0.0, 50.0, 30.0),
    );
    let tile = Tile::new(10.0, 6.0);
    let id = s.install(tile_skin(&tile).0);
    s.attach_child(host, id).unwrap();
    s.pulse();
    assert_eq!(tile.control.layout_bounds(), Rect::new(20.0, 12.0, 10.0, 6.0));

    align.set((HAlign::Right, VAlign::Bottom));
    s.pulse();
    assert_eq!(tile.control.layout_bounds(), Rect::new(40.0, 24.0, 10.0, 6.0));

    // Larger than the area: cut to it.
    tile.width.set(80.0);
    align.set((HAlign::Left, VAlign::Top));
    s.pulse();
    assert_eq!(tile.control.layout_bounds(), Rect::new(0.0, 0.0, 50.0, 6.0));
}

#[test]
fn test_rect_align() {
    let area = Rect::new(10.0, 10.0, 20.0, 10.0);
    let size = Size::new(4.0, 2.0);
    assert_eq!(area.align(size, HAlign::Left, VAlign::Top), Rect::new(10.0, 10.0, 4.0, 2.0));
    assert_eq!(area.align(size, HAlign::Center, VAlign::Center), Rect::new(18.0, 14.0, 4.0, 2.0));
    assert_eq!(area.align(size, HAlign::Right, VAlign::Bottom), Rect::new(26.0, 18.0, 4.0, 2.0));
    // Overflow keeps the size.
    let wide = Size::new(30.0, 2.0);
    assert_eq!(area.align(wide, HAlign::Center, VAlign::Top), Rect::new(5.0, 10.0, 30.0, 2.0));
}

#[test]
fn test_baseline_defaults_to_bottom_edge() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 12.0);
    tile.control.padding().set(Insets::uniform(1.0));
    let id = s.install(tile_skin(&tile).0);
    assert_eq!(s.baseline_offset(id), 14.0);
}

#[test]
fn test_invalid_geometry_is_clamped() {
    let mut s = scheduler();
    let tile = Tile::new(f32::NAN, -5.0);
    let (skin, _) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(0.0, 0.0, f32::NAN, -3.0));
    assert_eq!(s.measure(id, Measure::PrefWidth, None), 0.0);
    assert_eq!(s.measure(id, Measure::PrefHeight, None), 0.0);
    s.pulse();
    assert_eq!(tile.control.layout_bounds(), Rect::new(0.0, 0.0, 0.0, 0.0));
}

#[test]
fn test_padding_is_added_and_inset() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 6.0);
    tile
        .control
        .padding()
        .set(Insets::symmetric(2.0, 3.0));
    let (skin, knobs) = tile_skin(&tile);
    let id = rooted(&mut s, skin, Rect::new(5.0, 5.0, 30.0, 20.0));
    assert_eq!(s.pref_size(id), Size::new(16.0, 10.0));
    s.pulse();
    assert_eq!(knobs.content.get(), Rect::new(3.0, 2.0, 24.0, 16.0));

    tile.control.padding().set(Insets::ZERO);
    let report = s.pulse();
    assert_eq!(report.layouts_of(id), 1);
    assert_eq!(knobs.content.get(), Rect::new(0.0, 0.0, 30.0, 20.0));
}

#[test]
fn test_hint_forwarded_only_with_matching_bias() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = s.install(skin);

    s.measure(id, Measure::PrefHeight, Some(50.0));
    knobs.bias.set(Some(Orientation::Horizontal));
    s.request_layout(id);
    s.measure(id, Measure::PrefHeight, Some(50.0));
    s.measure(id, Measure::PrefWidth, Some(50.0));
    assert_eq!(
        *knobs.hints.borrow(),
        vec![
            (Measure::PrefHeight, None),
            (Measure::PrefHeight, Some(50.0)),
            (Measure::PrefWidth, None),
        ]
    );
}

#[test]
fn test_measure_results_are_cached_until_invalidated() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    let id = s.install(skin);
    s.measure(id, Measure::PrefWidth, None);
    s.measure(id, Measure::PrefWidth, None);
    assert_eq!(knobs.hints.borrow().len(), 1);

    tile.width.set(30.0);
    s.pulse();
    assert_eq!(s.measure(id, Measure::PrefWidth, None), 30.0);
    assert_eq!(knobs.hints.borrow().len(), 2);
}

#[test]
fn test_attach_rejects_cycles_and_double_parents() {
    let mut s = scheduler();
    let a = s.install(stack());
    let b = s.install(stack());
    let c = s.install(stack());
    s.attach_child(a, b).unwrap();
    s.attach_child(b, c).unwrap();
    assert!(matches!(
        s.attach_child(c, a),
        Err(LayoutError::Cycle { .. })
    ));
    assert!(matches!(
        s.attach_child(a, c),
        Err(LayoutError::AlreadyAttached(_))
    ));
    assert!(s.attach_child(a, b).is_ok());

    s.dispose(c);
    assert!(matches!(
        s.attach_child(a, c),
        Err(LayoutError::UnknownSkin(_))
    ));
    s.detach_child(b).unwrap();
    assert_eq!(s.parent(b), None);
    assert!(s.children(a).is_empty());
}

#[test]
fn test_dispatch_budget_defers_rest() {
    let config = SessionConfig::default().with_dispatch_budget(1);
    let mut s = FrameScheduler::with_clock(config, TestClock::new());
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();
    knobs.take_log();

    tile.width.set(1.0);
    tile.fill.set(Color::WHITE);
    let report = s.pulse();
    assert_eq!((report.dispatched, report.deferred), (1, 1));
    let report = s.pulse();
    assert_eq!((report.dispatched, report.deferred), (1, 0));
    assert_eq!(
        knobs.take_log(),
        vec!["handle:Width", "layout", "handle:Fill"]
    );
}

#[test]
fn test_hidden_control_is_not_painted() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, _) = tile_skin(&tile);
    rooted(&mut s, skin, Rect::new(0.0, 0.0, 10.0, 10.0));
    s.pulse();
    assert_eq!(s.paint().nodes.len(), 1);

    tile.control.visible().set(false);
    s.pulse();
    assert!(s.paint().nodes.is_empty());
}

#[test]
fn test_animating_skin_ticks_until_done() {
    let mut s = scheduler();
    let tile = Tile::new(10.0, 10.0);
    let (skin, knobs) = tile_skin(&tile);
    knobs.ticks_left.set(3);
    let id = s.install(skin);
    assert!(s.controller(id).unwrap().is_animating());

    assert_eq!(s.pulse().ticked, 1);
    assert_eq!(s.pulse().ticked, 1);
    assert_eq!(s.pulse().ticked, 1);
    assert_eq!(s.pulse().ticked, 0);
}

#[test]
fn test_register_same_tag_replaces_subscription() {
    let mut c = LayoutController::new();
    let p = Property::new(0);
    let q = Property::new(0);
    c.register(0, p.subscribe(|_, _| {}));
    c.register(0, q.subscribe(|_, _| {}));
    assert_eq!(p.listener_count(), 0);
    assert_eq!(q.listener_count(), 1);
    c.register(1, q.subscribe(|_, _| {}));
    assert_eq!(q.listener_count(), 1);
    assert_eq!(c.listener_count(), 1);
    assert!(c.unregister(1));
    assert_eq!(q.listener_count(), 0);
}

#[test]
fn test_controller_state_machine() {
    let mut c = LayoutController::new();
    let area = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(c.wants_pass(area));
    assert!(c.begin_layout());
    assert!(!c.wants_pass(area));
    c.commit_layout(area);
    assert_eq!(c.state(), LayoutState::Clean);
    assert!(!c.wants_pass(area));
    assert!(c.wants_pass(Rect::new(1.0, 0.0, 10.0, 10.0)));

    c.request_layout();
    c.request_layout();
    assert_eq!(c.state(), LayoutState::Dirty);
    assert!(c.dispose());
    assert!(!c.dispose());
    assert!(!c.request_layout());
    assert!(!c.begin_layout());
    assert_eq!(c.state(), LayoutState::Disposed);
}

#[test]
fn test_property_listeners_fire_in_order_once_per_change() {
    let p = Property::new(1);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _a = p.subscribe({
        let seen = seen.clone();
        move |old, new| seen.borrow_mut().push(format!("a {old}->{new}"))
    });
    let b = p.subscribe({
        let seen = seen.clone();
        move |old, new| seen.borrow_mut().push(format!("b {old}->{new}"))
    });
    p.set(1);
    p.set(2);
    b.release();
    p.update(|v| *v += 1);
    assert_eq!(*seen.borrow(), vec!["a 1->2", "b 1->2", "a 2->3"]);
}

#[test]
fn test_listener_may_write_its_own_property() {
    let p = Property::new(0);
    let _sub = p.subscribe({
        let p = p.clone();
        move |_, new| {
            if *new > 10 {
                p.set(10);
            }
        }
    });
    p.set(50);
    assert_eq!(p.get(), 10);
}

#[test]
fn test_snap_idempotent_and_monotonic() {
    for scale in [1.0_f32, 1.25, 1.5, 2.0, 3.0] {
        let snap = PixelSnap::new(scale);
        let mut prev = (f32::MIN, f32::MIN);
        for i in -100..2000 {
            let v = i as f32 * 0.137;
            let (pos, size) = (snap.snap_position(v), snap.snap_size(v));
            assert_eq!(snap.snap_position(pos), pos, "scale {scale} v {v}");
            assert_eq!(snap.snap_size(size), size, "scale {scale} v {v}");
            assert!(pos >= prev.0 && size >= prev.1, "scale {scale} v {v}");
            assert!(size + 2e-3 >= v, "scale {scale} v {v}");
            prev = (pos, size);
        }
    }
}

#[test]
fn test_snap_edge_values() {
    let snap = PixelSnap::new(2.0);
    assert_eq!(snap.snap_size(f32::NAN), 0.0);
    assert_eq!(snap.snap_position(f32::NAN), 0.0);
    assert_eq!(snap.snap_size(f32::INFINITY), f32::INFINITY);
    assert_eq!(PixelSnap::new(0.0).scale(), 1.0);
    assert_eq!(PixelSnap::disabled().snap_size(1.3), 1.3);
}

#[test]
fn test_value_helpers() {
    assert_eq!(clamp_value(150.0, 0.0, 100.0), 100.0);
    assert_eq!(clamp_value(-1.0, 0.0, 100.0), 0.0);
    assert_eq!(clamp_value(f64::NAN, 0.0, 100.0), 0.0);
    assert_eq!(clamp_value(5.0, 10.0, 0.0), 10.0);
    assert_eq!(normalize(25.0, 0.0, 100.0), 0.25);
    assert_eq!(normalize(5.0, 3.0, 3.0), 0.0);
    assert_eq!(denormalize(0.5, 10.0, 20.0), 15.0);
}

#[test]
fn test_animated_value_with_test_clock() {
    let clock = TestClock::new();
    let spec = AnimationSpec::tween(Duration::from_millis(100), Easing::Linear);
    let mut v = AnimatedValue::new(0.0_f32, spec);
    v.set_target(10.0, clock.now());
    clock.advance(Duration::from_millis(50));
    assert!(v.update(clock.now()));
    assert!((v.get() - 5.0).abs() < 1e-4);
    clock.advance(Duration::from_millis(60));
    assert!(!v.update(clock.now()));
    assert_eq!(*v.get(), 10.0);
}

#[test]
fn test_color_hex() {
    assert_eq!(Color::from_hex("#34AF82").to_hex(), "#34AF82");
    assert_eq!(Color(1, 2, 3, 4).to_hex(), "#01020304");
}

#[cfg(feature = "serde")]
#[test]
fn test_session_config_serde() {
    let config = SessionConfig::default().with_render_scale(2.0);
    let json = serde_json::to_string(&config).unwrap();
    let back: SessionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let partial: SessionConfig = serde_json::from_str(r#"{"render_scale":1.5}"#).unwrap();
    assert_eq!(partial.render_scale, 1.5);
    assert!(partial.snap_to_pixel);
}
