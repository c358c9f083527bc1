use std::rc::Rc;

use smallvec::SmallVec;
use taffy::prelude::{AlignItems, AvailableSpace, Style, TaffyTree, length};
use trellis_core::{
    Control, LayoutContext, LayoutError, MeasureContext, NodeId, NodeKind, Orientation, PixelSnap,
    Property, Rect, Size, Skin, SkinContext, SkinId, property_tags, sanitize_extent,
};

pub const DEFAULT_SPACING: f32 = 4.0;

property_tags! {
    pub enum ToolBarProperty {
        Orientation,
        Spacing,
    }
}

/// Row (or column) of item skins, attached as children in display order.
pub struct ToolBar {
    pub control: Control,
    pub orientation: Property<Orientation>,
    pub spacing: Property<f32>,
}

impl ToolBar {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            control: Control::new(),
            orientation: Property::new(Orientation::Horizontal),
            spacing: Property::new(DEFAULT_SPACING),
        })
    }

    pub fn vertical() -> Rc<Self> {
        let t = Self::new();
        t.orientation.set(Orientation::Vertical);
        t
    }
}

struct Item {
    id: SkinId,
    pref: Size,
    min: Size,
}

pub struct ToolBarSkin {
    bar: Rc<ToolBar>,
    background: Option<NodeId>,
}

impl ToolBarSkin {
    pub fn new(bar: Rc<ToolBar>) -> Self {
        Self {
            bar,
            background: None,
        }
    }

    fn spacing(&self, snap: PixelSnap) -> f32 {
        let s = sanitize_extent(self.bar.spacing.get());
        snap.snap_space(if s.is_finite() { s } else { 0.0 })
    }

    fn items(&self, m: &MeasureContext<'_>) -> SmallVec<[Item; 8]> {
        m.children()
            .iter()
            .filter(|c| m.is_visible(**c))
            .map(|&id| Item {
                id,
                pref: m.pref_size(id),
                min: Size::new(m.min_width(id, None), m.min_height(id, None)),
            })
            .collect()
    }

    fn main_extent(&self, m: &MeasureContext<'_>, main: Orientation) -> f32 {
        let items = self.items(m);
        let gaps = items.len().saturating_sub(1) as f32 * self.spacing(m.snap());
        let pick = |s: Size| match main {
            Orientation::Horizontal => s.width,
            Orientation::Vertical => s.height,
        };
        if self.bar.orientation.get() == main {
            items.iter().map(|i| pick(i.pref)).sum::<f32>() + gaps
        } else {
            items.iter().map(|i| pick(i.pref)).fold(0.0, f32::max)
        }
    }

    /// Flex layout of `items` inside `content`; rects are relative to it.
    fn solve(&self, content: Size, items: &[Item], spacing: f32) -> Result<Vec<Rect>, LayoutError> {
        let mut t: TaffyTree<()> = TaffyTree::new();
        // Rounding is left to pixel snapping.
        t.disable_rounding();
        let leaves = items
            .iter()
            .map(|i| {
                t.new_leaf(Style {
                    size: taffy::Size {
                        width: length(i.pref.width),
                        height: length(i.pref.height),
                    },
                    min_size: taffy::Size {
                        width: length(i.min.width),
                        height: length(i.min.height),
                    },
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let horizontal = self.bar.orientation.get() == Orientation::Horizontal;
        let root = t.new_with_children(
            Style {
                flex_direction: self.bar.orientation.get().into(),
                align_items: Some(AlignItems::Center),
                gap: taffy::Size {
                    width: length(if horizontal { spacing } else { 0.0 }),
                    height: length(if horizontal { 0.0 } else { spacing }),
                },
                size: taffy::Size {
                    width: length(content.width),
                    height: length(content.height),
                },
                ..Default::default()
            },
            &leaves,
        )?;

        t.compute_layout(
            root,
            taffy::Size {
                width: AvailableSpace::Definite(content.width),
                height: AvailableSpace::Definite(content.height),
            },
        )?;

        leaves
            .iter()
            .map(|&leaf| -> Result<Rect, LayoutError> {
                let l = t.layout(leaf)?;
                Ok(Rect::new(l.location.x, l.location.y, l.size.width, l.size.height))
            })
            .collect()
    }
}

impl Skin for ToolBarSkin {
    type Property = ToolBarProperty;

    fn name(&self) -> &'static str {
        "ToolBar"
    }

    fn control(&self) -> &Control {
        &self.bar.control
    }

    fn install(&mut self, cx: &mut SkinContext<'_, ToolBarProperty>) {
        let root = cx.root();
        let color = cx.palette().surface;
        self.background = Some(cx.nodes().add(root, NodeKind::Rect { color, radius: 0.0 }));
        cx.register(&self.bar.orientation, ToolBarProperty::Orientation);
        cx.register(&self.bar.spacing, ToolBarProperty::Spacing);
    }

    fn handle_property_changed(
        &mut self,
        p: ToolBarProperty,
        cx: &mut SkinContext<'_, ToolBarProperty>,
    ) {
        match p {
            ToolBarProperty::Orientation | ToolBarProperty::Spacing => cx.request_layout(),
        }
    }

    fn compute_pref_width(&self, _height: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        self.main_extent(cx, Orientation::Horizontal)
    }

    fn compute_pref_height(&self, _width: Option<f32>, cx: &MeasureContext<'_>) -> f32 {
        self.main_extent(cx, Orientation::Vertical)
    }

    fn layout_children(&mut self, content: Rect, cx: &mut LayoutContext<'_>) {
        if let Some(bg) = self.background {
            let size = self.bar.control.layout_bounds().size();
            cx.resize_relocate(bg, Rect::from_size(size));
        }
        let spacing = self.spacing(cx.snap());
        let items = self.items(&cx.measure());
        if items.is_empty() {
            return;
        }
        match self.solve(content.size(), &items, spacing) {
            Ok(rects) => {
                for (item, r) in items.iter().zip(rects) {
                    cx.layout_child(item.id, r.translate(content.x, content.y));
                }
            }
            Err(err) => log::error!("ToolBar: {err}"),
        }
    }
}
