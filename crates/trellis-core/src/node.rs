//! # Layout nodes
//!
//! Skins draw with a retained tree of nodes stored in a `NodeTree` arena.
//! Every skin receives a root group node when it is installed and hangs its
//! private nodes (tracks, thumbs, labels) below it.
//!
//! Visual attributes (color, text, visibility, rotation) can be changed at any
//! time. Geometry can only be changed through a `LayoutContext`, i.e. inside a
//! position pass, where it is pixel snapped.

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::scene::{Scene, SceneNode};
use crate::{Color, Rect};

new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Rect { color: Color, radius: f32 },
    Text { text: String, color: Color, size: f32 },
}

#[derive(Clone, Debug)]
pub struct Node {
    kind: NodeKind,
    bounds: Rect,
    visible: bool,
    clip: bool,
    rotation: f32,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            bounds: Rect::ZERO,
            visible: true,
            clip: false,
            rotation: 0.0,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Bounds relative to the parent node.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn clips(&self) -> bool {
        self.clip
    }

    /// Radians, around the node's center.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match &self.kind {
            NodeKind::Rect { color, .. } | NodeKind::Text { color, .. } => Some(*color),
            NodeKind::Group => None,
        }
    }
}

#[derive(Default)]
pub struct NodeTree {
    nodes: SlotMap<NodeId, Node>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node::new(kind))
    }

    /// Creates a node as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.create(kind);
        self.append(parent, id);
        id
    }

    /// Moves `child` to the end of `parent`'s children, detaching it from its
    /// previous parent first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.insert(parent, usize::MAX, child);
    }

    /// Like `append`, but places `child` at `index` among `parent`'s
    /// children (clamped to the end).
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
    }

    /// Removes `id` and its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.remove(n) {
                stack.extend(node.children);
            }
        }
    }

    pub fn set_color(&mut self, id: NodeId, c: Color) {
        if let Some(n) = self.nodes.get_mut(id) {
            match &mut n.kind {
                NodeKind::Rect { color, .. } | NodeKind::Text { color, .. } => *color = c,
                NodeKind::Group => {}
            }
        }
    }

    pub fn set_text(&mut self, id: NodeId, t: impl Into<String>) {
        if let Some(Node {
            kind: NodeKind::Text { text, .. },
            ..
        }) = self.nodes.get_mut(id)
        {
            *text = t.into();
        }
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.visible = visible;
        }
    }

    pub fn set_clip(&mut self, id: NodeId, clip: bool) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.clip = clip;
        }
    }

    pub fn set_rotation(&mut self, id: NodeId, radians: f32) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.rotation = radians;
        }
    }

    pub(crate) fn relocate(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.bounds.x = x;
            n.bounds.y = y;
        }
    }

    pub(crate) fn resize(&mut self, id: NodeId, w: f32, h: f32) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.bounds.w = w;
            n.bounds.h = h;
        }
    }

    /// Bounds in the coordinate space of the topmost ancestor.
    pub fn absolute_bounds(&self, id: NodeId) -> Option<Rect> {
        let mut r = self.nodes.get(id)?.bounds;
        let mut cur = self.nodes.get(id)?.parent;
        while let Some(p) = cur {
            let node = self.nodes.get(p)?;
            r = r.translate(node.bounds.x, node.bounds.y);
            cur = node.parent;
        }
        Some(r)
    }

    /// Flattens the visible subtree under `root` into `scene`, in absolute
    /// coordinates relative to `root`'s parent.
    pub fn paint_into(&self, root: NodeId, scene: &mut Scene) {
        self.paint_node(root, (0.0, 0.0), scene);
    }

    fn paint_node(&self, id: NodeId, origin: (f32, f32), scene: &mut Scene) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let rect = node.bounds.translate(origin.0, origin.1);
        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Rect { color, radius } => scene.nodes.push(SceneNode::Rect {
                rect,
                color: *color,
                radius: *radius,
                rotation: node.rotation,
            }),
            NodeKind::Text { text, color, size } => scene.nodes.push(SceneNode::Text {
                rect,
                text: text.clone(),
                color: *color,
                size: *size,
            }),
        }
        if node.clip {
            scene.nodes.push(SceneNode::PushClip { rect });
        }
        for child in &node.children {
            self.paint_node(*child, (rect.x, rect.y), scene);
        }
        if node.clip {
            scene.nodes.push(SceneNode::PopClip);
        }
    }
}
