use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in graph space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_position_size(position: Point, size: Point) -> Self {
        Self::new(
            position.x,
            position.y,
            position.x + size.x,
            position.y + size.y,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn extend_by(&self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect::new(
            self.left - left,
            self.top - top,
            self.right + right,
            self.bottom + bottom,
        )
    }

    pub fn offset_by(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Touching edges count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.bottom < other.top
            || self.top > other.bottom
            || self.right < other.left
            || self.left > other.right)
    }
}

/// A directed traversal edge between two pins. The root of a traversal has
/// no pins and carries its node explicitly.
#[derive(Debug, Clone, Copy)]
pub struct PinLink {
    pub from: Option<PinId>,
    pub to: Option<PinId>,
    node: NodeId,
}

impl PinLink {
    pub fn new<G: GraphView>(graph: &G, from: PinId, to: PinId) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            node: graph.pin_owner(to),
        }
    }

    pub fn root(node: NodeId) -> Self {
        Self {
            from: None,
            to: None,
            node,
        }
    }

    /// The node this link leads to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Side of the parent the link propagates from. The root link counts as input.
    pub fn direction<G: GraphView>(&self, graph: &G) -> PinDirection {
        self.from
            .map(|pin| graph.pin_direction(pin))
            .unwrap_or(PinDirection::Input)
    }

    pub fn to_direction<G: GraphView>(&self, graph: &G) -> Option<PinDirection> {
        self.to.map(|pin| graph.pin_direction(pin))
    }

    pub fn reversed(&self, graph: &impl GraphView) -> Option<PinLink> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(PinLink::new(graph, to, from)),
            _ => None,
        }
    }
}

impl PartialEq for PinLink {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for PinLink {}

impl Hash for PinLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}

/// One child subtree hanging off a parent pin, gathered for centering.
#[derive(Debug, Clone)]
pub struct ChildBranch {
    pub pin: PinId,
    pub parent_pin: PinId,
    pub branch_nodes: IndexSet<NodeId>,
}

pub type SameRowMapping = IndexMap<PinLink, bool>;

pub type NodeOffsets = IndexMap<NodeId, Point>;
