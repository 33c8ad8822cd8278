//! The narrow view of the host editor's graph that the formatter works
//! through. Hosts own their nodes; the formatter only ever holds ids.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::ir::{NodeId, PinDirection, PinId, PinKind};
use crate::layout::types::{PinLink, Point, Rect};

pub trait GraphView {
    fn contains_node(&self, node: NodeId) -> bool;
    /// Top-left corner of the node.
    fn node_position(&self, node: NodeId) -> Point;
    fn set_node_position(&mut self, node: NodeId, position: Point);
    fn node_size(&self, node: NodeId) -> Point;
    /// Pins in display order.
    fn node_pins(&self, node: NodeId) -> &[PinId];
    fn is_knot_node(&self, node: NodeId) -> bool;

    fn pin_owner(&self, pin: PinId) -> NodeId;
    fn pin_direction(&self, pin: PinId) -> PinDirection;
    fn pin_kind(&self, pin: PinId) -> PinKind;
    fn pin_links(&self, pin: PinId) -> &[PinId];
    fn pin_position(&self, pin: PinId) -> Point;

    /// Hook for the host's undo system.
    fn mark_modified(&mut self, _node: NodeId) {}

    /// Counter the host bumps whenever nodes, pins or links change. Hosts
    /// that cannot track this keep the default and invalidate caches by hand.
    fn structure_version(&self) -> u64 {
        0
    }

    fn node_bounds(&self, node: NodeId) -> Rect {
        Rect::from_position_size(self.node_position(node), self.node_size(node))
    }

    /// Union of the bounds of `nodes`, `None` when empty.
    fn node_array_bounds<I>(&self, nodes: I) -> Option<Rect>
    where
        I: IntoIterator<Item = NodeId>,
        Self: Sized,
    {
        nodes
            .into_iter()
            .map(|node| self.node_bounds(node))
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    fn translate_node(&mut self, node: NodeId, dx: f32, dy: f32) {
        let position = self.node_position(node);
        self.set_node_position(node, Point::new(position.x + dx, position.y + dy));
    }

    fn set_node_x(&mut self, node: NodeId, x: f32) {
        let position = self.node_position(node);
        self.set_node_position(node, Point::new(x, position.y));
    }

    fn set_node_y(&mut self, node: NodeId, y: f32) {
        let position = self.node_position(node);
        self.set_node_position(node, Point::new(position.x, y));
    }

    fn pin_y(&self, pin: PinId) -> f32 {
        self.pin_position(pin).y
    }

    fn is_exec_pin(&self, pin: PinId) -> bool {
        self.pin_kind(pin) == PinKind::Exec
    }

    fn is_parameter_pin(&self, pin: PinId) -> bool {
        self.pin_kind(pin) == PinKind::Parameter
    }

    fn is_delegate_pin(&self, pin: PinId) -> bool {
        self.pin_kind(pin) == PinKind::Delegate
    }

    /// A pure node carries no execution pins.
    fn is_node_pure(&self, node: NodeId) -> bool {
        !self.node_pins(node).iter().any(|pin| self.is_exec_pin(*pin))
    }

    fn is_node_impure(&self, node: NodeId) -> bool {
        !self.is_node_pure(node)
    }

    fn pins_by_direction(&self, node: NodeId, direction: PinDirection) -> Vec<PinId> {
        self.node_pins(node)
            .iter()
            .copied()
            .filter(|pin| self.pin_direction(*pin) == direction)
            .collect()
    }

    /// Pins of `node` that have at least one link. `None` means both sides.
    fn linked_pins(&self, node: NodeId, direction: Option<PinDirection>) -> Vec<PinId> {
        self.node_pins(node)
            .iter()
            .copied()
            .filter(|pin| direction.is_none_or(|dir| self.pin_direction(*pin) == dir))
            .filter(|pin| !self.pin_links(*pin).is_empty())
            .collect()
    }

    /// Pins on other nodes linked to the `direction` side of `node`.
    fn linked_to_pins(&self, node: NodeId, direction: PinDirection) -> Vec<PinId> {
        self.pins_by_direction(node, direction)
            .into_iter()
            .flat_map(|pin| self.pin_links(pin).to_vec())
            .collect()
    }

    fn linked_nodes(&self, node: NodeId) -> IndexSet<NodeId> {
        self.node_pins(node)
            .iter()
            .flat_map(|pin| self.pin_links(*pin).iter())
            .map(|pin| self.pin_owner(*pin))
            .collect()
    }

    fn pin_links_of(&self, node: NodeId, direction: PinDirection) -> Vec<PinLink>
    where
        Self: Sized,
    {
        let mut links = Vec::new();
        for pin in self.pins_by_direction(node, direction) {
            for linked in self.pin_links(pin) {
                links.push(PinLink::new(self, pin, *linked));
            }
        }
        links
    }

    /// Moves the node owning `to_align` so that it sits level with `source`.
    fn straighten_pin(&mut self, source: PinId, to_align: PinId) {
        let delta = self.pin_y(source) - self.pin_y(to_align);
        let node = self.pin_owner(to_align);
        self.translate_node(node, 0.0, delta);
    }

    fn center_y_of_pins(&self, pins: &[PinId]) -> f32 {
        if pins.is_empty() {
            return 0.0;
        }
        let sum: f32 = pins.iter().map(|pin| self.pin_y(*pin)).sum();
        sum / pins.len() as f32
    }

    /// Breadth-first tree reachable from `start` through `direction` pins
    /// only, keeping nodes whose linking pin passes `filter`. Includes `start`.
    fn node_tree_with_filter<F>(
        &self,
        start: NodeId,
        filter: F,
        direction: PinDirection,
    ) -> IndexSet<NodeId>
    where
        F: Fn(PinId) -> bool,
        Self: Sized,
    {
        let mut tree = IndexSet::new();
        let mut queue = VecDeque::new();
        tree.insert(start);
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for pin in self.linked_to_pins(node, direction) {
                if !filter(pin) {
                    continue;
                }
                let owner = self.pin_owner(pin);
                if tree.insert(owner) {
                    queue.push_back(owner);
                }
            }
        }
        tree
    }
}
