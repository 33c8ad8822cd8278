use indexmap::IndexSet;

use super::ParameterFormatter;
use super::types::ChildBranch;
use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

/// Upper bound on downward nudges while clearing one node's collisions.
pub const MAX_COLLISION_ITERATIONS: usize = 100;

impl ParameterFormatter {
    /// Depth-first vertical placement over the node-info tree.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn format_y<G: GraphView>(
        &mut self,
        graph: &mut G,
        current: NodeId,
        current_pin: Option<PinId>,
        parent_pin: Option<PinId>,
        visited: &mut IndexSet<NodeId>,
        same_row: bool,
        out_children: &mut IndexSet<NodeId>,
    ) {
        if visited.contains(&current) {
            return;
        }

        let children = self.node_info.children_of(current);

        if !self.resolve_collisions(graph, current, visited) {
            self.collision_limited.insert(current);
        }

        visited.insert(current);

        let mut first_pin = true;

        for direction in [PinDirection::Input, PinDirection::Output] {
            let mut last_linked: Option<PinId> = None;
            let mut branches: Vec<ChildBranch> = Vec::new();

            for my_pin in graph.pins_by_direction(current, direction) {
                if graph.is_exec_pin(my_pin) {
                    last_linked = Some(my_pin);
                    continue;
                }

                let linked_to = graph.pin_links(my_pin).to_vec();

                for &other_pin in &linked_to {
                    let other = graph.pin_owner(other_pin);

                    if self.ignored.contains(&other)
                        || !self.parameters.allows(other)
                        || !children.contains(&other)
                        || visited.contains(&other)
                    {
                        continue;
                    }

                    // helixed inputs stack under their consumer instead of lining up
                    let helixing = self.applies_helixing(other);
                    if helixing {
                        let bottom = graph.node_bounds(current).bottom;
                        graph.set_node_y(other, bottom + self.padding().y);
                    } else {
                        graph.straighten_pin(my_pin, other_pin);
                    }

                    let same_direction_as_parent = parent_pin
                        .is_none_or(|parent| graph.pin_direction(my_pin) == graph.pin_direction(parent));

                    let mut child_is_same_row = false;
                    if first_pin && same_direction_as_parent && !helixing && current != self.root {
                        child_is_same_row = true;
                        first_pin = false;
                    }

                    let mut local_children = IndexSet::new();
                    self.format_y(
                        graph,
                        other,
                        Some(other_pin),
                        Some(my_pin),
                        visited,
                        child_is_same_row,
                        &mut local_children,
                    );
                    out_children.extend(local_children.iter().copied());

                    if !(self.format_with_helixing && direction == PinDirection::Input) {
                        if let Some(pin_to_avoid) = last_linked {
                            self.move_below_pin(graph, pin_to_avoid, &local_children);
                        }
                    }

                    branches.push(ChildBranch {
                        pin: other_pin,
                        parent_pin: my_pin,
                        branch_nodes: local_children,
                    });
                }

                if !linked_to.is_empty() {
                    last_linked = Some(my_pin);
                }
            }

            // branches reaching past our own x cannot be centered on us
            let child_bounds = graph.node_array_bounds(
                branches
                    .iter()
                    .flat_map(|branch| branch.branch_nodes.iter().copied()),
            );
            let children_too_big =
                child_bounds.is_some_and(|bounds| graph.node_position(current).x < bounds.right);

            if self.config.center_branches
                && direction == PinDirection::Input
                && !branches.is_empty()
                && branches.len() >= self.config.num_required_branches
                && !children_too_big
                && graph.is_node_pure(current)
            {
                self.center_branches(graph, current, &branches, visited);
            }
        }

        out_children.insert(current);

        if same_row {
            if let (Some(current_pin), Some(parent_pin)) = (current_pin, parent_pin) {
                graph.straighten_pin(current_pin, parent_pin);
            }
        }
    }

    /// Pushes `node` down until its padded bounds clear every visited node.
    /// Returns false when the iteration cap ran out first.
    fn resolve_collisions<G: GraphView>(
        &self,
        graph: &mut G,
        node: NodeId,
        visited: &IndexSet<NodeId>,
    ) -> bool {
        let padding_y = self.padding().y;

        for _ in 0..MAX_COLLISION_ITERATIONS {
            let mut collided = false;

            for &other in visited {
                if other == node {
                    continue;
                }

                let my_bounds = graph.node_bounds(node);
                let other_bounds = graph.node_bounds(other).extend_by(0.0, 0.0, 0.0, padding_y);

                if my_bounds
                    .extend_by(0.0, 0.0, 0.0, padding_y)
                    .intersects(&other_bounds)
                {
                    let delta = other_bounds.bottom - my_bounds.top;
                    graph.translate_node(node, 0.0, delta + 1.0);
                    collided = true;
                    break;
                }
            }

            if !collided {
                return true;
            }
        }

        log::debug!("gave up clearing collisions for {node:?} after {MAX_COLLISION_ITERATIONS} moves");
        false
    }

    fn move_below_pin<G: GraphView>(
        &self,
        graph: &mut G,
        pin_to_avoid: PinId,
        nodes: &IndexSet<NodeId>,
    ) {
        let Some(bounds) = graph.node_array_bounds(nodes.iter().copied()) else {
            return;
        };

        let pin_y = graph.pin_y(pin_to_avoid) + self.config.vertical_pin_spacing;
        let delta = pin_y - bounds.top;
        if delta > 0.0 {
            for &node in nodes {
                graph.translate_node(node, 0.0, delta);
            }
        }
    }

    /// Centres the child branches on the parent's connecting pins, then moves
    /// the whole group (parent included) below anything it now overlaps.
    pub(super) fn center_branches<G: GraphView>(
        &self,
        graph: &mut G,
        current: NodeId,
        branches: &[ChildBranch],
        nodes_to_collision_check: &IndexSet<NodeId>,
    ) {
        let child_pins: Vec<PinId> = branches.iter().map(|branch| branch.pin).collect();
        let parent_pins: Vec<PinId> = branches.iter().map(|branch| branch.parent_pin).collect();

        let children_center = graph.center_y_of_pins(&child_pins);
        let parent_center = graph.center_y_of_pins(&parent_pins);
        let offset = parent_center - children_center;

        let mut all_nodes: IndexSet<NodeId> = IndexSet::new();
        for branch in branches {
            for &child in &branch.branch_nodes {
                if all_nodes.insert(child) {
                    graph.translate_node(child, 0.0, offset);
                }
            }
        }

        all_nodes.insert(current);

        let Some(mut group_bounds) = graph.node_array_bounds(all_nodes.iter().copied()) else {
            return;
        };
        let initial_top = group_bounds.top;
        let padding_y = self.padding().y;

        for &node in nodes_to_collision_check {
            if all_nodes.contains(&node) {
                continue;
            }

            let bounds = graph
                .node_bounds(node)
                .extend_by(0.0, padding_y, 0.0, padding_y);
            if bounds.intersects(&group_bounds) {
                group_bounds = group_bounds.offset_by(0.0, bounds.bottom - group_bounds.top);
            }
        }

        let delta_y = group_bounds.top - initial_top;
        if delta_y != 0.0 {
            for &node in &all_nodes {
                graph.translate_node(node, 0.0, delta_y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;

    use crate::config::FormatterConfig;
    use crate::graph::GraphView;
    use crate::ir::{Graph, PinDirection, PinKind};
    use crate::layout::ParameterFormatter;
    use crate::layout::types::ChildBranch;

    #[test]
    fn centering_moves_group_below_blockers() {
        let mut graph = Graph::new();
        let parent = graph.add_node("P", 500.0, 0.0, 100.0, 100.0);
        let p_in = graph.add_pin_at(parent, "in", PinDirection::Input, PinKind::Parameter, 50.0).unwrap();
        let child = graph.add_node("C", 300.0, 200.0, 100.0, 40.0);
        let c_out = graph.add_pin_at(child, "out", PinDirection::Output, PinKind::Parameter, 20.0).unwrap();
        let blocker = graph.add_node("X", 300.0, -100.0, 100.0, 100.0);

        let formatter = ParameterFormatter::new(parent, FormatterConfig::default());
        let branches = vec![ChildBranch {
            pin: c_out,
            parent_pin: p_in,
            branch_nodes: IndexSet::from([child]),
        }];
        let visited = IndexSet::from([blocker, parent, child]);
        formatter.center_branches(&mut graph, parent, &branches, &visited);

        // child centred at y=30, group top 0 hits the blocker padded to 25,
        // so the whole group drops by 25.
        assert_eq!(graph.node_position(child).y, 55.0);
        assert_eq!(graph.node_position(parent).y, 25.0);
        assert_eq!(graph.pin_y(c_out), graph.pin_y(p_in));
    }
}
