use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;

use super::ParameterFormatter;
use super::node_info::InfoId;
use super::types::PinLink;
use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

#[derive(Debug, Clone, Copy)]
struct ParentRef {
    pin: PinId,
    node: NodeId,
    info: InfoId,
}

fn pop_link(
    initial_direction: PinDirection,
    input_queue: &mut VecDeque<PinLink>,
    output_queue: &mut VecDeque<PinLink>,
) -> Option<PinLink> {
    let (primary, fallback) = match initial_direction {
        PinDirection::Input => (input_queue, output_queue),
        PinDirection::Output => (output_queue, input_queue),
    };
    primary.pop_front().or_else(|| fallback.pop_front())
}

impl ParameterFormatter {
    /// Assigns horizontal positions: one output-seeded and one input-seeded
    /// breadth-first pass sharing a freshly reset node-info tree.
    pub(super) fn format_x<G: GraphView>(&mut self, graph: &mut G) {
        let mut visited_links: HashSet<PinLink> = HashSet::new();
        let mut placed_by_output: IndexSet<NodeId> = IndexSet::new();

        self.node_info.reset();

        for initial_direction in [PinDirection::Output, PinDirection::Input] {
            visited_links.clear();

            let mut input_queue = VecDeque::new();
            let mut output_queue = VecDeque::new();
            let root_link = PinLink::root(self.root);
            match initial_direction {
                PinDirection::Input => input_queue.push_back(root_link),
                PinDirection::Output => output_queue.push_back(root_link),
            }

            while let Some(link) = pop_link(initial_direction, &mut input_queue, &mut output_queue) {
                let current = link.node();

                let parent = match link.from {
                    Some(pin) => {
                        let node = graph.pin_owner(pin);
                        match self.node_info.get(node) {
                            Some(info) => Some(ParentRef { pin, node, info }),
                            None => {
                                log::trace!("parent of {current:?} left the tree, skipping link");
                                continue;
                            }
                        }
                    }
                    None => None,
                };

                // Nodes placed while propagating outward are re-placed from scratch
                // when the input pass reaches them.
                if initial_direction == PinDirection::Input
                    && current != self.root
                    && self.node_info.contains(current)
                    && placed_by_output.contains(&current)
                {
                    self.node_info.remove(current);
                    placed_by_output.shift_remove(&current);
                }

                match self.node_info.get(current) {
                    Some(current_info) => {
                        if let (Some(parent), Some(my_pin)) = (parent, link.to) {
                            if current != self.root
                                && Some(parent.node) != self.node_info.parent_node(current_info)
                            {
                                self.consider_new_parent(graph, current, current_info, parent, my_pin);
                            }
                        }
                    }
                    None => {
                        self.place_new_node(graph, &link, initial_direction, parent);
                        if initial_direction == PinDirection::Output {
                            placed_by_output.insert(current);
                        }
                    }
                }

                let Some(current_info) = self.node_info.get(current) else {
                    continue;
                };
                self.enqueue_linked(
                    graph,
                    current,
                    current_info,
                    initial_direction,
                    &mut visited_links,
                    &mut input_queue,
                    &mut output_queue,
                );
            }
        }
    }

    fn place_new_node<G: GraphView>(
        &mut self,
        graph: &mut G,
        link: &PinLink,
        initial_direction: PinDirection,
        parent: Option<ParentRef>,
    ) {
        let current = link.node();
        graph.mark_modified(current);

        if let Some(parent) = parent.filter(|_| current != self.root) {
            let link_direction = link.direction(graph);
            let parent_is_anchor = parent.node == self.root;
            if initial_direction == PinDirection::Input
                && link_direction == PinDirection::Input
                && (parent_is_anchor || self.formatted_input.contains(&parent.node))
            {
                self.formatted_input.insert(current);
            } else if initial_direction == PinDirection::Output
                && link_direction == PinDirection::Output
                && (parent_is_anchor || self.formatted_output.contains(&parent.node))
            {
                self.formatted_output.insert(current);
            }

            let x = if self.applies_helixing(current) {
                graph.node_position(parent.node).x
            } else {
                self.child_x(graph, parent.pin, current)
            };
            graph.set_node_x(current, x);
            log::trace!("placed {current:?} at x={x} ({initial_direction:?} pass)");
        }

        self.all_formatted.insert(current);
        self.node_info.insert(
            current,
            link.to,
            parent.map(|parent| parent.info),
            parent.map(|parent| parent.pin),
            initial_direction,
        );
    }

    fn consider_new_parent<G: GraphView>(
        &mut self,
        graph: &mut G,
        current: NodeId,
        current_info: InfoId,
        parent: ParentRef,
        my_pin: PinId,
    ) {
        let current_x = graph.node_position(current).x;
        let helixing = self.applies_helixing(current);
        let new_x = if helixing {
            current_x
        } else {
            self.child_x(graph, parent.pin, current)
        };

        let parent_direction = graph.pin_direction(parent.pin);
        let is_better = helixing
            || match parent_direction {
                PinDirection::Input => new_x < current_x,
                PinDirection::Output => new_x > current_x,
            };
        let same_direction = self.node_info.info(current_info).direction == parent_direction;

        if !(is_better && same_direction) {
            return;
        }

        if self.node_info.detect_cycle(parent.info, current_info) {
            log::debug!("refusing to parent {current:?} under its descendant {:?}", parent.node);
            return;
        }

        log::trace!(
            "{current:?} takes new parent {:?}: x {current_x} -> {new_x}",
            parent.node
        );
        graph.set_node_x(current, new_x);
        self.node_info
            .set_parent(current_info, Some(parent.info), Some(my_pin), Some(parent.pin));
        let mut moved = IndexSet::new();
        self.move_children(graph, current_info, &mut moved);
    }

    /// Re-anchors the subtree below `info` after its node moved horizontally.
    fn move_children<G: GraphView>(
        &self,
        graph: &mut G,
        info: InfoId,
        moved: &mut IndexSet<NodeId>,
    ) {
        let node = self.node_info.info(info).node;
        moved.insert(node);
        let node_x = graph.node_position(node).x;

        for &child in &self.node_info.info(info).children {
            let child_info = self.node_info.info(child);
            let child_node = child_info.node;
            if moved.contains(&child_node) {
                continue;
            }
            let Some(parent_pin) = child_info.parent_pin else {
                continue;
            };
            let x = if self.applies_helixing(child_node) {
                node_x
            } else {
                self.child_x(graph, parent_pin, child_node)
            };
            graph.set_node_x(child_node, x);
            self.move_children(graph, child, moved);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn enqueue_linked<G: GraphView>(
        &self,
        graph: &G,
        current: NodeId,
        current_info: InfoId,
        initial_direction: PinDirection,
        visited_links: &mut HashSet<PinLink>,
        input_queue: &mut VecDeque<PinLink>,
        output_queue: &mut VecDeque<PinLink>,
    ) {
        // An impure root only spreads along the side of the current pass.
        let root_is_impure = current == self.root && graph.is_node_impure(current);
        let direction = root_is_impure.then_some(initial_direction);

        for pin in graph.linked_pins(current, direction) {
            if !(graph.is_parameter_pin(pin) || graph.is_delegate_pin(pin)) {
                continue;
            }

            for &linked_pin in graph.pin_links(pin) {
                let linked_node = graph.pin_owner(linked_pin);

                if !self.parameters.allows(linked_node) {
                    continue;
                }

                if graph.is_node_impure(linked_node) || graph.is_knot_node(linked_node) {
                    continue;
                }

                let link = PinLink::new(graph, pin, linked_pin);
                if !visited_links.insert(link) {
                    continue;
                }

                if let Some(linked_info) = self.node_info.get(linked_node) {
                    if self.node_info.detect_cycle(current_info, linked_info) {
                        continue;
                    }
                }

                if linked_node == self.root && graph.is_node_impure(self.root) {
                    continue;
                }

                if self.ignored.contains(&linked_node) {
                    continue;
                }

                match graph.pin_direction(pin) {
                    PinDirection::Input => input_queue.push_back(link),
                    PinDirection::Output => output_queue.push_back(link),
                }
            }
        }
    }

    /// X for a child placed beside the node owning `parent_pin`: left of it
    /// for input pins, right of it for output pins.
    pub(super) fn child_x<G: GraphView>(&self, graph: &G, parent_pin: PinId, child: NodeId) -> f32 {
        let parent_bounds = graph.node_bounds(graph.pin_owner(parent_pin));
        let child_width = graph.node_size(child).x;
        let padding = self.padding().x.max(1.0);

        let x = match graph.pin_direction(parent_pin) {
            PinDirection::Input => parent_bounds.left - child_width - padding,
            PinDirection::Output => parent_bounds.right + padding,
        };
        (x + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::FormatterConfig;
    use crate::graph::GraphView;
    use crate::ir::{Graph, NodeId, PinDirection, PinKind};
    use crate::layout::ParameterFormatter;

    fn pure(graph: &mut Graph, name: &str, width: f32) -> NodeId {
        graph.add_node(name, 0.0, 0.0, width, 60.0)
    }

    #[test]
    fn inputs_go_left_and_outputs_go_right() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 100.0, 150.0, 80.0);
        let root_in = graph.add_pin(root, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let root_out = graph.add_pin(root, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let a = pure(&mut graph, "A", 100.0);
        let a_out = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let b = pure(&mut graph, "B", 120.0);
        let b_in = graph.add_pin(b, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        graph.link(a_out, root_in).unwrap();
        graph.link(root_out, b_in).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_x(&mut graph);

        assert_eq!(graph.node_position(a).x, 500.0 - 100.0 - 40.0);
        assert_eq!(graph.node_position(b).x, 650.0 + 40.0);
        assert!(formatter.formatted_input_nodes().contains(&a));
        assert!(formatter.formatted_output_nodes().contains(&b));
        assert_eq!(formatter.parent_of(a), Some(root));
        assert_eq!(formatter.parent_of(b), Some(root));
        assert!(graph.node(a).modified);
    }

    #[test]
    fn shared_input_moves_to_the_farther_consumer() {
        // Root <- M <- S and Root <- S: S ends up left of M, not beside Root.
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 0.0, 100.0, 80.0);
        let root_a = graph.add_pin(root, "a", PinDirection::Input, PinKind::Parameter).unwrap();
        let root_b = graph.add_pin(root, "b", PinDirection::Input, PinKind::Parameter).unwrap();
        let m = pure(&mut graph, "M", 100.0);
        let m_in = graph.add_pin(m, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let m_out = graph.add_pin(m, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let s = pure(&mut graph, "S", 100.0);
        let s_out = graph.add_pin(s, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        graph.link(m_out, root_a).unwrap();
        graph.link(s_out, root_b).unwrap();
        graph.link(s_out, m_in).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_x(&mut graph);

        assert_eq!(graph.node_position(m).x, 360.0);
        assert_eq!(graph.node_position(s).x, 220.0);
        assert_eq!(formatter.parent_of(s), Some(m));
    }

    #[test]
    fn child_x_rounds_to_whole_units() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 0.0, 0.0, 100.5, 80.0);
        let root_out = graph.add_pin(root, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let child = pure(&mut graph, "C", 10.0);

        let mut config = FormatterConfig::default();
        config.padding_x = 0.0;
        let formatter = ParameterFormatter::new(root, config);
        assert_eq!(formatter.child_x(&graph, root_out, child), 102.0);
    }

    #[test]
    fn exec_links_and_impure_nodes_do_not_propagate() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 0.0, 0.0, 100.0, 80.0);
        graph.add_pin(root, "exec", PinDirection::Input, PinKind::Exec).unwrap();
        let root_in = graph.add_pin(root, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let impure = graph.add_node("Impure", 0.0, 0.0, 100.0, 80.0);
        graph.add_pin(impure, "exec", PinDirection::Output, PinKind::Exec).unwrap();
        let impure_out = graph.add_pin(impure, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        graph.link(impure_out, root_in).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_x(&mut graph);

        assert_eq!(formatter.formatted_nodes().len(), 1);
        assert_eq!(graph.node_position(impure).x, 0.0);
    }

    #[test]
    fn knots_are_left_alone() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 100.0, 100.0, 80.0);
        let root_in = graph.add_pin(root, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let knot = graph.add_knot("Knot", 5.0, 5.0);
        let knot_out = graph.add_pin(knot, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        graph.link(knot_out, root_in).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_node(&mut graph);

        assert_eq!(formatter.formatted_nodes().len(), 1);
        assert!(!formatter.formatted_nodes().contains(&knot));
        assert_eq!((graph.node(knot).x, graph.node(knot).y), (5.0, 5.0));
        assert!(!graph.node(knot).modified);
    }

    #[test]
    fn delegate_links_propagate_like_parameters() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 100.0, 100.0, 80.0);
        let root_event = graph.add_pin(root, "event", PinDirection::Input, PinKind::Delegate).unwrap();
        let d = pure(&mut graph, "D", 120.0);
        let d_out = graph.add_pin(d, "delegate", PinDirection::Output, PinKind::Delegate).unwrap();
        graph.link(d_out, root_event).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_x(&mut graph);

        assert!(formatter.formatted_nodes().contains(&d));
        assert!(formatter.formatted_input_nodes().contains(&d));
        assert_eq!(graph.node_position(d).x, 500.0 - 120.0 - 40.0);
        assert_eq!(formatter.parent_of(d), Some(root));
    }
}
