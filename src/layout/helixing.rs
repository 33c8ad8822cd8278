use indexmap::IndexSet;

use super::ParameterFormatter;
use crate::config::ParameterStyle;
use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

impl ParameterFormatter {
    /// Helixing only applies to a strictly linear input chain: every node in
    /// it may consume at most one pure node and feed at most one node sitting
    /// at or left of the root.
    pub(super) fn does_helixing_apply<G: GraphView>(&self, graph: &G) -> bool {
        let style = self
            .parameters
            .override_style
            .unwrap_or(self.config.parameter_style);
        if style != ParameterStyle::Helixing {
            return false;
        }

        let root_x = graph.node_position(self.root).x;
        let allowed = |pin: PinId| {
            graph.is_parameter_pin(pin) && !self.ignored.contains(&graph.pin_owner(pin))
        };

        let mut visited: IndexSet<NodeId> = IndexSet::from([self.root]);
        let mut stack = vec![self.root];
        let mut gathered_inputs: IndexSet<NodeId> = IndexSet::new();

        while let Some(next) = stack.pop() {
            let input_nodes: IndexSet<NodeId> = graph
                .linked_to_pins(next, PinDirection::Input)
                .iter()
                .filter(|pin| allowed(**pin))
                .map(|pin| graph.pin_owner(*pin))
                .filter(|node| graph.is_node_pure(*node))
                .collect();

            let upstream_outputs: IndexSet<NodeId> = graph
                .linked_to_pins(next, PinDirection::Output)
                .iter()
                .filter(|pin| allowed(**pin))
                .map(|pin| graph.pin_owner(*pin))
                .filter(|node| *node == self.root || graph.node_position(*node).x <= root_x)
                .collect();

            if input_nodes.len() > 1 || upstream_outputs.len() > 1 {
                log::debug!("helixing rejected: {next:?} branches");
                return false;
            }

            gathered_inputs.extend(input_nodes.iter().copied());

            for node in input_nodes {
                if visited.contains(&node) || self.ignored.contains(&node) {
                    continue;
                }
                visited.insert(node);
                stack.push(node);
            }
        }

        if self.config.limit_helixing_height {
            let mut total_height = 0.0;
            for &node in &gathered_inputs {
                if node == self.root {
                    continue;
                }
                let height = graph.node_size(node).y;
                if height > self.config.single_node_max_height {
                    log::debug!("helixing rejected: {node:?} is too tall");
                    return false;
                }
                total_height += height;
            }

            if total_height > self.config.helixing_height_max {
                log::debug!("helixing rejected: stack height {total_height}");
                return false;
            }
        }

        true
    }
}
