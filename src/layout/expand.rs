use indexmap::IndexSet;

use super::ParameterFormatter;
use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

/// Vertical pin distance below which a node's inputs are left alone.
pub const EXPAND_MIN_PIN_DELTA: f32 = 150.0;
/// Share of the pin distance turned into extra horizontal room.
pub const EXPAND_FACTOR: f32 = 0.2;

impl ParameterFormatter {
    /// Pushes input trees further left when their links drop steeply, so the
    /// wires do not run almost vertically.
    pub(super) fn expand_by_height<G: GraphView>(&self, graph: &mut G) {
        if self.format_with_helixing {
            return;
        }

        let is_formatted = |pin: PinId| {
            let owner = graph.pin_owner(pin);
            self.all_formatted.contains(&owner) || self.formatted_output.contains(&owner)
        };

        let mut nodes_to_expand: IndexSet<NodeId> = self.formatted_input.clone();
        nodes_to_expand.insert(self.root);

        let mut shifts: Vec<(NodeId, f32)> = Vec::new();
        for &node in &nodes_to_expand {
            let largest_delta = graph
                .pin_links_of(node, PinDirection::Input)
                .iter()
                .filter_map(|link| Some(graph.pin_y(link.to?) - graph.pin_y(link.from?)))
                .fold(0.0_f32, f32::max);

            if largest_delta < EXPAND_MIN_PIN_DELTA {
                continue;
            }

            let expand_x = -largest_delta * EXPAND_FACTOR;
            log::trace!("expanding inputs of {node:?} by {expand_x}");
            for tree_node in graph.node_tree_with_filter(node, is_formatted, PinDirection::Input) {
                if tree_node != node && tree_node != self.root {
                    shifts.push((tree_node, expand_x));
                }
            }
        }

        for (node, dx) in shifts {
            graph.translate_node(node, dx, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::FormatterConfig;
    use crate::graph::GraphView;
    use crate::ir::{Graph, PinDirection, PinKind};
    use crate::layout::ParameterFormatter;

    #[test]
    fn steep_inputs_move_left() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 0.0, 100.0, 300.0);
        let top = graph.add_pin_at(root, "top", PinDirection::Input, PinKind::Parameter, 20.0).unwrap();
        let a = graph.add_node("A", 360.0, 0.0, 100.0, 60.0);
        let a_out = graph.add_pin_at(a, "out", PinDirection::Output, PinKind::Parameter, 20.0).unwrap();
        graph.link(a_out, top).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_node(&mut graph);
        let before = graph.node_position(a).x;

        // drop A far below its consumer pin and expand
        graph.set_node_y(a, 200.0);
        formatter.expand_by_height(&mut graph);
        assert_eq!(graph.node_position(a).x, before - 200.0 * 0.2);
        assert_eq!(graph.node_position(root).x, 500.0);
    }

    #[test]
    fn shallow_inputs_stay_put() {
        let mut graph = Graph::new();
        let root = graph.add_node("Root", 500.0, 0.0, 100.0, 80.0);
        let root_in = graph.add_pin(root, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let a = graph.add_node("A", 0.0, 0.0, 100.0, 60.0);
        let a_out = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        graph.link(a_out, root_in).unwrap();

        let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
        formatter.format_node(&mut graph);
        let placed = graph.node_position(a);
        formatter.expand_by_height(&mut graph);
        assert_eq!(graph.node_position(a), placed);
    }
}
