use indexmap::IndexSet;

use super::ParameterFormatter;
use super::types::PinLink;
use crate::graph::GraphView;
use crate::ir::{NodeId, PinDirection, PinId};

impl ParameterFormatter {
    /// Marks, per node, the first pin pair that continues in the parent's
    /// direction as sharing a row. The root is never tied to a child.
    pub(super) fn process_same_row_mapping<G: GraphView>(
        &mut self,
        graph: &G,
        current: NodeId,
        parent_pin: Option<PinId>,
        visited: &mut IndexSet<NodeId>,
    ) {
        if visited.contains(&current) {
            return;
        }

        let children = self.node_info.children_of(current);
        visited.insert(current);

        let mut first_pin = true;

        for direction in [PinDirection::Input, PinDirection::Output] {
            for my_pin in graph.pins_by_direction(current, direction) {
                if graph.is_exec_pin(my_pin) {
                    continue;
                }

                for &other_pin in graph.pin_links(my_pin) {
                    let other = graph.pin_owner(other_pin);

                    if !self.parameters.allows(other)
                        || !children.contains(&other)
                        || visited.contains(&other)
                    {
                        continue;
                    }

                    let helixing = self.applies_helixing(other);
                    let same_direction_as_parent = parent_pin
                        .is_none_or(|parent| graph.pin_direction(my_pin) == graph.pin_direction(parent));

                    if first_pin && same_direction_as_parent && !helixing && current != self.root {
                        self.same_row.insert(PinLink::new(graph, my_pin, other_pin), true);
                        self.same_row.insert(PinLink::new(graph, other_pin, my_pin), true);
                        first_pin = false;
                    }

                    self.process_same_row_mapping(graph, other, Some(my_pin), visited);
                }
            }
        }
    }

    /// Whether the pins `a` and `b` were marked to share a row.
    pub fn is_same_row<G: GraphView>(&self, graph: &G, a: PinId, b: PinId) -> bool {
        self.same_row
            .get(&PinLink::new(graph, a, b))
            .copied()
            .unwrap_or(false)
    }
}
