//! Parameter layout: positions the pure nodes feeding (and fed by) a root
//! node so that data flows left to right and directly linked pins share rows.

mod expand;
mod format_x;
mod format_y;
mod helixing;
mod node_info;
mod same_row;
pub mod types;

pub use expand::{EXPAND_FACTOR, EXPAND_MIN_PIN_DELTA};
pub use format_y::MAX_COLLISION_ITERATIONS;
pub use node_info::{InfoId, NodeInfo, NodeInfoTree};
pub use types::*;

use indexmap::IndexSet;

use crate::config::{FormatterConfig, ParameterStyle};
use crate::graph::GraphView;
use crate::ir::NodeId;

/// Per-request knobs supplied by whoever triggers the format.
#[derive(Debug, Clone, Default)]
pub struct FormatterParameters {
    /// When non-empty, only these nodes may be moved.
    pub nodes_to_format: IndexSet<NodeId>,
    pub override_style: Option<ParameterStyle>,
}

impl FormatterParameters {
    pub fn allows(&self, node: NodeId) -> bool {
        self.nodes_to_format.is_empty() || self.nodes_to_format.contains(&node)
    }
}

#[derive(Debug)]
pub struct ParameterFormatter {
    root: NodeId,
    keep_still: NodeId,
    ignored: IndexSet<NodeId>,
    parameters: FormatterParameters,
    config: FormatterConfig,
    format_with_helixing: bool,
    initialized: bool,
    all_formatted: IndexSet<NodeId>,
    formatted_input: IndexSet<NodeId>,
    formatted_output: IndexSet<NodeId>,
    node_info: NodeInfoTree,
    same_row: SameRowMapping,
    node_offsets: NodeOffsets,
    collision_limited: IndexSet<NodeId>,
}

impl ParameterFormatter {
    pub fn new(root: NodeId, config: FormatterConfig) -> Self {
        Self {
            root,
            keep_still: root,
            ignored: IndexSet::new(),
            parameters: FormatterParameters::default(),
            config,
            format_with_helixing: false,
            initialized: false,
            all_formatted: IndexSet::from([root]),
            formatted_input: IndexSet::new(),
            formatted_output: IndexSet::new(),
            node_info: NodeInfoTree::default(),
            same_row: SameRowMapping::default(),
            node_offsets: NodeOffsets::default(),
            collision_limited: IndexSet::new(),
        }
    }

    /// Node whose on-screen position survives a format. Defaults to the root.
    pub fn with_keep_still(mut self, node: NodeId) -> Self {
        self.keep_still = node;
        self
    }

    pub fn with_ignored(mut self, ignored: impl IntoIterator<Item = NodeId>) -> Self {
        self.ignored = ignored.into_iter().collect();
        self
    }

    pub fn with_parameters(mut self, parameters: FormatterParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn keep_still(&self) -> NodeId {
        self.keep_still
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub(crate) fn padding(&self) -> Point {
        Point::new(self.config.padding_x, self.config.padding_y)
    }

    /// Helixed nodes are the input-side nodes of a run where helixing won.
    pub(crate) fn applies_helixing(&self, node: NodeId) -> bool {
        self.format_with_helixing && self.formatted_input.contains(&node)
    }

    pub fn format_node<G: GraphView>(&mut self, graph: &mut G) {
        if !graph.contains_node(self.root) {
            log::debug!("root {:?} is not in the graph, nothing to format", self.root);
            return;
        }

        if graph.linked_pins(self.root, None).is_empty() {
            self.all_formatted = IndexSet::from([self.root]);
            return;
        }

        let keep_still = if graph.contains_node(self.keep_still) {
            self.keep_still
        } else {
            self.root
        };
        let saved_bounds = graph.node_bounds(keep_still);

        if self.initialized {
            self.simple_relative_formatting(graph, keep_still);
            return;
        }

        log::debug!("formatting parameters of {:?}", self.root);

        self.all_formatted = IndexSet::from([self.root]);
        self.formatted_input.clear();
        self.formatted_output.clear();
        self.node_offsets.clear();
        self.collision_limited.clear();

        self.format_with_helixing = self.does_helixing_apply(graph);

        self.format_x(graph);

        let mut same_row_visited = IndexSet::new();
        self.same_row.clear();
        self.process_same_row_mapping(graph, self.root, None, &mut same_row_visited);

        self.format_x(graph);

        if self.format_with_helixing {
            self.shift_outputs_past_helix(graph);
        }

        let mut visited = IndexSet::new();
        let mut children = IndexSet::new();
        self.format_y(graph, self.root, None, None, &mut visited, false, &mut children);

        if self.config.expand_parameters_by_height && graph.is_node_pure(self.root) {
            self.expand_by_height(graph);
        }

        let new_bounds = graph.node_bounds(keep_still);
        let delta_x = saved_bounds.left - new_bounds.left;
        let delta_y = saved_bounds.top - new_bounds.top;
        if delta_x != 0.0 || delta_y != 0.0 {
            for &node in &self.all_formatted {
                graph.translate_node(node, delta_x, delta_y);
            }
        }

        if !self.collision_limited.is_empty() {
            log::debug!(
                "{} node(s) still overlap after the collision cap",
                self.collision_limited.len()
            );
        }
    }

    /// Moves output-side nodes right so they clear the helixed input column.
    fn shift_outputs_past_helix<G: GraphView>(&self, graph: &mut G) {
        let Some(input_bounds) = graph.node_array_bounds(self.formatted_input.iter().copied())
        else {
            return;
        };
        let delta = input_bounds.right - graph.node_bounds(self.root).right;
        if delta > 0.0 {
            for &node in &self.formatted_output {
                graph.translate_node(node, delta, 0.0);
            }
        }
    }

    fn simple_relative_formatting<G: GraphView>(&self, graph: &mut G, keep_still: NodeId) {
        let anchor = graph.node_position(keep_still);
        for (&node, offset) in &self.node_offsets {
            if !graph.contains_node(node) {
                continue;
            }
            graph.set_node_position(node, Point::new(anchor.x + offset.x, anchor.y + offset.y));
        }
    }

    /// Records every formatted node's offset from the keep-still node. Later
    /// calls to [`format_node`](Self::format_node) replay these offsets
    /// until [`invalidate`](Self::invalidate) is called.
    pub fn save_relative_positions<G: GraphView>(&mut self, graph: &G) {
        let keep_still = if graph.contains_node(self.keep_still) {
            self.keep_still
        } else {
            self.root
        };
        let anchor = graph.node_position(keep_still);

        self.node_offsets.clear();
        for &node in &self.all_formatted {
            if node == keep_still {
                continue;
            }
            let position = graph.node_position(node);
            self.node_offsets
                .insert(node, Point::new(position.x - anchor.x, position.y - anchor.y));
        }
        self.initialized = true;
    }

    pub fn invalidate(&mut self) {
        self.initialized = false;
        self.node_offsets.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_helixing(&self) -> bool {
        self.format_with_helixing
    }

    pub fn bounds<G: GraphView>(&self, graph: &G) -> Option<Rect> {
        graph.node_array_bounds(self.all_formatted.iter().copied())
    }

    /// Bounds of everything but the root, stretched up to the root's bottom
    /// edge when the parameters sit below it.
    pub fn parameter_bounds<G: GraphView>(&self, graph: &G) -> Rect {
        let Some(bounds) = graph.node_array_bounds(
            self.all_formatted
                .iter()
                .copied()
                .filter(|node| *node != self.root),
        ) else {
            return Rect::default();
        };

        let root_bounds = graph.node_bounds(self.root);
        let top_padding = (bounds.top - root_bounds.bottom).max(0.0);
        bounds.extend_by(0.0, top_padding, 0.0, 0.0)
    }

    pub fn move_below_baseline<G: GraphView>(
        &self,
        graph: &mut G,
        nodes: &IndexSet<NodeId>,
        baseline: f32,
    ) {
        let Some(bounds) = graph.node_array_bounds(nodes.iter().copied()) else {
            return;
        };
        if baseline > bounds.top {
            let delta = baseline - bounds.top;
            for &node in nodes {
                graph.translate_node(node, 0.0, delta);
            }
        }
    }

    /// Whether any node reachable from the root over any link has exec pins.
    pub fn any_linked_impure_nodes<G: GraphView>(&self, graph: &G) -> bool {
        let mut visited = IndexSet::from([self.root]);
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if graph.is_node_impure(node) {
                return true;
            }
            for linked in graph.linked_nodes(node) {
                if visited.insert(linked) {
                    stack.push(linked);
                }
            }
        }
        false
    }

    pub fn formatted_nodes(&self) -> &IndexSet<NodeId> {
        &self.all_formatted
    }

    pub fn formatted_input_nodes(&self) -> &IndexSet<NodeId> {
        &self.formatted_input
    }

    pub fn formatted_output_nodes(&self) -> &IndexSet<NodeId> {
        &self.formatted_output
    }

    pub fn same_row_mapping(&self) -> &SameRowMapping {
        &self.same_row
    }

    pub fn node_offsets(&self) -> &NodeOffsets {
        &self.node_offsets
    }

    /// Nodes whose collision loop hit [`MAX_COLLISION_ITERATIONS`] in the last run.
    pub fn collision_limited_nodes(&self) -> &IndexSet<NodeId> {
        &self.collision_limited
    }

    /// Parent chosen for `node` by the last horizontal pass.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node_info
            .get(node)
            .and_then(|info| self.node_info.parent_node(info))
    }

    pub fn node_info(&self) -> &NodeInfoTree {
        &self.node_info
    }

    pub fn debug_print_formatted(&self) {
        log::debug!("node info tree for {:?}:", self.root);
        for node in self.node_info.nodes() {
            log::debug!("  {node:?} | parent {:?}", self.parent_of(node));
            for child in self.node_info.children_of(node) {
                log::debug!("    child {child:?}");
            }
        }
        log::debug!("formatted input: {:?}", self.formatted_input);
        log::debug!("formatted output: {:?}", self.formatted_output);
        log::debug!("formatted all: {:?}", self.all_formatted);
    }
}
