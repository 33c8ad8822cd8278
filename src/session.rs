//! Long-lived formatter state for one editor graph.

use indexmap::IndexMap;

use crate::config::FormatterConfig;
use crate::graph::GraphView;
use crate::ir::NodeId;
use crate::layout::ParameterFormatter;

/// Keeps one [`ParameterFormatter`] per root so repeated formats of the same
/// root replay cached offsets. Any structural edit reported through
/// [`GraphView::structure_version`] drops every cache.
#[derive(Debug)]
pub struct FormatSession {
    config: FormatterConfig,
    formatters: IndexMap<NodeId, ParameterFormatter>,
    seen_version: Option<u64>,
}

impl FormatSession {
    pub fn new(config: FormatterConfig) -> Self {
        Self {
            config,
            formatters: IndexMap::new(),
            seen_version: None,
        }
    }

    /// Formats the parameters of `root` and returns the formatter that did it.
    pub fn format<G: GraphView>(&mut self, graph: &mut G, root: NodeId) -> &ParameterFormatter {
        let version = graph.structure_version();
        if self.seen_version != Some(version) {
            if self.seen_version.is_some() {
                log::debug!("graph structure changed, dropping cached layouts");
            }
            self.invalidate();
            self.seen_version = Some(version);
        }

        let config = &self.config;
        let formatter = self
            .formatters
            .entry(root)
            .or_insert_with(|| ParameterFormatter::new(root, config.clone()));

        formatter.format_node(graph);
        if !formatter.is_initialized() {
            formatter.save_relative_positions(graph);
        }
        formatter
    }

    /// Registers a formatter built with custom keep-still, ignored nodes or
    /// parameters, replacing any formatter for the same root.
    pub fn insert(&mut self, formatter: ParameterFormatter) {
        self.formatters.insert(formatter.root(), formatter);
    }

    pub fn formatter(&self, root: NodeId) -> Option<&ParameterFormatter> {
        self.formatters.get(&root)
    }

    pub fn invalidate(&mut self) {
        for formatter in self.formatters.values_mut() {
            formatter.invalidate();
        }
    }

    pub fn forget(&mut self, root: NodeId) -> Option<ParameterFormatter> {
        self.formatters.shift_remove(&root)
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}
