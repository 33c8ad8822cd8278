//! One-shot formatting of a serialized graph document, shared by the CLI and
//! the wasm wrapper.

use anyhow::Result;
use indexmap::IndexSet;

use crate::config::{FormatterConfig, ParameterStyle};
use crate::error::GraphError;
use crate::ir::{Graph, GraphDocument, NodeId};
use crate::layout::{FormatterParameters, ParameterFormatter};

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub config: FormatterConfig,
    pub keep_still: Option<String>,
    pub ignore: Vec<String>,
    pub only: Vec<String>,
    pub style: Option<ParameterStyle>,
}

/// Parses `input`, formats the parameters of the node named `root` and hands
/// back the moved graph with the formatter that moved it.
pub fn format_document(
    input: &str,
    root: &str,
    options: &FormatOptions,
) -> Result<(Graph, ParameterFormatter)> {
    let mut graph = GraphDocument::parse(input)?.into_graph()?;

    let root_id = resolve_node(&graph, root)?;
    let keep_still = match &options.keep_still {
        Some(name) => resolve_node(&graph, name)?,
        None => root_id,
    };
    let ignored = resolve_nodes(&graph, &options.ignore)?;
    let mut nodes_to_format = resolve_nodes(&graph, &options.only)?;
    if !nodes_to_format.is_empty() {
        nodes_to_format.insert(root_id);
    }

    let mut formatter = ParameterFormatter::new(root_id, options.config.clone())
        .with_keep_still(keep_still)
        .with_ignored(ignored)
        .with_parameters(FormatterParameters {
            nodes_to_format,
            override_style: options.style,
        });
    formatter.format_node(&mut graph);

    log::debug!(
        "formatted {} node(s) around {root}",
        formatter.formatted_nodes().len()
    );
    Ok((graph, formatter))
}

fn resolve_node(graph: &Graph, name: &str) -> Result<NodeId, GraphError> {
    graph
        .find_node(name)
        .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
}

fn resolve_nodes(graph: &Graph, names: &[String]) -> Result<IndexSet<NodeId>, GraphError> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| resolve_node(graph, name))
        .collect()
}
