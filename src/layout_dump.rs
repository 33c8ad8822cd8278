use crate::ir::Graph;
use crate::layout::ParameterFormatter;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub root: String,
    pub helixing: bool,
    pub nodes: Vec<NodeDump>,
    pub same_row: Vec<SameRowDump>,
    pub collision_limited: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub formatted: bool,
    pub parent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SameRowDump {
    pub from: String,
    pub to: String,
}

impl LayoutDump {
    pub fn from_formatter(graph: &Graph, formatter: &ParameterFormatter) -> Self {
        let name = |id: crate::ir::NodeId| graph.node(id).name.clone();

        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDump {
                name: node.name.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                formatted: formatter.formatted_nodes().contains(&node.id),
                parent: formatter.parent_of(node.id).map(name),
            })
            .collect();

        let same_row = formatter
            .same_row_mapping()
            .iter()
            .filter(|(_, same)| **same)
            .filter_map(|(link, _)| {
                Some(SameRowDump {
                    from: graph.pin_label(link.from?),
                    to: graph.pin_label(link.to?),
                })
            })
            .collect();

        Self {
            root: name(formatter.root()),
            helixing: formatter.is_helixing(),
            nodes,
            same_row,
            collision_limited: formatter
                .collision_limited_nodes()
                .iter()
                .map(|id| name(*id))
                .collect(),
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_layout_dump(
    path: Option<&Path>,
    graph: &Graph,
    formatter: &ParameterFormatter,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_formatter(graph, formatter);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
