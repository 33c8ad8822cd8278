use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::GraphView;
use crate::layout::types::Point;

// Default pin placement when a pin carries no explicit offset.
const PIN_HEADER_HEIGHT: f32 = 32.0;
const PIN_ROW_HEIGHT: f32 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PinId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinKind {
    Exec,
    #[default]
    Parameter,
    Delegate,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub knot: bool,
    pub pins: Vec<PinId>,
    pub modified: bool,
}

#[derive(Debug, Clone)]
pub struct Pin {
    pub id: PinId,
    pub owner: NodeId,
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
    /// Vertical distance from the owning node's top edge.
    pub offset_y: f32,
    pub linked_to: Vec<PinId>,
}

/// Arena-backed node graph. Nodes and pins are addressed by stable indices
/// and are never removed, so ids handed to the formatter stay valid.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub pins: Vec<Pin>,
    names: BTreeMap<String, NodeId>,
    structure_version: u64,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            x,
            y,
            width,
            height,
            knot: false,
            pins: Vec::new(),
            modified: false,
        });
        self.names.insert(name.to_string(), id);
        self.structure_version += 1;
        id
    }

    pub fn add_knot(&mut self, name: &str, x: f32, y: f32) -> NodeId {
        let id = self.add_node(name, x, y, 42.0, 16.0);
        self.nodes[id.0].knot = true;
        id
    }

    /// Adds a pin stacked below the node header, one row per pin on the same side.
    pub fn add_pin(
        &mut self,
        node: NodeId,
        name: &str,
        direction: PinDirection,
        kind: PinKind,
    ) -> Result<PinId, GraphError> {
        let row = self
            .nodes
            .get(node.0)
            .ok_or(GraphError::UnknownNodeId(node.0))?
            .pins
            .iter()
            .filter(|pin| self.pins[pin.0].direction == direction)
            .count();
        let offset_y = PIN_HEADER_HEIGHT + row as f32 * PIN_ROW_HEIGHT + PIN_ROW_HEIGHT * 0.5;
        self.add_pin_at(node, name, direction, kind, offset_y)
    }

    pub fn add_pin_at(
        &mut self,
        node: NodeId,
        name: &str,
        direction: PinDirection,
        kind: PinKind,
        offset_y: f32,
    ) -> Result<PinId, GraphError> {
        if node.0 >= self.nodes.len() {
            return Err(GraphError::UnknownNodeId(node.0));
        }
        let id = PinId(self.pins.len());
        self.pins.push(Pin {
            id,
            owner: node,
            name: name.to_string(),
            direction,
            kind,
            offset_y,
            linked_to: Vec::new(),
        });
        self.nodes[node.0].pins.push(id);
        self.structure_version += 1;
        Ok(id)
    }

    pub fn link(&mut self, a: PinId, b: PinId) -> Result<(), GraphError> {
        let pin_a = self.pins.get(a.0).ok_or(GraphError::UnknownPin(a.0))?;
        let pin_b = self.pins.get(b.0).ok_or(GraphError::UnknownPin(b.0))?;
        if pin_a.owner == pin_b.owner {
            return Err(GraphError::SelfLink(self.nodes[pin_a.owner.0].name.clone()));
        }
        if pin_a.direction == pin_b.direction {
            return Err(GraphError::DirectionMismatch {
                from: self.pin_label(a),
                to: self.pin_label(b),
            });
        }
        if pin_a.linked_to.contains(&b) {
            return Ok(());
        }
        self.pins[a.0].linked_to.push(b);
        self.pins[b.0].linked_to.push(a);
        self.structure_version += 1;
        Ok(())
    }

    /// Removes the link between `a` and `b`, if any.
    pub fn unlink(&mut self, a: PinId, b: PinId) -> Result<(), GraphError> {
        if b.0 >= self.pins.len() {
            return Err(GraphError::UnknownPin(b.0));
        }
        let pin_a = self.pins.get_mut(a.0).ok_or(GraphError::UnknownPin(a.0))?;
        let before = pin_a.linked_to.len();
        pin_a.linked_to.retain(|pin| *pin != b);
        if pin_a.linked_to.len() != before {
            self.pins[b.0].linked_to.retain(|pin| *pin != a);
            self.structure_version += 1;
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.0]
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn find_pin(&self, node: NodeId, name: &str) -> Option<PinId> {
        self.nodes[node.0]
            .pins
            .iter()
            .copied()
            .find(|pin| self.pins[pin.0].name == name)
    }

    pub fn pin_label(&self, pin: PinId) -> String {
        let pin = &self.pins[pin.0];
        format!("{}.{}", self.nodes[pin.owner.0].name, pin.name)
    }
}

impl GraphView for Graph {
    fn contains_node(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn node_position(&self, node: NodeId) -> Point {
        let node = &self.nodes[node.0];
        Point::new(node.x, node.y)
    }

    fn set_node_position(&mut self, node: NodeId, position: Point) {
        let node = &mut self.nodes[node.0];
        node.x = position.x;
        node.y = position.y;
    }

    fn node_size(&self, node: NodeId) -> Point {
        let node = &self.nodes[node.0];
        Point::new(node.width, node.height)
    }

    fn node_pins(&self, node: NodeId) -> &[PinId] {
        &self.nodes[node.0].pins
    }

    fn is_knot_node(&self, node: NodeId) -> bool {
        self.nodes[node.0].knot
    }

    fn pin_owner(&self, pin: PinId) -> NodeId {
        self.pins[pin.0].owner
    }

    fn pin_direction(&self, pin: PinId) -> PinDirection {
        self.pins[pin.0].direction
    }

    fn pin_kind(&self, pin: PinId) -> PinKind {
        self.pins[pin.0].kind
    }

    fn pin_links(&self, pin: PinId) -> &[PinId] {
        &self.pins[pin.0].linked_to
    }

    fn pin_position(&self, pin: PinId) -> Point {
        let pin = &self.pins[pin.0];
        let node = &self.nodes[pin.owner.0];
        let x = match pin.direction {
            PinDirection::Input => node.x,
            PinDirection::Output => node.x + node.width,
        };
        Point::new(x, node.y + pin.offset_y)
    }

    fn mark_modified(&mut self, node: NodeId) {
        self.nodes[node.0].modified = true;
    }

    /// Bumped on every node, pin or link change; moving nodes leaves it alone.
    fn structure_version(&self) -> u64 {
        self.structure_version
    }
}

/// Serialized graph description consumed by the CLI and the wasm wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub knot: bool,
    #[serde(default)]
    pub pins: Vec<PinDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinDocument {
    pub name: String,
    pub direction: PinDirection,
    #[serde(default)]
    pub kind: PinKind,
    pub offset: Option<f32>,
}

/// A link between two `"Node.pin"` references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDocument {
    pub from: String,
    pub to: String,
}

impl GraphDocument {
    /// Parses strict JSON first and falls back to JSON5 for hand-written files.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        match serde_json::from_str(input) {
            Ok(document) => Ok(document),
            Err(json_err) => json5::from_str(input)
                .map_err(|_| anyhow::anyhow!("invalid graph document: {json_err}")),
        }
    }

    /// Snapshot of `graph` with current positions. Each link is listed once,
    /// from its output pin.
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDocument {
                name: node.name.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                knot: node.knot,
                pins: node
                    .pins
                    .iter()
                    .map(|pin| {
                        let pin = graph.pin(*pin);
                        PinDocument {
                            name: pin.name.clone(),
                            direction: pin.direction,
                            kind: pin.kind,
                            offset: Some(pin.offset_y),
                        }
                    })
                    .collect(),
            })
            .collect();

        let links = graph
            .pins
            .iter()
            .filter(|pin| pin.direction == PinDirection::Output)
            .flat_map(|pin| {
                pin.linked_to.iter().map(|other| LinkDocument {
                    from: graph.pin_label(pin.id),
                    to: graph.pin_label(*other),
                })
            })
            .collect();

        Self { nodes, links }
    }

    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();
        for node in &self.nodes {
            if graph.find_node(&node.name).is_some() {
                return Err(GraphError::DuplicateNode(node.name.clone()));
            }
            let id = graph.add_node(&node.name, node.x, node.y, node.width, node.height);
            graph.nodes[id.0].knot = node.knot;
            for pin in &node.pins {
                match pin.offset {
                    Some(offset) => graph.add_pin_at(id, &pin.name, pin.direction, pin.kind, offset)?,
                    None => graph.add_pin(id, &pin.name, pin.direction, pin.kind)?,
                };
            }
        }
        for link in &self.links {
            let from = resolve_pin_ref(&graph, &link.from)?;
            let to = resolve_pin_ref(&graph, &link.to)?;
            graph.link(from, to)?;
        }
        Ok(graph)
    }
}

fn resolve_pin_ref(graph: &Graph, reference: &str) -> Result<PinId, GraphError> {
    let (node_name, pin_name) = reference
        .rsplit_once('.')
        .ok_or_else(|| GraphError::MalformedPinRef(reference.to_string()))?;
    let node = graph
        .find_node(node_name)
        .ok_or_else(|| GraphError::UnknownNode(node_name.to_string()))?;
    graph
        .find_pin(node, pin_name)
        .ok_or_else(|| GraphError::UnknownPinName(reference.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_links_between_pins_on_one_node() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 0.0, 0.0, 100.0, 60.0);
        let input = graph.add_pin(a, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let output = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        assert!(matches!(graph.link(input, output), Err(GraphError::SelfLink(_))));
    }

    #[test]
    fn rejects_same_direction_links() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 0.0, 0.0, 100.0, 60.0);
        let b = graph.add_node("B", 0.0, 0.0, 100.0, 60.0);
        let a_in = graph.add_pin(a, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let b_in = graph.add_pin(b, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        assert!(matches!(
            graph.link(a_in, b_in),
            Err(GraphError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn pins_stack_per_side() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 10.0, 20.0, 100.0, 80.0);
        let first = graph.add_pin(a, "a", PinDirection::Input, PinKind::Parameter).unwrap();
        let out = graph.add_pin(a, "r", PinDirection::Output, PinKind::Parameter).unwrap();
        let second = graph.add_pin(a, "b", PinDirection::Input, PinKind::Parameter).unwrap();
        assert_eq!(graph.pin_position(first), Point::new(10.0, 63.0));
        assert_eq!(graph.pin_position(second), Point::new(10.0, 85.0));
        assert_eq!(graph.pin_position(out), Point::new(110.0, 63.0));
    }

    #[test]
    fn structural_edits_bump_version() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 0.0, 0.0, 100.0, 60.0);
        let b = graph.add_node("B", 0.0, 0.0, 100.0, 60.0);
        let out = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let input = graph.add_pin(b, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        let before = graph.structure_version();
        graph.link(out, input).unwrap();
        assert!(graph.structure_version() > before);
        let linked = graph.structure_version();
        graph.set_node_position(a, Point::new(5.0, 5.0));
        assert_eq!(graph.structure_version(), linked);
        graph.unlink(out, input).unwrap();
        assert!(graph.structure_version() > linked);
    }

    #[test]
    fn mutators_reject_unknown_ids() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 0.0, 0.0, 100.0, 60.0);
        let out = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let version = graph.structure_version();

        assert!(matches!(
            graph.add_pin(NodeId(9), "in", PinDirection::Input, PinKind::Parameter),
            Err(GraphError::UnknownNodeId(9))
        ));
        assert!(matches!(
            graph.add_pin_at(NodeId(9), "in", PinDirection::Input, PinKind::Parameter, 10.0),
            Err(GraphError::UnknownNodeId(9))
        ));
        assert!(matches!(graph.unlink(out, PinId(7)), Err(GraphError::UnknownPin(7))));
        assert!(matches!(graph.unlink(PinId(7), out), Err(GraphError::UnknownPin(7))));
        assert_eq!(graph.pins.len(), 1);
        assert_eq!(graph.structure_version(), version);
    }

    #[test]
    fn document_resolves_pin_references() {
        let document = GraphDocument::parse(
            r#"{
                "nodes": [
                    {"name": "Get", "width": 120, "height": 60,
                     "pins": [{"name": "value", "direction": "output"}]},
                    {"name": "Print", "x": 300, "width": 140, "height": 80,
                     "pins": [{"name": "exec", "direction": "input", "kind": "exec"},
                              {"name": "text", "direction": "input", "offset": 50}]}
                ],
                "links": [{"from": "Get.value", "to": "Print.text"}]
            }"#,
        )
        .unwrap();
        let graph = document.into_graph().unwrap();
        let print = graph.find_node("Print").unwrap();
        let text = graph.find_pin(print, "text").unwrap();
        assert_eq!(graph.pin(text).linked_to.len(), 1);
        assert_eq!(graph.pin(text).offset_y, 50.0);
        assert_eq!(graph.pin(graph.find_pin(print, "exec").unwrap()).kind, PinKind::Exec);
    }

    #[test]
    fn snapshot_lists_each_link_once() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", 1.0, 2.0, 100.0, 60.0);
        let b = graph.add_node("B", 0.0, 0.0, 100.0, 60.0);
        let out = graph.add_pin(a, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let input = graph.add_pin(b, "in", PinDirection::Input, PinKind::Parameter).unwrap();
        graph.link(input, out).unwrap();

        let document = GraphDocument::from_graph(&graph);
        assert_eq!(document.links.len(), 1);
        assert_eq!(document.links[0].from, "A.out");
        assert_eq!(document.links[0].to, "B.in");
        assert_eq!(document.nodes[0].x, 1.0);

        let rebuilt = document.into_graph().unwrap();
        assert_eq!(rebuilt.pin(PinId(1)).linked_to, vec![PinId(0)]);
    }

    #[test]
    fn document_accepts_json5() {
        let document = GraphDocument::parse(
            "{ nodes: [ { name: 'A', width: 10, height: 10, }, ], // trailing comma\n }",
        )
        .unwrap();
        assert_eq!(document.nodes.len(), 1);
    }

    #[test]
    fn document_reports_unknown_pins() {
        let document = GraphDocument {
            nodes: vec![NodeDocument {
                name: "A".to_string(),
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                knot: false,
                pins: Vec::new(),
            }],
            links: vec![LinkDocument {
                from: "A.out".to_string(),
                to: "B.in".to_string(),
            }],
        };
        assert!(matches!(
            document.into_graph(),
            Err(GraphError::UnknownPinName(reference)) if reference == "A.out"
        ));
    }
}
