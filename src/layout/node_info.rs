use indexmap::IndexMap;

use crate::ir::{NodeId, PinDirection, PinId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoId(usize);

/// Per-run record of how a node was reached.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node: NodeId,
    /// Pin on this node the traversal arrived through.
    pub pin: Option<PinId>,
    pub parent: Option<InfoId>,
    /// Pin on the parent the traversal left from.
    pub parent_pin: Option<PinId>,
    /// Direction of the pass that discovered the node.
    pub direction: PinDirection,
    pub children: Vec<InfoId>,
}

/// Arena-backed parent/child tree built by the horizontal pass.
///
/// Records are never freed during a run. Dropping a node only unmaps it and
/// detaches it from its parent, so stale ids stay valid.
#[derive(Debug, Default)]
pub struct NodeInfoTree {
    infos: Vec<NodeInfo>,
    by_node: IndexMap<NodeId, InfoId>,
}

impl NodeInfoTree {
    pub fn reset(&mut self) {
        self.infos.clear();
        self.by_node.clear();
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    pub fn get(&self, node: NodeId) -> Option<InfoId> {
        self.by_node.get(&node).copied()
    }

    pub fn info(&self, id: InfoId) -> &NodeInfo {
        &self.infos[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_node.keys().copied()
    }

    pub fn insert(
        &mut self,
        node: NodeId,
        pin: Option<PinId>,
        parent: Option<InfoId>,
        parent_pin: Option<PinId>,
        direction: PinDirection,
    ) -> InfoId {
        let id = InfoId(self.infos.len());
        self.infos.push(NodeInfo {
            node,
            pin,
            parent: None,
            parent_pin: None,
            direction,
            children: Vec::new(),
        });
        self.set_parent(id, parent, pin, parent_pin);
        self.by_node.insert(node, id);
        id
    }

    pub fn remove(&mut self, node: NodeId) {
        if let Some(id) = self.by_node.shift_remove(&node) {
            self.detach(id);
        }
    }

    pub fn set_parent(
        &mut self,
        id: InfoId,
        parent: Option<InfoId>,
        pin: Option<PinId>,
        parent_pin: Option<PinId>,
    ) {
        self.detach(id);
        let info = &mut self.infos[id.0];
        info.parent = parent;
        info.parent_pin = parent_pin;
        if pin.is_some() {
            info.pin = pin;
        }
        if let Some(parent) = parent {
            let children = &mut self.infos[parent.0].children;
            if !children.contains(&id) {
                children.push(id);
            }
        }
    }

    fn detach(&mut self, id: InfoId) {
        if let Some(parent) = self.infos[id.0].parent.take() {
            self.infos[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn parent_node(&self, id: InfoId) -> Option<NodeId> {
        self.infos[id.0].parent.map(|parent| self.infos[parent.0].node)
    }

    pub fn child_nodes(&self, id: InfoId) -> Vec<NodeId> {
        self.infos[id.0]
            .children
            .iter()
            .map(|child| self.infos[child.0].node)
            .collect()
    }

    /// Child nodes of `node`, empty when the node has no record.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|id| self.child_nodes(id))
            .unwrap_or_default()
    }

    /// True when `other` is an ancestor of `id`, i.e. making `other` a child
    /// of `id` would close a loop.
    pub fn detect_cycle(&self, id: InfoId, other: InfoId) -> bool {
        let mut next = self.infos[id.0].parent;
        let mut steps = 0;
        while let Some(current) = next {
            if current == other {
                return true;
            }
            steps += 1;
            if steps > self.infos.len() {
                return true;
            }
            next = self.infos[current.0].parent;
        }
        false
    }

    /// Ancestor chain of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let Some(id) = self.get(node) else {
            return chain;
        };
        let mut next = self.infos[id.0].parent;
        while let Some(current) = next {
            if chain.len() > self.infos.len() {
                break;
            }
            chain.push(self.infos[current.0].node);
            next = self.infos[current.0].parent;
        }
        chain
    }
}
