use std::fmt;

use crate::bytecode::GlobalId;

/// Handle to a node in a [`Heap`]. Copying a handle shares the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// An evaluated integer; always in WHNF.
    Number(i64),

    /// A supercombinator, not yet applied.
    Global(GlobalId),

    /// `function` applied to `argument`.
    Application { function: NodeId, argument: NodeId },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Number(_) => NodeKind::Number,
            Node::Global(_) => NodeKind::Global,
            Node::Application { .. } => NodeKind::Application,
        }
    }
}

/// Tag of a [`Node`], used in fault reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Number,
    Global,
    Application,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Number => "number",
            NodeKind::Global => "supercombinator",
            NodeKind::Application => "application",
        };
        f.write_str(name)
    }
}

/// Append-only node arena.
///
/// Nodes are never modified once allocated and never freed while the heap
/// lives, so handles stay valid and may be shared freely.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    nodes: Vec<Node>,
}

impl Heap {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn number(&mut self, value: i64) -> NodeId {
        self.alloc(Node::Number(value))
    }

    pub fn global(&mut self, id: GlobalId) -> NodeId {
        self.alloc(Node::Global(id))
    }

    pub fn application(&mut self, function: NodeId, argument: NodeId) -> NodeId {
        self.alloc(Node::Application { function, argument })
    }

    /// Handles are only minted by this heap, so lookup cannot miss.
    pub fn get(&self, id: NodeId) -> Node {
        self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_returns_distinct_handles() {
        let mut heap = Heap::new();
        let a = heap.number(1);
        let b = heap.number(1);
        assert_ne!(a, b);
        assert_eq!(heap.get(a), heap.get(b));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_handles_follow_allocation_order() {
        let mut heap = Heap::new();
        let ids: Vec<NodeId> = (0..1000).map(|n| heap.number(n)).collect();
        for (n, id) in ids.iter().enumerate() {
            assert_eq!(id.index(), n);
            assert_eq!(heap.get(*id), Node::Number(n as i64));
        }
    }

    #[test]
    fn test_application_shares_children() {
        let mut heap = Heap::new();
        let f = heap.global(GlobalId(3));
        let x = heap.number(7);
        let app1 = heap.application(f, x);
        let app2 = heap.application(app1, x);

        let Node::Application { function, argument } = heap.get(app2) else {
            panic!("expected application");
        };
        assert_eq!(function, app1);
        assert_eq!(argument, x);
        assert_eq!(heap.len(), 4);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Node::Number(0).kind(), NodeKind::Number);
        assert_eq!(Node::Global(GlobalId(0)).kind().to_string(), "supercombinator");
    }
}
