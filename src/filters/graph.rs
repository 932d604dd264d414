use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::filters::chained_input::ChainedFilterInput;
use crate::filters::contents_input::ContentsFilterInput;
use crate::filters::filter_input::FilterInputRef;
use crate::filters::ops::FilterOp;
use crate::filters::texture_input::TextureFilterInput;
use crate::foundation::core::Affine;
use crate::foundation::error::{FilterError, FilterResult};
use crate::renderer::texture::Texture;
use crate::scene::contents::Contents;

/// Index of a node in a [`FilterGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug)]
enum NodeKind {
    Texture {
        texture: Arc<Texture>,
        transform: Affine,
    },
    Contents {
        contents: Rc<dyn Contents>,
        transform: Affine,
    },
    Filter {
        op: FilterOp,
        local_transform: Affine,
    },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    inputs: SmallVec<[NodeId; 2]>,
}

/// Mutable description of a filter chain, checked and turned into shared inputs by
/// [`FilterGraph::build`].
///
/// Edges may be rewired after nodes are added; any rewiring that would make a node depend on
/// itself is rejected, so the graph stays acyclic.
#[derive(Debug, Default)]
pub struct FilterGraph {
    nodes: Vec<Node>,
}

impl FilterGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return `true` when no node was added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a texture leaf.
    pub fn add_texture(&mut self, texture: Arc<Texture>, transform: Affine) -> NodeId {
        self.push(NodeKind::Texture { texture, transform }, SmallVec::new())
    }

    /// Add a contents leaf.
    pub fn add_contents(&mut self, contents: Rc<dyn Contents>, transform: Affine) -> NodeId {
        self.push(NodeKind::Contents { contents, transform }, SmallVec::new())
    }

    /// Add a filter node over existing nodes.
    pub fn add_filter(
        &mut self,
        op: FilterOp,
        inputs: &[NodeId],
        local_transform: Affine,
    ) -> FilterResult<NodeId> {
        for &input in inputs {
            self.node(input)?;
        }
        op.validate(inputs.len())?;
        Ok(self.push(
            NodeKind::Filter {
                op,
                local_transform,
            },
            inputs.iter().copied().collect(),
        ))
    }

    /// Replace the inputs of filter node `node`.
    ///
    /// Fails with [`FilterError::Graph`] when `node` is a leaf, an input does not exist, the
    /// operation rejects the count, or the new edges would form a cycle. The graph is left
    /// unchanged on failure.
    pub fn set_inputs(&mut self, node: NodeId, inputs: &[NodeId]) -> FilterResult<()> {
        let op = match &self.node(node)?.kind {
            NodeKind::Filter { op, .. } => *op,
            _ => return Err(FilterError::graph(format!("{node} is a leaf and has no inputs"))),
        };
        for &input in inputs {
            self.node(input)?;
        }
        op.validate(inputs.len())?;
        for &input in inputs {
            if let Some(path) = self.path(input, node) {
                let mut s = format!("{node}");
                for id in path {
                    s.push_str(&format!(" -> {id}"));
                }
                return Err(FilterError::graph(format!("filter cycle detected: {s}")));
            }
        }
        self.nodes[node.0 as usize].inputs = inputs.iter().copied().collect();
        Ok(())
    }

    /// Inputs of `node`, or `None` when it does not exist.
    pub fn inputs(&self, node: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(node.0 as usize).map(|n| n.inputs.as_slice())
    }

    /// Check that the graph is acyclic.
    pub fn validate(&self) -> FilterResult<()> {
        self.topo_order().map(|_| ())
    }

    /// Materialize the chain ending at `root`.
    ///
    /// Each reachable node becomes exactly one filter input; nodes feeding several filters are
    /// shared, not duplicated.
    #[tracing::instrument(level = "debug", skip(self), fields(nodes = self.nodes.len()))]
    pub fn build(&self, root: NodeId) -> FilterResult<FilterInputRef> {
        self.node(root)?;
        let order = self.topo_order()?;

        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let seen = &mut reachable[id.0 as usize];
            if !*seen {
                *seen = true;
                stack.extend(self.nodes[id.0 as usize].inputs.iter().copied());
            }
        }

        let mut built: Vec<Option<FilterInputRef>> = vec![None; self.nodes.len()];
        for id in order.into_iter().filter(|id| reachable[id.0 as usize]) {
            let node = &self.nodes[id.0 as usize];
            let input: FilterInputRef = match &node.kind {
                NodeKind::Texture { texture, transform } => {
                    Rc::new(TextureFilterInput::new(Arc::clone(texture), *transform))
                }
                NodeKind::Contents {
                    contents,
                    transform,
                } => Rc::new(ContentsFilterInput::new(Rc::clone(contents), *transform)),
                NodeKind::Filter {
                    op,
                    local_transform,
                } => {
                    let inputs = node
                        .inputs
                        .iter()
                        .map(|i| {
                            built[i.0 as usize].clone().ok_or_else(|| {
                                FilterError::graph(format!("{i} was not built before {id}"))
                            })
                        })
                        .collect::<FilterResult<SmallVec<[FilterInputRef; 2]>>>()?;
                    ChainedFilterInput::new(*op, inputs, *local_transform)?
                }
            };
            built[id.0 as usize] = Some(input);
        }

        tracing::debug!(
            built = reachable.iter().filter(|r| **r).count(),
            "filter chain built"
        );
        built[root.0 as usize]
            .take()
            .ok_or_else(|| FilterError::graph(format!("{root} was not built")))
    }

    fn push(&mut self, kind: NodeKind, inputs: SmallVec<[NodeId; 2]>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, inputs });
        id
    }

    fn node(&self, id: NodeId) -> FilterResult<&Node> {
        self.nodes
            .get(id.0 as usize)
            .ok_or_else(|| FilterError::graph(format!("unknown node {id}")))
    }

    /// Nodes from `from` down its inputs to `to`, both included, if `to` is upstream of `from`.
    fn path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeId, usize)> = vec![(from, 0)];
        visited[from.0 as usize] = true;
        while let Some(&(id, next)) = stack.last() {
            if id == to {
                return Some(stack.iter().map(|(id, _)| *id).collect());
            }
            if let Some(&input) = self.nodes[id.0 as usize].inputs.get(next) {
                let top = stack.len() - 1;
                stack[top].1 += 1;
                if !visited[input.0 as usize] {
                    visited[input.0 as usize] = true;
                    stack.push((input, 0));
                }
            } else {
                stack.pop();
            }
        }
        None
    }

    /// Dependencies before dependents; ties go to the smallest id.
    fn topo_order(&self) -> FilterResult<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut indeg = vec![0u32; n];
        let mut dependents = vec![Vec::<u32>::new(); n];
        for (i, node) in self.nodes.iter().enumerate() {
            for input in &node.inputs {
                dependents[input.0 as usize].push(i as u32);
                indeg[i] = indeg[i].saturating_add(1);
            }
        }

        let mut ready: BinaryHeap<Reverse<u32>> = indeg
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i as u32))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(NodeId(i));
            for &j in &dependents[i as usize] {
                let d = &mut indeg[j as usize];
                *d = d.saturating_sub(1);
                if *d == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        if order.len() != n {
            return Err(FilterError::graph("filter cycle detected"));
        }
        Ok(order)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/graph.rs"]
mod tests;
