//! Graph normalization.
//!
//! Post-order over the graph (children before parents, each node once):
//! the children of a node are sorted by surface form and adjacent siblings
//! with the same surface form are merged into one node whose edge sets are
//! the union of both and whose provenance list is the concatenation. The
//! level is re-sorted until no equal neighbours remain. Afterwards the
//! arena is compacted so it only holds live nodes.
//!
//! After normalization matching two graphs is a merge-join over sorted
//! children, and phrase enumeration order is deterministic.

use ahash::{AHashMap, AHashSet};

use crate::graph::node::{NodeId, TokenGraph};

/// Sort and merge siblings of the whole graph, then compact the arena.
pub(crate) fn normalize(graph: &mut TokenGraph) {
    let roots = std::mem::take(&mut graph.roots);
    let mut normalizer = Normalizer {
        graph,
        visited: AHashSet::new(),
        merged_into: AHashMap::new(),
    };
    let roots = normalizer.normalize_siblings(roots);
    let merged = normalizer.merged_into.len();
    graph.roots = roots;

    if merged > 0 {
        log::trace!("Merged {merged} token nodes of [{}]", graph.phrase);
    }
    compact(graph);
}

struct Normalizer<'g> {
    graph: &'g mut TokenGraph,
    visited: AHashSet<NodeId>,
    /// Merged node -> node it was merged into.
    merged_into: AHashMap<NodeId, NodeId>,
}

impl Normalizer<'_> {
    fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(&next) = self.merged_into.get(&id) {
            id = next;
        }
        id
    }

    fn normalize_siblings(&mut self, mut siblings: Vec<NodeId>) -> Vec<NodeId> {
        loop {
            for index in 0..siblings.len() {
                let id = self.resolve(siblings[index]);
                if self.visited.insert(id) {
                    let children = self.graph.nodes[id.0].children.clone();
                    let children = self.normalize_siblings(children);
                    self.graph.nodes[id.0].children = children;
                }
            }

            siblings = self.canonical(siblings);
            let equal = siblings.windows(2).position(|pair| {
                self.graph.nodes[pair[0].0].token.text == self.graph.nodes[pair[1].0].token.text
            });
            match equal {
                Some(index) => {
                    let (keep, gone) = (siblings[index], siblings[index + 1]);
                    self.merge(keep, gone);
                    // The union of children has to be normalized again.
                    self.visited.remove(&keep);
                }
                None => return siblings,
            }
        }
    }

    /// Resolve merged ids, drop duplicates and stable-sort by surface form.
    fn canonical(&self, siblings: Vec<NodeId>) -> Vec<NodeId> {
        let mut seen = AHashSet::with_capacity(siblings.len());
        let mut out: Vec<NodeId> = siblings
            .into_iter()
            .map(|id| self.resolve(id))
            .filter(|id| seen.insert(*id))
            .collect();
        out.sort_by(|a, b| {
            self.graph.nodes[a.0]
                .token
                .text
                .cmp(&self.graph.nodes[b.0].token.text)
        });
        out
    }

    /// Merge `gone` into `keep`.
    fn merge(&mut self, keep: NodeId, gone: NodeId) {
        let nodes = &mut self.graph.nodes;
        let gone_parents = std::mem::take(&mut nodes[gone.0].parents);
        let gone_children = std::mem::take(&mut nodes[gone.0].children);
        let gone_originals = std::mem::take(&mut nodes[gone.0].originals);

        for &parent in &gone_parents {
            replace_edge(&mut nodes[parent.0].children, gone, keep);
        }
        for &child in &gone_children {
            replace_edge(&mut nodes[child.0].parents, gone, keep);
        }

        for parent in gone_parents {
            if parent != keep && !nodes[keep.0].parents.contains(&parent) {
                nodes[keep.0].parents.push(parent);
            }
        }
        for child in gone_children {
            if child != keep && !nodes[keep.0].children.contains(&child) {
                nodes[keep.0].children.push(child);
            }
        }

        for &original in &gone_originals {
            self.graph.originals[original.0].node = keep;
        }
        let nodes = &mut self.graph.nodes;
        nodes[keep.0].originals.extend(gone_originals);
        nodes[keep.0].is_end |= nodes[gone.0].is_end;

        self.merged_into.insert(gone, keep);
    }
}

/// Replace `from` by `to` in an edge list without creating duplicates.
fn replace_edge(edges: &mut Vec<NodeId>, from: NodeId, to: NodeId) {
    if edges.contains(&to) {
        edges.retain(|&id| id != from);
    } else {
        for edge in edges.iter_mut() {
            if *edge == from {
                *edge = to;
            }
        }
    }
}

/// Drop merged nodes from the arena and remap every id.
fn compact(graph: &mut TokenGraph) {
    let mut live = AHashSet::new();
    let mut stack = graph.roots.clone();
    while let Some(id) = stack.pop() {
        if live.insert(id) {
            stack.extend(graph.nodes[id.0].children.iter().copied());
        }
    }
    if live.len() == graph.nodes.len() {
        return;
    }

    let mut remap: Vec<Option<NodeId>> = vec![None; graph.nodes.len()];
    let mut nodes = Vec::with_capacity(live.len());
    for (index, node) in std::mem::take(&mut graph.nodes).into_iter().enumerate() {
        if live.contains(&NodeId(index)) {
            remap[index] = Some(NodeId(nodes.len()));
            nodes.push(node);
        }
    }
    let map = |id: &NodeId| remap[id.0];

    for node in &mut nodes {
        node.parents = node.parents.iter().filter_map(map).collect();
        node.children = node.children.iter().filter_map(map).collect();
    }
    graph.roots = graph.roots.iter().filter_map(map).collect();
    graph.nodes = nodes;

    // Original nodes of dead token nodes are unreachable; only remap the rest.
    for original in &mut graph.originals {
        if let Some(id) = remap[original.node.0] {
            original.node = id;
        }
    }
}
