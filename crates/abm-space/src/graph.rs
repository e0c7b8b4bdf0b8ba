//! `GraphSpace` — agents on the vertices of a runtime-mutable graph.
//!
//! The topology is adjacency-list storage so vertices and edges can be added
//! and removed while the simulation runs.  Vertex removal uses the
//! swap-remove convention: the highest-numbered vertex is renumbered into the
//! freed slot, its occupant list moves with it, and the caller receives a
//! [`VertexRemap`] describing the renumbering so agent positions can be
//! rewritten.

use abm_core::{AgentId, ModelRng, NodeId};

use crate::error::{SpaceError, SpaceResult};

// ── NeighborKind ──────────────────────────────────────────────────────────────

/// Which adjacency to follow on directed graphs.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighborKind {
    /// Out-neighbors on directed graphs; the only adjacency on undirected.
    #[default]
    Default,
    /// In-neighbors only.
    In,
    /// Out-neighbors only.
    Out,
    /// Union of in- and out-neighbors.
    All,
}

// ── VertexRemap ───────────────────────────────────────────────────────────────

/// Result of a vertex removal: the vertex formerly numbered `old` is now
/// numbered `new`.  Agents whose `pos == old` must be rewritten to `new`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexRemap {
    pub old: NodeId,
    pub new: NodeId,
}

// ── GraphSpace ────────────────────────────────────────────────────────────────

/// Agents occupy graph vertices; any number of agents per vertex.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSpace {
    directed:  bool,
    out_adj:   Vec<Vec<NodeId>>,
    /// Populated only for directed graphs; mirrors `out_adj` otherwise.
    in_adj:    Vec<Vec<NodeId>>,
    occupants: Vec<Vec<AgentId>>,
}

impl GraphSpace {
    /// An undirected graph with `vertices` isolated vertices.
    pub fn new(vertices: usize) -> Self {
        Self::with_direction(vertices, false)
    }

    /// A graph with `vertices` isolated vertices, directed when asked.
    pub fn with_direction(vertices: usize, directed: bool) -> Self {
        Self {
            directed,
            out_adj:   vec![Vec::new(); vertices],
            in_adj:    if directed { vec![Vec::new(); vertices] } else { Vec::new() },
            occupants: vec![Vec::new(); vertices],
        }
    }

    /// Build an undirected graph from an edge list over `vertices` vertices.
    pub fn from_edges(vertices: usize, edges: &[(u32, u32)]) -> SpaceResult<Self> {
        let mut g = Self::new(vertices);
        for &(a, b) in edges {
            g.add_edge(NodeId(a), NodeId(b))?;
        }
        Ok(g)
    }

    /// A path graph `0 — 1 — … — (n−1)`.
    pub fn path(n: usize) -> Self {
        let mut g = Self::new(n);
        for v in 1..n as u32 {
            let _ = g.add_edge(NodeId(v - 1), NodeId(v));
        }
        g
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.out_adj.len()
    }

    /// Directed edge count (undirected edges count once).
    pub fn edge_count(&self) -> usize {
        let total: usize = self.out_adj.iter().map(Vec::len).sum();
        if self.directed { total } else { total / 2 }
    }

    #[inline]
    fn check_vertex(&self, v: NodeId) -> SpaceResult<()> {
        if v.index() < self.out_adj.len() {
            Ok(())
        } else {
            Err(SpaceError::UnknownVertex(v))
        }
    }

    // ── Topology mutation ─────────────────────────────────────────────────

    /// Add an isolated vertex; returns its ID (always the current count).
    pub fn add_vertex(&mut self) -> NodeId {
        let id = NodeId(self.out_adj.len() as u32);
        self.out_adj.push(Vec::new());
        if self.directed {
            self.in_adj.push(Vec::new());
        }
        self.occupants.push(Vec::new());
        id
    }

    /// Remove vertex `v` along with every incident edge.
    ///
    /// The last vertex is swap-renumbered into the freed slot; the returned
    /// remap is `None` when `v` already was the last vertex.  Occupants of
    /// the *removed* vertex are returned so the model layer can evict them.
    pub fn remove_vertex(
        &mut self,
        v: NodeId,
    ) -> SpaceResult<(Vec<AgentId>, Option<VertexRemap>)> {
        self.check_vertex(v)?;
        let last = NodeId(self.out_adj.len() as u32 - 1);

        // Drop edges incident to v.
        let out_neighbors = std::mem::take(&mut self.out_adj[v.index()]);
        for n in out_neighbors {
            if n != v {
                self.reverse_adj_mut(n).retain(|&x| x != v);
            }
        }
        if self.directed {
            let in_neighbors = std::mem::take(&mut self.in_adj[v.index()]);
            for n in in_neighbors {
                if n != v {
                    self.out_adj[n.index()].retain(|&x| x != v);
                }
            }
        }

        let evicted = std::mem::take(&mut self.occupants[v.index()]);

        // Swap-remove: renumber `last` into slot `v`.
        let remap = if v != last {
            self.out_adj.swap_remove(v.index());
            if self.directed {
                self.in_adj.swap_remove(v.index());
            }
            self.occupants.swap_remove(v.index());
            // Rewrite references to `last` throughout the adjacency lists.
            for adj in self.out_adj.iter_mut() {
                for n in adj.iter_mut() {
                    if *n == last {
                        *n = v;
                    }
                }
            }
            for adj in self.in_adj.iter_mut() {
                for n in adj.iter_mut() {
                    if *n == last {
                        *n = v;
                    }
                }
            }
            Some(VertexRemap { old: last, new: v })
        } else {
            self.out_adj.pop();
            if self.directed {
                self.in_adj.pop();
            }
            self.occupants.pop();
            None
        };

        Ok((evicted, remap))
    }

    fn reverse_adj_mut(&mut self, v: NodeId) -> &mut Vec<NodeId> {
        if self.directed {
            &mut self.in_adj[v.index()]
        } else {
            &mut self.out_adj[v.index()]
        }
    }

    /// Add an edge `a → b` (and `b → a` when undirected).
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> SpaceResult<bool> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if self.out_adj[a.index()].contains(&b) {
            return Ok(false);
        }
        self.out_adj[a.index()].push(b);
        if self.directed {
            self.in_adj[b.index()].push(a);
        } else if a != b {
            self.out_adj[b.index()].push(a);
        }
        Ok(true)
    }

    /// Remove the edge `a → b` (and `b → a` when undirected).
    ///
    /// Returns `false` if no such edge existed.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> SpaceResult<bool> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        let before = self.out_adj[a.index()].len();
        self.out_adj[a.index()].retain(|&x| x != b);
        let removed = self.out_adj[a.index()].len() != before;
        if removed {
            if self.directed {
                self.in_adj[b.index()].retain(|&x| x != a);
            } else if a != b {
                self.out_adj[b.index()].retain(|&x| x != a);
            }
        }
        Ok(removed)
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// Immediate neighbors of `v` for the given adjacency kind.
    pub fn neighbors(&self, v: NodeId, kind: NeighborKind) -> Vec<NodeId> {
        if !self.directed {
            return self.out_adj[v.index()].clone();
        }
        match kind {
            NeighborKind::Default | NeighborKind::Out => self.out_adj[v.index()].clone(),
            NeighborKind::In => self.in_adj[v.index()].clone(),
            NeighborKind::All => {
                let mut all = self.out_adj[v.index()].clone();
                for &n in &self.in_adj[v.index()] {
                    if !all.contains(&n) {
                        all.push(n);
                    }
                }
                all
            }
        }
    }

    /// Vertices within `r` hops of `v` by BFS, excluding `v` itself.
    pub fn nearby_positions(&self, v: NodeId, r: u32, kind: NeighborKind) -> Vec<NodeId> {
        let mut visited = vec![false; self.vertex_count()];
        visited[v.index()] = true;
        let mut frontier = vec![v];
        let mut out = Vec::new();
        for _ in 0..r {
            let mut next = Vec::new();
            for &u in &frontier {
                for n in self.neighbors(u, kind) {
                    if !visited[n.index()] {
                        visited[n.index()] = true;
                        out.push(n);
                        next.push(n);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }

    /// IDs of all agents within `r` hops of `v`, occupants of `v` included.
    pub fn nearby_ids(&self, v: NodeId, r: u32, kind: NeighborKind) -> Vec<AgentId> {
        let mut out = self.occupants[v.index()].clone();
        for u in self.nearby_positions(v, r, kind) {
            out.extend_from_slice(&self.occupants[u.index()]);
        }
        out
    }
}

// ── Space impl ────────────────────────────────────────────────────────────────

impl crate::Space for GraphSpace {
    type Pos = NodeId;

    fn canonicalize(&self, pos: &NodeId) -> SpaceResult<NodeId> {
        self.check_vertex(*pos)?;
        Ok(*pos)
    }

    fn insert(&mut self, id: AgentId, pos: &NodeId) -> SpaceResult<()> {
        self.check_vertex(*pos)?;
        self.occupants[pos.index()].push(id);
        Ok(())
    }

    fn delete(&mut self, id: AgentId, pos: &NodeId) {
        if pos.index() < self.occupants.len() {
            if let Some(slot) = self.occupants[pos.index()].iter().position(|&x| x == id) {
                self.occupants[pos.index()].swap_remove(slot);
            }
        }
    }

    fn relocate(&mut self, id: AgentId, from: &NodeId, to: &NodeId) -> SpaceResult<()> {
        self.check_vertex(*to)?;
        self.delete(id, from);
        self.occupants[to.index()].push(id);
        Ok(())
    }

    fn random_pos(&self, rng: &mut ModelRng) -> NodeId {
        NodeId(rng.gen_range(0..self.vertex_count() as u32))
    }
}

impl crate::DiscreteSpace for GraphSpace {
    fn positions(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new((0..self.vertex_count() as u32).map(NodeId))
    }

    fn ids_at(&self, pos: &NodeId) -> &[AgentId] {
        &self.occupants[pos.index()]
    }

    fn empty_positions(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new(
            (0..self.vertex_count() as u32)
                .map(NodeId)
                .filter(|v| self.occupants[v.index()].is_empty()),
        )
    }

    fn random_empty(&self, rng: &mut ModelRng) -> SpaceResult<NodeId> {
        use crate::Space;
        let n = self.vertex_count();
        for _ in 0..n.min(200) {
            let v = self.random_pos(rng);
            if self.occupants[v.index()].is_empty() {
                return Ok(v);
            }
        }
        let empties: Vec<NodeId> = self.empty_positions().collect();
        rng.choose(&empties)
            .copied()
            .ok_or(SpaceError::NoEmptyPosition)
    }
}
