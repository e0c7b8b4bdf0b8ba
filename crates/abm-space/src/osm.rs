//! `OsmSpace` — agents on a road network.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_travel_ms`)
//! are sorted by source node and indexed by `EdgeId`, so iterating a node's
//! outgoing edges is a contiguous memory scan — ideal for Dijkstra's inner
//! loop.  An R-tree (via `rstar`) maps `[lon, lat]` to the nearest `NodeId`
//! for binding GPS points to the network.
//!
//! # Positions
//!
//! An agent's position is an [`OsmPos`]: a directed edge plus metres
//! travelled from its source node.  `OsmPos { n, n, 0.0 }` means "standing at
//! node n".
//!
//! # Checkpointing
//!
//! The network itself is never serialized (it is rebuilt from the map file);
//! [`OsmSpace::attach_network`] re-binds it after loading a checkpoint.
//! Occupancy and in-progress routes do round-trip.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use abm_core::{AgentId, EdgeId, ModelRng, NodeId};

use crate::error::{SpaceError, SpaceResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lon, lat]` point with
/// the associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [lon, lat]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lon/lat space.  Sufficient for
    /// nearest-node queries within a city (error < 0.1 % at ≤ 60° lat).
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── OsmPos ────────────────────────────────────────────────────────────────────

/// A position on the road network: `offset` metres along the directed edge
/// `from → to`.  `from == to` with zero offset means "at node".
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmPos {
    pub from:   NodeId,
    pub to:     NodeId,
    pub offset: f32,
}

impl OsmPos {
    /// The "standing at node `n`" position.
    pub fn at_node(n: NodeId) -> Self {
        Self { from: n, to: n, offset: 0.0 }
    }

    /// `true` when the position is a bare node rather than mid-edge.
    #[inline]
    pub fn is_node(&self) -> bool {
        self.from == self.to
    }
}

// ── OsmNetwork ────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`OsmNetworkBuilder`].
pub struct OsmNetwork {
    /// `[lon, lat]` of each node.  Indexed by `NodeId`.
    pub node_lonlat: Vec<[f32; 2]>,

    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.  Length = node count + 1.
    pub node_out_start: Vec<u32>,

    /// Source node of each edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f32>,

    /// Travel time in milliseconds.  Used as the routing cost.
    pub edge_travel_ms: Vec<u32>,

    /// Cumulative edge length, for sampling edges ∝ length.
    /// `cum_length_m[i]` = total length of edges `0..i`; length = edges + 1.
    cum_length_m: Vec<f64>,

    spatial_idx: RTree<NodeEntry>,
}

impl OsmNetwork {
    /// A network with no nodes or edges.  Any routing request against it
    /// fails with [`SpaceError::NoRoute`]; used as the detached-checkpoint
    /// placeholder.
    pub fn empty() -> Self {
        OsmNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_lonlat.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_lonlat.is_empty()
    }

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// The edge `from → to`, if present.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from)
            .find(|&e| self.edge_to[e.index()] == to)
    }

    /// `NodeId` of the nearest road node to `[lon, lat]`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn nearest_node(&self, lonlat: [f32; 2]) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&lonlat).map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `[lon, lat]`, ascending by distance.
    pub fn k_nearest_nodes(&self, lonlat: [f32; 2], k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&lonlat)
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// Bind `[lon, lat]` to the closest point on the road network.
    ///
    /// Candidate edges are those incident to the few nearest nodes; the point
    /// is projected onto each segment in lon/lat space and the closest
    /// projection wins.
    pub fn nearest_road(&self, lonlat: [f32; 2]) -> Option<OsmPos> {
        let mut best: Option<(f32, OsmPos)> = None;
        for node in self.k_nearest_nodes(lonlat, 5) {
            for e in self.out_edges(node) {
                let a = self.node_lonlat[self.edge_from[e.index()].index()];
                let b = self.node_lonlat[self.edge_to[e.index()].index()];
                let (dist_sq, t) = project_on_segment(lonlat, a, b);
                let candidate = OsmPos {
                    from:   self.edge_from[e.index()],
                    to:     self.edge_to[e.index()],
                    offset: t * self.edge_length_m[e.index()],
                };
                if best.map(|(d, _)| dist_sq < d).unwrap_or(true) {
                    best = Some((dist_sq, candidate));
                }
            }
        }
        best.map(|(_, pos)| pos)
    }

    /// A road position sampled uniformly by length: edges are weighted by
    /// their length, then the offset is uniform along the chosen edge.
    pub fn random_road_position(&self, rng: &mut ModelRng) -> Option<OsmPos> {
        let total = *self.cum_length_m.last()?;
        if total <= 0.0 {
            return None;
        }
        let target = rng.gen_range(0.0..total);
        // First edge whose cumulative end exceeds target.
        let e = match self
            .cum_length_m
            .binary_search_by(|c| c.partial_cmp(&target).unwrap())
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let e = e.min(self.edge_count() - 1);
        Some(OsmPos {
            from:   self.edge_from[e],
            to:     self.edge_to[e],
            offset: (target - self.cum_length_m[e]) as f32,
        })
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Shortest path by travel time from `from` to `to`, as the node list
    /// including both endpoints.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> SpaceResult<Vec<NodeId>> {
        if from == to {
            return Ok(vec![from]);
        }
        let n = self.node_count();
        if from.index() >= n || to.index() >= n {
            return Err(SpaceError::NoRoute { from, to });
        }
        let mut dist = vec![u32::MAX; n];
        let mut prev_edge = vec![EdgeId::INVALID; n];
        dist[from.index()] = 0;

        // Min-heap: Reverse makes BinaryHeap (max) behave as min-heap.
        // Secondary key NodeId ensures deterministic tie-breaking.
        let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                let mut nodes = vec![to];
                let mut cur = to;
                loop {
                    let e = prev_edge[cur.index()];
                    if e == EdgeId::INVALID {
                        break;
                    }
                    cur = self.edge_from[e.index()];
                    nodes.push(cur);
                }
                nodes.reverse();
                return Ok(nodes);
            }
            if cost > dist[node.index()] {
                continue; // stale heap entry
            }
            for edge in self.out_edges(node) {
                let neighbor = self.edge_to[edge.index()];
                let new_cost = cost.saturating_add(self.edge_travel_ms[edge.index()]);
                if new_cost < dist[neighbor.index()] {
                    dist[neighbor.index()] = new_cost;
                    prev_edge[neighbor.index()] = edge;
                    heap.push(Reverse((new_cost, neighbor)));
                }
            }
        }
        Err(SpaceError::NoRoute { from, to })
    }

    /// Metre distances to every node reachable within `radius_m` of the seed
    /// set, Dijkstra bounded by the radius.
    pub fn nodes_within(
        &self,
        seeds: &[(NodeId, f32)],
        radius_m: f32,
    ) -> FxHashMap<NodeId, f32> {
        let mut dist: FxHashMap<NodeId, f32> = FxHashMap::default();
        let mut heap: BinaryHeap<Reverse<(OrdF32, NodeId)>> = BinaryHeap::new();
        for &(node, d0) in seeds {
            if d0 <= radius_m && node.index() < self.node_count() {
                dist.insert(node, d0);
                heap.push(Reverse((OrdF32(d0), node)));
            }
        }
        while let Some(Reverse((OrdF32(cost), node))) = heap.pop() {
            if dist.get(&node).map(|&d| cost > d).unwrap_or(false) {
                continue;
            }
            for edge in self.out_edges(node) {
                let neighbor = self.edge_to[edge.index()];
                let new_cost = cost + self.edge_length_m[edge.index()];
                if new_cost <= radius_m
                    && dist.get(&neighbor).map(|&d| new_cost < d).unwrap_or(true)
                {
                    dist.insert(neighbor, new_cost);
                    heap.push(Reverse((OrdF32(new_cost), neighbor)));
                }
            }
        }
        dist
    }
}

/// Total-order wrapper for nonnegative f32 heap keys.
#[derive(Copy, Clone, PartialEq)]
struct OrdF32(f32);

impl Eq for OrdF32 {}

impl PartialOrd for OrdF32 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Squared distance from `p` to segment `a..b` plus the projection parameter
/// `t ∈ [0, 1]`.
fn project_on_segment(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> (f32, f32) {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0)
    };
    let proj = [a[0] + t * ab[0], a[1] + t * ab[1]];
    let d = [p[0] - proj[0], p[1] - proj[1]];
    (d[0] * d[0] + d[1] * d[1], t)
}

// ── OsmNetworkBuilder ─────────────────────────────────────────────────────────

/// Construct an [`OsmNetwork`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node, constructs the CSR arrays, and bulk-loads the
/// R-tree.  Map readers (OSM PBF or otherwise) live outside this crate and
/// feed this builder.
pub struct OsmNetworkBuilder {
    nodes:     Vec<[f32; 2]>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    length_m:  f32,
    travel_ms: u32,
}

impl OsmNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node at `[lon, lat]` and return its `NodeId`.
    pub fn add_node(&mut self, lonlat: [f32; 2]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(lonlat);
        id
    }

    /// Add a **directed** edge with physical length and travel time.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f32, travel_ms: u32) {
        self.raw_edges.push(RawEdge { from, to, length_m, travel_ms });
    }

    /// Convenience: add edges in **both directions** for an undirected road
    /// segment (the common case for most road types).
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f32, travel_ms: u32) {
        self.add_directed_edge(a, b, length_m, travel_ms);
        self.add_directed_edge(b, a, length_m, travel_ms);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.raw_edges.len()
    }

    /// Consume the builder and produce an [`OsmNetwork`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> OsmNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|e| e.from.0);

        let edge_from:      Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f32>    = raw.iter().map(|e| e.length_m).collect();
        let edge_travel_ms: Vec<u32>    = raw.iter().map(|e| e.travel_ms).collect();

        // CSR row pointer.
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Cumulative length for ∝-length edge sampling.
        let mut cum_length_m = Vec::with_capacity(edge_count + 1);
        cum_length_m.push(0.0f64);
        for len in &edge_length_m {
            cum_length_m.push(cum_length_m.last().unwrap() + *len as f64);
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &point)| NodeEntry { point, id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        OsmNetwork {
            node_lonlat: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_travel_ms,
            cum_length_m,
            spatial_idx,
        }
    }
}

impl Default for OsmNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── OsmRoute ──────────────────────────────────────────────────────────────────

/// An in-progress journey: nodes still to visit (reversed for O(1) pops) and
/// the final edge position.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmRoute {
    /// Remaining path nodes, destination-first (`pop()` yields the next one).
    nodes_rev: Vec<NodeId>,
    /// Final position on the destination edge.
    dest: OsmPos,
    /// When set, arriving plans the reverse journey instead of finishing.
    return_to: Option<OsmPos>,
}

// ── OsmSpace ──────────────────────────────────────────────────────────────────

/// Road-network space: per-edge occupancy plus per-agent route state.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmSpace {
    #[cfg_attr(feature = "serde", serde(skip, default = "OsmNetwork::empty"))]
    network: OsmNetwork,

    /// Occupants keyed by directed edge; node-positions key the self-pair.
    occupants: FxHashMap<(NodeId, NodeId), Vec<AgentId>>,

    /// In-progress journeys keyed by agent.
    routes: FxHashMap<AgentId, OsmRoute>,
}

impl OsmSpace {
    pub fn new(network: OsmNetwork) -> Self {
        Self {
            network,
            occupants: FxHashMap::default(),
            routes: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn network(&self) -> &OsmNetwork {
        &self.network
    }

    /// Re-bind the road network after loading a checkpoint.
    pub fn attach_network(&mut self, network: OsmNetwork) {
        self.network = network;
    }

    /// Length in metres of the edge under `pos` (zero for node positions).
    pub fn edge_length(&self, pos: &OsmPos) -> SpaceResult<f32> {
        if pos.is_node() {
            return Ok(0.0);
        }
        let e = self
            .network
            .edge_between(pos.from, pos.to)
            .ok_or(SpaceError::UnknownEdge { from: pos.from, to: pos.to })?;
        Ok(self.network.edge_length_m[e.index()])
    }

    /// `true` iff `id` has no journey in progress.
    pub fn is_stationary(&self, id: AgentId) -> bool {
        !self.routes.contains_key(&id)
    }

    /// Drop any in-progress route for `id` (no-op when absent).
    pub fn remove_route(&mut self, id: AgentId) {
        self.routes.remove(&id);
    }

    /// Plan a shortest-travel-time route from `start` to `dest` for `id`,
    /// replacing any existing route.  With `return_trip`, arriving at `dest`
    /// immediately plans the journey back to `start`.
    pub fn plan_route(
        &mut self,
        id:          AgentId,
        start:       &OsmPos,
        dest:        &OsmPos,
        return_trip: bool,
    ) -> SpaceResult<()> {
        let route = self.build_route(start, dest, return_trip.then_some(*start))?;
        self.routes.insert(id, route);
        Ok(())
    }

    fn build_route(
        &self,
        start:     &OsmPos,
        dest:      &OsmPos,
        return_to: Option<OsmPos>,
    ) -> SpaceResult<OsmRoute> {
        // Same-edge shortcut: continue along the current edge.
        if !start.is_node()
            && (start.from, start.to) == (dest.from, dest.to)
            && dest.offset >= start.offset
        {
            return Ok(OsmRoute { nodes_rev: Vec::new(), dest: *dest, return_to });
        }
        let from_node = if start.is_node() { start.from } else { start.to };
        let to_node = dest.from;
        let mut path = self.network.shortest_path(from_node, to_node)?;
        // Keep the start node in the stack: move_along pops it when the agent
        // finishes the current edge (or immediately when already at a node).
        path.reverse();
        Ok(OsmRoute { nodes_rev: path, dest: *dest, return_to })
    }

    /// Advance `id` by `distance` metres along its planned route.
    ///
    /// Returns the new position and whether the destination was reached this
    /// call.  With no route in progress the position is returned unchanged.
    pub fn move_along_route(
        &mut self,
        id:       AgentId,
        pos:      &OsmPos,
        distance: f32,
    ) -> SpaceResult<(OsmPos, bool)> {
        let Some(mut route) = self.routes.remove(&id) else {
            return Ok((*pos, false));
        };
        let mut pos = *pos;
        let mut budget = distance;

        loop {
            if route.nodes_rev.is_empty() {
                // Final leg: walking the destination edge up to dest.offset.
                if pos.is_node() && !route.dest.is_node() {
                    pos = OsmPos { from: route.dest.from, to: route.dest.to, offset: 0.0 };
                }
                let remaining = route.dest.offset - pos.offset;
                if budget < remaining {
                    pos.offset += budget;
                    self.routes.insert(id, route);
                    return Ok((pos, false));
                }
                pos = route.dest;
                return match route.return_to {
                    Some(back) => {
                        let reverse = self.build_route(&pos, &back, None)?;
                        self.routes.insert(id, reverse);
                        Ok((pos, true))
                    }
                    None => Ok((pos, true)),
                };
            }

            if pos.is_node() {
                // At a node: pop it if it heads the path, then enter the next
                // edge (or fall through to the final leg).
                if route.nodes_rev.last() == Some(&pos.from) {
                    route.nodes_rev.pop();
                }
                match route.nodes_rev.last() {
                    Some(&next) => {
                        pos = OsmPos { from: pos.from, to: next, offset: 0.0 };
                    }
                    None => continue,
                }
            }

            let len = self.edge_length(&pos)?;
            let remaining = len - pos.offset;
            if budget < remaining {
                pos.offset += budget;
                self.routes.insert(id, route);
                return Ok((pos, false));
            }
            budget -= remaining;
            // Crossed into the edge's end node.
            if route.nodes_rev.last() == Some(&pos.to) {
                route.nodes_rev.pop();
            }
            pos = OsmPos::at_node(pos.to);
        }
    }

    /// Candidate edges whose road distance from `pos` is within `radius_m`,
    /// with the metre distance to each endpoint.  An agent on edge `(u, v)`
    /// at offset `o` is within the radius iff
    /// `d(u) + o ≤ r` or `d(v) + (len − o) ≤ r`; the model layer applies that
    /// per-agent filter since offsets live on the agents.
    pub fn nearby_edges(
        &self,
        pos:      &OsmPos,
        radius_m: f32,
    ) -> Vec<((NodeId, NodeId), f32, f32)> {
        let seeds: Vec<(NodeId, f32)> = if pos.is_node() {
            vec![(pos.from, 0.0)]
        } else {
            let len = self.edge_length(pos).unwrap_or(0.0);
            vec![(pos.from, pos.offset), (pos.to, (len - pos.offset).max(0.0))]
        };
        let dist = self.network.nodes_within(&seeds, radius_m);

        let mut out = Vec::new();
        for (&(from, to), ids) in self.occupants.iter() {
            if ids.is_empty() {
                continue;
            }
            let d_from = dist.get(&from).copied();
            let d_to = dist.get(&to).copied();
            if d_from.is_some() || d_to.is_some() {
                out.push((
                    (from, to),
                    d_from.unwrap_or(f32::INFINITY),
                    d_to.unwrap_or(f32::INFINITY),
                ));
            }
        }
        out
    }

    /// IDs standing on the same directed edge (or node) as `pos`.
    pub fn ids_on_edge(&self, pos: &OsmPos) -> &[AgentId] {
        self.occupants
            .get(&(pos.from, pos.to))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ── Space impl ────────────────────────────────────────────────────────────────

impl crate::Space for OsmSpace {
    type Pos = OsmPos;

    fn canonicalize(&self, pos: &OsmPos) -> SpaceResult<OsmPos> {
        if pos.is_node() {
            if pos.from.index() >= self.network.node_count() {
                return Err(SpaceError::UnknownVertex(pos.from));
            }
            return Ok(OsmPos { offset: 0.0, ..*pos });
        }
        let len = self.edge_length(pos)?;
        if !(0.0..=len).contains(&pos.offset) {
            return Err(SpaceError::OutOfBounds {
                dim:    0,
                coord:  pos.offset as f64,
                extent: len as f64,
            });
        }
        // Landing exactly on the far node canonicalizes to the node form.
        if pos.offset == len {
            return Ok(OsmPos::at_node(pos.to));
        }
        Ok(*pos)
    }

    fn insert(&mut self, id: AgentId, pos: &OsmPos) -> SpaceResult<()> {
        self.occupants
            .entry((pos.from, pos.to))
            .or_default()
            .push(id);
        Ok(())
    }

    fn delete(&mut self, id: AgentId, pos: &OsmPos) {
        if let Some(list) = self.occupants.get_mut(&(pos.from, pos.to)) {
            if let Some(slot) = list.iter().position(|&x| x == id) {
                list.swap_remove(slot);
            }
            if list.is_empty() {
                self.occupants.remove(&(pos.from, pos.to));
            }
        }
        self.routes.remove(&id);
    }

    fn relocate(&mut self, id: AgentId, from: &OsmPos, to: &OsmPos) -> SpaceResult<()> {
        if (from.from, from.to) == (to.from, to.to) {
            return Ok(());
        }
        if let Some(list) = self.occupants.get_mut(&(from.from, from.to)) {
            if let Some(slot) = list.iter().position(|&x| x == id) {
                list.swap_remove(slot);
            }
            if list.is_empty() {
                self.occupants.remove(&(from.from, from.to));
            }
        }
        self.occupants
            .entry((to.from, to.to))
            .or_default()
            .push(id);
        Ok(())
    }

    fn random_pos(&self, rng: &mut ModelRng) -> OsmPos {
        self.network
            .random_road_position(rng)
            .unwrap_or(OsmPos::at_node(NodeId(0)))
    }
}
