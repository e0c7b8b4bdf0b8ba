//! Graph-space model operations: runtime topology mutation plus
//! hop-distance neighborhoods.

use abm_core::{AbmResult, AgentId, NodeId};
use abm_space::{GraphSpace, NeighborKind};

use crate::agent::Agent;
use crate::model::Model;

impl<A, P> Model<A, GraphSpace, P>
where
    A: Agent<Pos = NodeId>,
{
    /// Add an isolated vertex to the graph.
    pub fn add_vertex(&mut self) -> NodeId {
        self.space_mut().add_vertex()
    }

    /// Remove vertex `v` and every incident edge.
    ///
    /// Agents standing on `v` are removed from the model and returned.  The
    /// swap-remove renumbering is applied to the agents that moved with the
    /// renamed vertex, so positions stay consistent.
    pub fn remove_vertex(&mut self, v: NodeId) -> AbmResult<Vec<A>> {
        let (evicted_ids, remap) = self.space_mut().remove_vertex(v)?;

        // The space already dropped the evicted occupants from its index;
        // take them out of the container directly.
        let mut evicted = Vec::with_capacity(evicted_ids.len());
        for id in evicted_ids {
            if let Some(agent) = self.take_agent_raw(id) {
                evicted.push(agent);
            }
        }

        // Agents riding the renumbered vertex sit in the slot's occupant
        // list; rewrite their positions to the new vertex number.
        if let Some(remap) = remap {
            use abm_space::DiscreteSpace;
            let moved: Vec<AgentId> = self.space().ids_at(&remap.new).to_vec();
            for id in moved {
                if let Ok(agent) = self.agent_mut(id) {
                    agent.set_pos(remap.new);
                }
            }
        }
        Ok(evicted)
    }

    /// Add an edge `a → b` (both directions when undirected).
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> AbmResult<bool> {
        Ok(self.space_mut().add_edge(a, b)?)
    }

    /// Remove the edge `a → b` (both directions when undirected).
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> AbmResult<bool> {
        Ok(self.space_mut().remove_edge(a, b)?)
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// IDs within `r` hops of vertex `v`, occupants of `v` included.
    pub fn nearby_ids(&self, v: NodeId, r: u32, kind: NeighborKind) -> Vec<AgentId> {
        self.space().nearby_ids(v, r, kind)
    }

    /// IDs within `r` hops of agent `id`, excluding `id` itself (co-located
    /// agents stay).
    pub fn nearby_ids_of(&self, id: AgentId, r: u32, kind: NeighborKind) -> AbmResult<Vec<AgentId>> {
        let v = self.agent(id)?.pos();
        let mut ids = self.space().nearby_ids(v, r, kind);
        ids.retain(|&x| x != id);
        Ok(ids)
    }

    /// Vertices within `r` hops of `v`, excluding `v`.
    pub fn nearby_positions(&self, v: NodeId, r: u32, kind: NeighborKind) -> Vec<NodeId> {
        self.space().nearby_positions(v, r, kind)
    }

    /// Agents within `r` hops of vertex `v`.
    pub fn nearby_agents(&self, v: NodeId, r: u32, kind: NeighborKind) -> impl Iterator<Item = &A> {
        self.space()
            .nearby_ids(v, r, kind)
            .into_iter()
            .filter_map(|id| self.agents().get(id))
    }
}
