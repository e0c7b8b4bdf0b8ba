//! Road-network model operations: route planning, movement along routes,
//! and road-distance neighbor queries.

use abm_core::{AbmResult, AgentId};
use abm_space::{OsmPos, OsmSpace, Space};

use crate::agent::Agent;
use crate::model::Model;

impl<A, P> Model<A, OsmSpace, P>
where
    A: Agent<Pos = OsmPos>,
{
    /// Plan a shortest-travel-time route for agent `id` to `dest`,
    /// overwriting any route in progress.  With `return_trip`, reaching the
    /// destination immediately plans the journey back.
    pub fn plan_route(&mut self, id: AgentId, dest: OsmPos, return_trip: bool) -> AbmResult<()> {
        let start = self.agent(id)?.pos();
        let dest = self.space().canonicalize(&dest)?;
        self.space_mut().plan_route(id, &start, &dest, return_trip)?;
        Ok(())
    }

    /// Advance agent `id` by `distance` metres along its planned route.
    ///
    /// Returns `true` when the destination was reached this call.  With no
    /// route in progress the agent stays put and `false` is returned.
    pub fn move_along_route(&mut self, id: AgentId, distance: f32) -> AbmResult<bool> {
        let pos = self.agent(id)?.pos();
        let (new_pos, done) = self.space_mut().move_along_route(id, &pos, distance)?;
        self.move_agent(id, new_pos)?;
        Ok(done)
    }

    /// `true` iff agent `id` has no journey in progress.
    pub fn is_stationary(&self, id: AgentId) -> bool {
        self.space().is_stationary(id)
    }

    /// Re-bind the road network after loading a checkpoint (the network is
    /// never serialized; rebuild it from the map source and attach).
    pub fn attach_network(&mut self, network: abm_space::OsmNetwork) {
        self.space_mut().attach_network(network);
    }

    /// Drop any in-progress route for `id`.
    pub fn cancel_route(&mut self, id: AgentId) {
        self.space_mut().remove_route(id);
    }

    /// Bind a GPS point to the nearest network node.
    pub fn nearest_node(&self, lonlat: [f32; 2]) -> Option<OsmPos> {
        self.space().network().nearest_node(lonlat).map(OsmPos::at_node)
    }

    /// Bind a GPS point to the closest point on the nearest road.
    pub fn nearest_road(&self, lonlat: [f32; 2]) -> Option<OsmPos> {
        self.space().network().nearest_road(lonlat)
    }

    /// A road position sampled uniformly by edge length.
    pub fn random_road_position(&mut self) -> Option<OsmPos> {
        let (space, rng) = self.space_and_rng();
        space.network().random_road_position(rng)
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// IDs of all agents within road distance `radius_m` of `pos`.
    ///
    /// An agent on edge `(u, v)` at offset `o` qualifies when
    /// `d(u) + o ≤ r` or `d(v) + (len − o) ≤ r`, where `d` is the bounded
    /// Dijkstra distance from `pos`.
    pub fn nearby_ids(&self, pos: &OsmPos, radius_m: f32) -> Vec<AgentId> {
        let mut out = Vec::new();
        for ((u, v), d_u, d_v) in self.space().nearby_edges(pos, radius_m) {
            let key = OsmPos { from: u, to: v, offset: 0.0 };
            for &id in self.space().ids_on_edge(&key) {
                let Some(agent) = self.agents().get(id) else {
                    continue;
                };
                let apos = agent.pos();
                let within = if u == v {
                    d_u <= radius_m
                } else {
                    let len = match self.space().edge_length(&apos) {
                        Ok(len) => len,
                        Err(_) => continue,
                    };
                    d_u + apos.offset <= radius_m
                        || d_v + (len - apos.offset) <= radius_m
                };
                if within {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Road-distance neighbors of agent `id`, excluding `id` itself.
    pub fn nearby_ids_of(&self, id: AgentId, radius_m: f32) -> AbmResult<Vec<AgentId>> {
        let pos = self.agent(id)?.pos();
        let mut ids = self.nearby_ids(&pos, radius_m);
        ids.retain(|&x| x != id);
        Ok(ids)
    }

    /// Agents within road distance `radius_m` of `pos`.
    pub fn nearby_agents(&self, pos: &OsmPos, radius_m: f32) -> impl Iterator<Item = &A> {
        self.nearby_ids(pos, radius_m)
            .into_iter()
            .filter_map(|id| self.agents().get(id))
    }
}
