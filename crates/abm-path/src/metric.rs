//! Cost metrics for A* edge costs and heuristics.
//!
//! `delta_cost` is both the per-move edge cost and the heuristic: for a
//! straight-line displacement it never overestimates the real path cost, so
//! the heuristic stays admissible at ε = 0.

/// Per-displacement cost model.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "DirectDistance<D>: serde::Serialize, PenaltyMap<D>: serde::Serialize",
    deserialize = "DirectDistance<D>: serde::Deserialize<'de>, \
                   PenaltyMap<D>: serde::Deserialize<'de>"
)))]
pub enum CostMetric<const D: usize> {
    /// Axis-decomposed costs (the classical 10/14 scheme in 2-D).
    Direct(DirectDistance<D>),
    /// Pure Chebyshev: every move costs 1.
    Chebyshev(MaxDistance),
    /// A base metric plus the absolute difference of a per-cell scalar map.
    Penalty(PenaltyMap<D>),
}

impl<const D: usize> Default for CostMetric<D> {
    fn default() -> Self {
        CostMetric::Direct(DirectDistance::default())
    }
}

impl<const D: usize> CostMetric<D> {
    /// Straight-line cost of a raw displacement (heuristic).
    pub fn delta_cost(&self, delta: &[i32; D]) -> u64 {
        match self {
            CostMetric::Direct(m) => m.delta_cost(delta),
            CostMetric::Chebyshev(_) => {
                delta.iter().map(|o| o.abs()).max().unwrap_or(0) as u64
            }
            CostMetric::Penalty(m) => m.base.delta_cost(delta),
        }
    }

    /// Cost of one move between adjacent cells (flat indices + displacement).
    pub fn move_cost(&self, from_flat: usize, to_flat: usize, delta: &[i32; D]) -> u64 {
        match self {
            CostMetric::Penalty(m) => {
                m.base.move_cost(from_flat, to_flat, delta)
                    + m.pmap[to_flat].abs_diff(m.pmap[from_flat])
            }
            other => other.delta_cost(delta),
        }
    }

    /// The penalty map, when this metric carries one.
    pub fn penaltymap(&self) -> Option<&[u64]> {
        match self {
            CostMetric::Penalty(m) => Some(&m.pmap),
            _ => None,
        }
    }

    /// Mutable penalty map for in-place terrain edits.
    pub fn penaltymap_mut(&mut self) -> Option<&mut Vec<u64>> {
        match self {
            CostMetric::Penalty(m) => Some(&mut m.pmap),
            _ => None,
        }
    }
}

// ── DirectDistance ────────────────────────────────────────────────────────────

/// Costs indexed by how many orthogonal axes a step spans.
///
/// `direction_costs[k]` is the cost of a move changing `k + 1` coordinates;
/// the default is `round(10·√(k+1))` — `[10, 14]` in 2-D, `[10, 14, 17]` in
/// 3-D.
///
/// A straight-line displacement decomposes into maximal diagonal runs: with
/// per-axis magnitudes sorted ascending `δ₁ ≤ … ≤ δ_D`, the displacement
/// takes `δ₁` moves across all D axes, `δ₂ − δ₁` across D−1, and so on down
/// to `δ_D − δ_{D−1}` single-axis moves.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "[u64; D]: serde::Serialize",
    deserialize = "[u64; D]: serde::Deserialize<'de>"
)))]
pub struct DirectDistance<const D: usize> {
    pub direction_costs: [u64; D],
}

impl<const D: usize> Default for DirectDistance<D> {
    fn default() -> Self {
        let mut direction_costs = [0u64; D];
        for (k, c) in direction_costs.iter_mut().enumerate() {
            *c = (10.0 * ((k + 1) as f64).sqrt()).round() as u64;
        }
        Self { direction_costs }
    }
}

impl<const D: usize> DirectDistance<D> {
    pub fn new(direction_costs: [u64; D]) -> Self {
        Self { direction_costs }
    }

    fn delta_cost(&self, delta: &[i32; D]) -> u64 {
        let mut mags = [0u64; D];
        for d in 0..D {
            mags[d] = delta[d].unsigned_abs() as u64;
        }
        mags.sort_unstable();
        let mut cost = 0u64;
        let mut prev = 0u64;
        for k in 0..D {
            cost += (mags[k] - prev) * self.direction_costs[D - 1 - k];
            prev = mags[k];
        }
        cost
    }
}

// ── MaxDistance ───────────────────────────────────────────────────────────────

/// Pure Chebyshev cost: every move, straight or diagonal, costs 1.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaxDistance;

// ── PenaltyMap ────────────────────────────────────────────────────────────────

/// Adds `|pmap[to] − pmap[from]|` to a base metric's move cost.
///
/// The heuristic uses the base metric alone; penalties only raise real costs,
/// so admissibility is preserved.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "CostMetric<D>: serde::Serialize",
    deserialize = "CostMetric<D>: serde::Deserialize<'de>"
)))]
pub struct PenaltyMap<const D: usize> {
    /// Per-cell scalar, flat-indexed congruently with the walkmap.
    pub pmap: Vec<u64>,
    pub base: Box<CostMetric<D>>,
}

impl<const D: usize> PenaltyMap<D> {
    pub fn new(pmap: Vec<u64>, base: CostMetric<D>) -> Self {
        Self { pmap, base: Box::new(base) }
    }
}
