//! `ContinuousSpace<D>` — d-dimensional real space with bucketed indexing.
//!
//! # Dual-layer layout
//!
//! Agent coordinates are real vectors in `[0, extent_d)`.  For neighbor
//! search the space overlays a multi-occupancy bucket lattice of cell side
//! `spacing`; an agent's bucket is its coordinates floor-divided by
//! `spacing`.  A radius-`r` query touches every bucket within
//! `ceil(r / spacing)` lattice cells, which yields the *inexact* superset;
//! the model layer filters by true Euclidean distance for the *exact* query
//! (positions live on the agents, not in the index).
//!
//! Velocity integration, random walks, pairing strategies, and elastic
//! collisions operate on `(position, velocity)` data and are provided here as
//! pure functions; the model layer owns the agent glue.

use abm_core::{AgentId, ModelRng};

use crate::error::{SpaceError, SpaceResult};
use crate::lattice::{Lattice, Metric};

/// d-dimensional real space with per-dimension extent and periodicity.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "[f64; D]: serde::Serialize, [bool; D]: serde::Serialize, \
                 Lattice<D>: serde::Serialize",
    deserialize = "[f64; D]: serde::Deserialize<'de>, [bool; D]: serde::Deserialize<'de>, \
                   Lattice<D>: serde::Deserialize<'de>"
)))]
pub struct ContinuousSpace<const D: usize> {
    extent:   [f64; D],
    spacing:  f64,
    periodic: [bool; D],
    lattice:  Lattice<D>,
    buckets:  Vec<Vec<AgentId>>,
}

impl<const D: usize> ContinuousSpace<D> {
    /// Create a space with the given extent, bucket spacing, and uniform
    /// periodicity.
    ///
    /// Fails with `Config` if the spacing is non-positive or larger than the
    /// smallest extent.
    pub fn new(extent: [f64; D], spacing: f64, periodic: bool) -> SpaceResult<Self> {
        Self::with_periodicity(extent, spacing, [periodic; D])
    }

    /// Create a space with independently periodic dimensions.
    pub fn with_periodicity(
        extent:   [f64; D],
        spacing:  f64,
        periodic: [bool; D],
    ) -> SpaceResult<Self> {
        if spacing <= 0.0 {
            return Err(SpaceError::Config(format!(
                "spacing must be positive, got {spacing}"
            )));
        }
        if extent.iter().any(|&e| e < spacing) {
            return Err(SpaceError::Config(format!(
                "spacing {spacing} exceeds the smallest extent"
            )));
        }
        let mut dims = [0usize; D];
        for d in 0..D {
            dims[d] = (extent[d] / spacing).ceil() as usize;
        }
        // Bucket distances use Chebyshev so a radius-r ball is fully covered
        // by the enclosing cube of buckets.
        let lattice = Lattice::new(dims, periodic, Metric::Chebyshev);
        let buckets = vec![Vec::new(); lattice.len()];
        Ok(Self { extent, spacing, periodic, lattice, buckets })
    }

    #[inline]
    pub fn extent(&self) -> [f64; D] {
        self.extent
    }

    #[inline]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    #[inline]
    pub fn periodic(&self) -> [bool; D] {
        self.periodic
    }

    /// The bucket lattice (also the shape pathfinder overlays use).
    #[inline]
    pub fn lattice(&self) -> &Lattice<D> {
        &self.lattice
    }

    /// Bucket holding a canonical position.
    #[inline]
    pub fn bucket_of(&self, pos: &[f64; D]) -> [i32; D] {
        let dims = self.lattice.dims();
        let mut b = [0i32; D];
        for d in 0..D {
            // Clamp to the last bucket: extent is exclusive, but accumulated
            // fp error can produce pos == extent on wrap boundaries.
            b[d] = ((pos[d] / self.spacing) as i32).min(dims[d] as i32 - 1);
        }
        b
    }

    /// Center point of a bucket (used as pathfinding waypoints).
    #[inline]
    pub fn bucket_center(&self, bucket: &[i32; D]) -> [f64; D] {
        let mut c = [0.0; D];
        for d in 0..D {
            c[d] = (bucket[d] as f64 + 0.5) * self.spacing;
        }
        c
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// Shortest displacement from `a` to `b`, minimum-image on periodic dims.
    #[inline]
    pub fn displacement(&self, a: &[f64; D], b: &[f64; D]) -> [f64; D] {
        let mut delta = [0.0; D];
        for d in 0..D {
            let mut dd = b[d] - a[d];
            if self.periodic[d] {
                let l = self.extent[d];
                if dd > l * 0.5 {
                    dd -= l;
                } else if dd < -l * 0.5 {
                    dd += l;
                }
            }
            delta[d] = dd;
        }
        delta
    }

    /// Euclidean distance honoring periodicity.
    pub fn euclidean_distance(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        self.displacement(a, b)
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt()
    }

    /// Manhattan distance honoring periodicity.
    pub fn manhattan_distance(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        self.displacement(a, b).iter().map(|x| x.abs()).sum()
    }

    /// `pos + delta`, wrapped/validated per dimension.
    pub fn translate(&self, pos: &[f64; D], delta: &[f64; D]) -> SpaceResult<[f64; D]> {
        let mut out = [0.0; D];
        for d in 0..D {
            out[d] = pos[d] + delta[d];
        }
        self.wrap(&out)
    }

    fn wrap(&self, pos: &[f64; D]) -> SpaceResult<[f64; D]> {
        let mut out = *pos;
        for d in 0..D {
            let l = self.extent[d];
            if self.periodic[d] {
                out[d] = pos[d].rem_euclid(l);
                if out[d] >= l {
                    // rem_euclid can return l for tiny negative inputs.
                    out[d] = 0.0;
                }
            } else if !(0.0..l).contains(&pos[d]) {
                return Err(SpaceError::OutOfBounds {
                    dim:    d,
                    coord:  pos[d],
                    extent: l,
                });
            }
        }
        Ok(out)
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// IDs of every agent in a bucket intersecting the radius-`r` ball
    /// around `pos`.  Superset guarantee: contains at least every agent whose
    /// true distance is ≤ `r`; may contain agents up to one bucket diagonal
    /// farther.  Filter with [`ContinuousSpace::euclidean_distance`] for the
    /// exact set.
    pub fn nearby_ids_inexact(&self, pos: &[f64; D], r: f64) -> Vec<AgentId> {
        let bucket_r = (r / self.spacing).ceil();
        let mut out = Vec::new();
        self.lattice
            .for_each_within(&self.bucket_of(pos), bucket_r, |b| {
                out.extend_from_slice(&self.buckets[self.lattice.flat(&b)]);
            });
        out
    }

    /// IDs currently indexed in the same bucket as `pos`.
    pub fn ids_in_bucket(&self, pos: &[f64; D]) -> &[AgentId] {
        &self.buckets[self.lattice.flat(&self.bucket_of(pos))]
    }
}

// ── Space impl ────────────────────────────────────────────────────────────────

impl<const D: usize> crate::Space for ContinuousSpace<D> {
    type Pos = [f64; D];

    fn canonicalize(&self, pos: &[f64; D]) -> SpaceResult<[f64; D]> {
        self.wrap(pos)
    }

    fn insert(&mut self, id: AgentId, pos: &[f64; D]) -> SpaceResult<()> {
        let idx = self.lattice.flat(&self.bucket_of(pos));
        self.buckets[idx].push(id);
        Ok(())
    }

    fn delete(&mut self, id: AgentId, pos: &[f64; D]) {
        let idx = self.lattice.flat(&self.bucket_of(pos));
        if let Some(slot) = self.buckets[idx].iter().position(|&x| x == id) {
            self.buckets[idx].swap_remove(slot);
        }
    }

    fn relocate(&mut self, id: AgentId, from: &[f64; D], to: &[f64; D]) -> SpaceResult<()> {
        let from_idx = self.lattice.flat(&self.bucket_of(from));
        let to_idx = self.lattice.flat(&self.bucket_of(to));
        if from_idx == to_idx {
            return Ok(());
        }
        if let Some(slot) = self.buckets[from_idx].iter().position(|&x| x == id) {
            self.buckets[from_idx].swap_remove(slot);
        }
        self.buckets[to_idx].push(id);
        Ok(())
    }

    fn random_pos(&self, rng: &mut ModelRng) -> [f64; D] {
        let mut pos = [0.0; D];
        for d in 0..D {
            pos[d] = rng.gen_range(0.0..self.extent[d]);
        }
        pos
    }
}

// ── Velocity & collision math ─────────────────────────────────────────────────

/// Sample a direction uniformly on the unit hypersphere.
///
/// The 2-D and 3-D cases use `rand_distr`'s `UnitCircle`/`UnitSphere`
/// directly; higher dimensions normalize a vector of `StandardNormal`
/// components.  For `D == 1` this degenerates to ±1.
pub fn random_direction<const D: usize>(rng: &mut ModelRng) -> [f64; D] {
    use rand_distr::{Distribution, StandardNormal, UnitCircle, UnitSphere};

    let mut v = [0.0; D];
    match D {
        0 => {}
        1 => v[0] = if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
        2 => {
            let p: [f64; 2] = UnitCircle.sample(rng.inner());
            v.copy_from_slice(&p);
        }
        3 => {
            let p: [f64; 3] = UnitSphere.sample(rng.inner());
            v.copy_from_slice(&p);
        }
        _ => loop {
            let mut norm_sq = 0.0;
            for x in v.iter_mut() {
                *x = StandardNormal.sample(rng.inner());
                norm_sq += *x * *x;
            }
            if norm_sq > f64::EPSILON {
                let norm = norm_sq.sqrt();
                for x in v.iter_mut() {
                    *x /= norm;
                }
                break;
            }
        },
    }
    v
}

/// Direction from a polar angle (2-D).
pub fn direction_from_polar(theta: f64) -> [f64; 2] {
    [theta.cos(), theta.sin()]
}

/// Direction from polar + azimuthal angles (3-D, physics convention).
pub fn direction_from_angles(polar: f64, azimuthal: f64) -> [f64; 3] {
    [
        polar.sin() * azimuthal.cos(),
        polar.sin() * azimuthal.sin(),
        polar.cos(),
    ]
}

/// Outcome of [`elastic_collision`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision<const D: usize> {
    pub vel_a: [f64; D],
    pub vel_b: [f64; D],
}

/// Classical elastic collision resolved 1-D along the centerline.
///
/// `rel` is the minimum-image displacement from `a` to `b`.  Returns `None`
/// when the pair is separating (no collision) or coincident; an infinite mass
/// pins that body and reflects the other.  Both masses infinite is a no-op.
pub fn elastic_collision<const D: usize>(
    rel:    [f64; D],
    vel_a:  [f64; D],
    vel_b:  [f64; D],
    mass_a: f64,
    mass_b: f64,
) -> Option<Collision<D>> {
    let dist_sq: f64 = rel.iter().map(|x| x * x).sum();
    if dist_sq <= f64::EPSILON {
        return None;
    }
    // Relative velocity of b as seen from a, projected on the centerline.
    let mut dv = [0.0; D];
    for d in 0..D {
        dv[d] = vel_b[d] - vel_a[d];
    }
    let approach: f64 = (0..D).map(|d| dv[d] * rel[d]).sum();
    if approach >= 0.0 {
        // Separating or tangent: no collision.
        return None;
    }

    let inf_a = mass_a.is_infinite();
    let inf_b = mass_b.is_infinite();
    if inf_a && inf_b {
        return None;
    }

    // n = unit centerline; exchange the normal velocity components.
    let dist = dist_sq.sqrt();
    let mut n = [0.0; D];
    for d in 0..D {
        n[d] = rel[d] / dist;
    }
    let va_n: f64 = (0..D).map(|d| vel_a[d] * n[d]).sum();
    let vb_n: f64 = (0..D).map(|d| vel_b[d] * n[d]).sum();

    let (va_n_new, vb_n_new) = if inf_a {
        (va_n, 2.0 * va_n - vb_n)
    } else if inf_b {
        (2.0 * vb_n - va_n, vb_n)
    } else {
        let total = mass_a + mass_b;
        (
            (va_n * (mass_a - mass_b) + 2.0 * mass_b * vb_n) / total,
            (vb_n * (mass_b - mass_a) + 2.0 * mass_a * va_n) / total,
        )
    };

    let mut out_a = vel_a;
    let mut out_b = vel_b;
    for d in 0..D {
        out_a[d] += (va_n_new - va_n) * n[d];
        out_b[d] += (vb_n_new - vb_n) * n[d];
    }
    Some(Collision { vel_a: out_a, vel_b: out_b })
}
