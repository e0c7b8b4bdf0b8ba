//! `Lattice<D>` — shared d-dimensional cell geometry.
//!
//! Both grid variants and the continuous space's bucket overlay need the same
//! machinery: row-major flat indexing, per-dimension periodic wrapping, and a
//! memoized table of neighborhood offsets per query radius.  `Lattice` owns
//! all of it so each space only stores its cell payloads.
//!
//! # Offset cache
//!
//! For a query of radius `r`, the set of offsets `o` with
//! `metric_distance(o, origin) ≤ r` depends only on `(metric, r)`.  The
//! lattice computes that set once, keyed by the radius bit-pattern (so
//! `:euclidean` queries with real radii memoize exactly), and hands out
//! `Arc` clones.  The cache lives behind a `RefCell`: queries take `&self`,
//! models are single-threaded within a step, and `Arc` keeps the lattice
//! `Send` for ensemble workers.

use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

// ── Metric ────────────────────────────────────────────────────────────────────

/// Distance metric for grid neighborhoods, fixed at space construction.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// `max_i |Δ_i|` — square (Moore) neighborhoods.
    Chebyshev,
    /// `Σ_i |Δ_i|` — diamond (Von-Neumann) neighborhoods.
    Manhattan,
    /// `sqrt(Σ_i Δ_i²)` — ball neighborhoods; accepts real radii.
    Euclidean,
}

impl Metric {
    /// `true` if the offset lies within radius `r` of the origin.
    #[inline]
    pub fn within<const D: usize>(self, off: &[i32; D], r: f64) -> bool {
        match self {
            Metric::Chebyshev => off.iter().map(|o| o.abs()).max().unwrap_or(0) as f64 <= r,
            Metric::Manhattan => off.iter().map(|o| o.abs() as i64).sum::<i64>() as f64 <= r,
            Metric::Euclidean => {
                off.iter().map(|o| (*o as f64) * (*o as f64)).sum::<f64>() <= r * r
            }
        }
    }

    /// Metric distance between two raw deltas (no wrapping).
    #[inline]
    pub fn length<const D: usize>(self, delta: &[i32; D]) -> f64 {
        match self {
            Metric::Chebyshev => delta.iter().map(|o| o.abs()).max().unwrap_or(0) as f64,
            Metric::Manhattan => delta.iter().map(|o| o.abs() as i64).sum::<i64>() as f64,
            Metric::Euclidean => delta
                .iter()
                .map(|o| (*o as f64) * (*o as f64))
                .sum::<f64>()
                .sqrt(),
        }
    }
}

// ── Lattice ───────────────────────────────────────────────────────────────────

/// Row-major d-dimensional cell geometry with per-dimension periodicity.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "[usize; D]: serde::Serialize, [bool; D]: serde::Serialize",
    deserialize = "[usize; D]: serde::Deserialize<'de>, [bool; D]: serde::Deserialize<'de>"
)))]
pub struct Lattice<const D: usize> {
    dims:     [usize; D],
    periodic: [bool; D],
    strides:  [usize; D],
    len:      usize,
    metric:   Metric,

    /// Offsets-within-radius memo, keyed by `f64::to_bits(r)`.
    #[cfg_attr(feature = "serde", serde(skip, default))]
    offsets: RefCell<FxHashMap<u64, Arc<Vec<[i32; D]>>>>,
}

impl<const D: usize> Lattice<D> {
    /// Construct a lattice; row-major strides (last dimension fastest).
    pub fn new(dims: [usize; D], periodic: [bool; D], metric: Metric) -> Self {
        let mut strides = [1usize; D];
        for d in (0..D.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * dims[d + 1];
        }
        let len = dims.iter().product();
        Self {
            dims,
            periodic,
            strides,
            len,
            metric,
            offsets: RefCell::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn dims(&self) -> [usize; D] {
        self.dims
    }

    #[inline]
    pub fn periodic(&self) -> [bool; D] {
        self.periodic
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Total cell count.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flat index of a canonical (in-bounds) position.
    #[inline]
    pub fn flat(&self, pos: &[i32; D]) -> usize {
        let mut idx = 0usize;
        for d in 0..D {
            debug_assert!((0..self.dims[d] as i32).contains(&pos[d]));
            idx += pos[d] as usize * self.strides[d];
        }
        idx
    }

    /// Wrap periodic coordinates into range; `None` if a bounded coordinate
    /// falls outside the lattice.
    #[inline]
    pub fn canonicalize(&self, pos: &[i32; D]) -> Option<[i32; D]> {
        let mut out = *pos;
        for d in 0..D {
            let n = self.dims[d] as i32;
            if self.periodic[d] {
                out[d] = pos[d].rem_euclid(n);
            } else if !(0..n).contains(&pos[d]) {
                return None;
            }
        }
        Some(out)
    }

    /// All positions in row-major order.
    pub fn iter_positions(&self) -> impl Iterator<Item = [i32; D]> + '_ {
        (0..self.len).map(|mut idx| {
            let mut pos = [0i32; D];
            for d in 0..D {
                pos[d] = (idx / self.strides[d]) as i32;
                idx %= self.strides[d];
            }
            pos
        })
    }

    /// Per-dimension delta from `a` to `b`, shortest-way on periodic dims.
    #[inline]
    pub fn wrapped_delta(&self, a: &[i32; D], b: &[i32; D]) -> [i32; D] {
        let mut delta = [0i32; D];
        for d in 0..D {
            let n = self.dims[d] as i32;
            let mut dd = b[d] - a[d];
            if self.periodic[d] {
                if dd > n / 2 {
                    dd -= n;
                } else if dd < -(n / 2) {
                    dd += n;
                }
            }
            delta[d] = dd;
        }
        delta
    }

    /// Metric distance between two positions, honoring periodicity.
    pub fn distance(&self, a: &[i32; D], b: &[i32; D]) -> f64 {
        self.metric.length(&self.wrapped_delta(a, b))
    }

    // ── Offset cache ──────────────────────────────────────────────────────

    /// All offsets (origin included) whose metric length is ≤ `r`, sorted by
    /// length then lexicographically for deterministic iteration.
    ///
    /// Grow-on-demand: the first query at a given radius computes and
    /// memoizes; later queries clone an `Arc`.
    pub fn offsets_within(&self, r: f64) -> Arc<Vec<[i32; D]>> {
        let key = r.to_bits();
        if let Some(hit) = self.offsets.borrow().get(&key) {
            return Arc::clone(hit);
        }
        let computed = Arc::new(self.compute_offsets(r));
        self.offsets
            .borrow_mut()
            .insert(key, Arc::clone(&computed));
        computed
    }

    fn compute_offsets(&self, r: f64) -> Vec<[i32; D]> {
        let reach = r.floor().max(0.0) as i32;
        let mut out: Vec<[i32; D]> = Vec::new();
        let mut cursor = [-reach; D];
        loop {
            if self.metric.within(&cursor, r) {
                out.push(cursor);
            }
            // Odometer increment over the bounding cube.
            let mut d = D;
            loop {
                if d == 0 {
                    let mut keyed: Vec<([i32; D], f64)> =
                        out.into_iter().map(|o| (o, self.metric.length(&o))).collect();
                    keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.cmp(&b.0)));
                    return keyed.into_iter().map(|(o, _)| o).collect();
                }
                d -= 1;
                if cursor[d] < reach {
                    cursor[d] += 1;
                    for c in cursor.iter_mut().skip(d + 1) {
                        *c = -reach;
                    }
                    break;
                }
            }
        }
    }

    /// `true` if every offset of length ≤ `r` applied to `pos` stays strictly
    /// inside the lattice, so neither wrapping nor bounds checks are needed.
    #[inline]
    pub fn interior(&self, pos: &[i32; D], r: f64) -> bool {
        let reach = r.ceil() as i32;
        (0..D).all(|d| pos[d] >= reach && pos[d] + reach < self.dims[d] as i32)
    }

    /// Apply the cached offsets to `pos`, pushing each reachable canonical
    /// position through `emit`.  `pos` itself is emitted (zero offset) —
    /// callers wanting strict neighbors filter it out.
    pub fn for_each_within<F: FnMut([i32; D])>(&self, pos: &[i32; D], r: f64, mut emit: F) {
        let offsets = self.offsets_within(r);
        if self.interior(pos, r) {
            // Interior fast path: every offset lands in-bounds unchanged.
            for off in offsets.iter() {
                let mut p = *pos;
                for d in 0..D {
                    p[d] += off[d];
                }
                emit(p);
            }
        } else {
            // A periodic dimension shorter than the offset span makes distinct
            // offsets alias the same cell; dedup only in that case.
            let reach = r.floor().max(0.0) as i32;
            let aliasing = (0..D)
                .any(|d| self.periodic[d] && 2 * reach + 1 > self.dims[d] as i32);
            let mut seen = if aliasing {
                Some(rustc_hash::FxHashSet::with_capacity_and_hasher(
                    offsets.len(),
                    Default::default(),
                ))
            } else {
                None
            };
            for off in offsets.iter() {
                let mut p = *pos;
                for d in 0..D {
                    p[d] += off[d];
                }
                if let Some(c) = self.canonicalize(&p) {
                    if let Some(seen) = seen.as_mut() {
                        if !seen.insert(c) {
                            continue;
                        }
                    }
                    emit(c);
                }
            }
        }
    }
}

impl<const D: usize> PartialEq for Lattice<D> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims
            && self.periodic == other.periodic
            && self.metric == other.metric
    }
}
