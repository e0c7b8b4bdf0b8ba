//! Unit tests for abm-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, EdgeId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn ordering() {
        assert!(AgentId(1) < AgentId(2));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn empty_sentinel_is_zero() {
        assert_eq!(AgentId::EMPTY.0, 0);
        assert!(!AgentId::EMPTY.is_live());
        assert!(AgentId::FIRST.is_live());
        assert_eq!(AgentId::FIRST, AgentId::EMPTY.next());
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::Tick;

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(Tick(15).since(Tick(10)), 5);
    }

    #[test]
    fn add_assign() {
        let mut t = Tick::ZERO;
        t += 1;
        t += 2;
        assert_eq!(t, Tick(3));
    }

    #[test]
    fn display() {
        assert_eq!(Tick(12).to_string(), "T12");
    }
}

#[cfg(test)]
mod rng {
    use crate::ModelRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = ModelRng::seeded(12345);
        let mut r2 = ModelRng::seeded(12345);
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn children_diverge() {
        let mut root = ModelRng::seeded(1);
        let mut c0 = root.child(0);
        let mut c1 = root.child(1);
        let a: u64 = c0.random();
        let b: u64 = c1.random();
        assert_ne!(a, b, "sibling children should diverge");
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = ModelRng::seeded(0);
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f64..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = ModelRng::seeded(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn shuffle_is_permutation() {
        let mut rng = ModelRng::seeded(7);
        let mut v: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut v);
        let mut sorted = v.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn standard_normal_samples_are_finite() {
        let mut rng = ModelRng::seeded(3);
        for _ in 0..1000 {
            let x: f64 = rng.sample(rand_distr::StandardNormal);
            assert!(x.is_finite());
        }
    }
}
