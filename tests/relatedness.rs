use greenrel::{
    cosine_similarity, sourced_pagerank, sourced_pagerank_run, Error, PageRankConfig, Relatedness,
    RelatednessConfig, SolveMode, SolverConfig, SourceSet, TransitionGraph, WeightedGraphRef,
    WikiGraph,
};
use proptest::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn graph(adj: Vec<Vec<usize>>) -> WikiGraph {
    WikiGraph::from_adjacency(adj, PageRankConfig::default()).unwrap()
}

fn cycle4() -> WikiGraph {
    graph(vec![vec![1], vec![2], vec![3], vec![0]])
}

/// Hub 0 links to leaves 1..=4; leaves are dangling.
fn star5() -> WikiGraph {
    graph(vec![vec![1, 2, 3, 4], vec![], vec![], vec![], vec![]])
}

fn random_graph(n: usize, max_out: usize, seed: u64) -> WikiGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let adj = (0..n)
        .map(|_| {
            let deg = rng.random_range(0..=max_out);
            (0..deg).map(|_| rng.random_range(0..n)).collect()
        })
        .collect();
    graph(adj)
}

fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{a} vs {b} (tol={tol})");
}

#[test]
fn approximate_converges_on_cycle_and_star() {
    for g in [cycle4(), star5()] {
        for from in 0..g.node_count() {
            let run = sourced_pagerank_run(
                &g,
                &SourceSet::single(from),
                SolveMode::Approximate,
                SolverConfig::default(),
            )
            .unwrap();
            assert!(run.converged, "from={from} change={}", run.change);
            assert!(run.iterations < 100, "iterations={}", run.iterations);
            assert!(run.scores.iter().all(|s| s.is_finite()));
        }
    }
}

#[test]
fn approximate_mass_settles_to_one() {
    let tight = SolverConfig { tolerance: 1e-8, ..SolverConfig::default() };
    let tighter = SolverConfig { tolerance: 1e-10, ..SolverConfig::default() };
    for g in [cycle4(), star5(), random_graph(30, 4, 11)] {
        let a = sourced_pagerank_run(&g, &SourceSet::single(0), SolveMode::Approximate, tight).unwrap();
        let b = sourced_pagerank_run(&g, &SourceSet::single(0), SolveMode::Approximate, tighter).unwrap();
        assert!(a.converged && b.converged);
        assert!(b.iterations > a.iterations);
        assert_close(a.mass, b.mass, 1e-5);
        assert_close(b.mass, 1.0, 1e-4);
    }
}

#[test]
fn exact_mode_on_periodic_cycle_reports_best_effort() {
    let g = cycle4();
    let cfg = SolverConfig { max_iterations: 200, ..SolverConfig::default() };
    let run = sourced_pagerank_run(&g, &SourceSet::single(0), SolveMode::Exact, cfg).unwrap();
    assert!(!run.converged);
    assert_eq!(run.iterations, 200);

    match sourced_pagerank(&g, &SourceSet::single(0), SolveMode::Exact, cfg) {
        Err(Error::NotConverged { iterations, change, scores }) => {
            assert_eq!(iterations, 200);
            assert_eq!(change, run.change);
            assert_eq!(scores, run.scores);
        }
        other => panic!("expected NotConverged, got {other:?}"),
    }
}

#[test]
fn exact_and_approximate_agree_in_direction() {
    // Complete graph on 4 vertices: aperiodic, so the undamped iteration converges too.
    let g = graph((0..4).map(|i| (0..4).filter(|&j| j != i).collect()).collect());
    let exact = sourced_pagerank(&g, &SourceSet::single(2), SolveMode::Exact, SolverConfig::default())
        .unwrap();
    let approx =
        sourced_pagerank(&g, &SourceSet::single(2), SolveMode::Approximate, SolverConfig::default())
            .unwrap();
    assert!(cosine_similarity(&exact, &approx) > 0.5);
    let best = |d: &[f64]| {
        d.iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    };
    assert_eq!(best(&exact), Some(2));
    assert_eq!(best(&approx), Some(2));
}

#[test]
fn star_leaves_relate_to_hub_more_than_to_each_other() {
    let mut rel = Relatedness::new(star5());
    let hub_leaf = rel.pairwise(0, 1).unwrap();
    let leaf_leaf = rel.pairwise(1, 2).unwrap();
    assert!(hub_leaf > leaf_leaf, "hub_leaf={hub_leaf} leaf_leaf={leaf_leaf}");
    // Leaves are interchangeable.
    assert_close(rel.pairwise(3, 4).unwrap(), leaf_leaf, 1e-9);
}

#[test]
fn pairwise_many_matches_individual_queries() {
    let g = random_graph(40, 5, 3);
    let targets = [1usize, 7, 13, 22, 39];

    let mut batched = Relatedness::new(g.clone());
    let many = batched.pairwise_many(5, &targets).unwrap();
    assert_eq!(batched.cached_source(), Some(5));

    for (&to, &r) in targets.iter().zip(&many) {
        let mut fresh = Relatedness::new(g.clone());
        assert_eq!(fresh.pairwise(5, to).unwrap(), r);
    }
}

#[test]
fn configured_pairwise_mode_is_used_without_leaking() {
    let g = graph((0..4).map(|i| (0..4).filter(|&j| j != i).collect()).collect());
    let cfg = RelatednessConfig { pairwise_mode: SolveMode::Exact, ..RelatednessConfig::default() };
    let mut exact_rel = Relatedness::with_config(g.clone(), cfg).unwrap();
    let mut approx_rel = Relatedness::new(g);

    let exact_score = exact_rel.score(0, 1, SolveMode::Exact).unwrap();
    let before = approx_rel.pairwise(0, 1).unwrap();
    // An exact-mode query in between must not change what the default-mode query returns.
    approx_rel.pairwise_with_mode(0, 2, SolveMode::Exact).unwrap();
    let after = approx_rel.pairwise(0, 1).unwrap();
    assert_eq!(before, after);
    assert!(exact_score.is_finite());

    // Multi-source queries stay damped unless configured otherwise.
    let multi = exact_rel.multi_source(&[0, 1]).unwrap();
    let damped = exact_rel
        .distribution(&SourceSet::uniform(&[0, 1]), SolveMode::Approximate)
        .unwrap();
    assert_eq!(multi, damped);
}

#[test]
fn invalid_sources_fail_before_iterating() {
    let rel = Relatedness::new(cycle4());
    assert!(matches!(rel.multi_source(&[]), Err(Error::EmptySources)));
    assert!(matches!(
        rel.multi_source(&[0, 4]),
        Err(Error::IndexOutOfBounds { index: 4, node_count: 4 })
    ));
    assert!(matches!(
        rel.multi_source_weighted(&[(1, f64::INFINITY)]),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn weighted_sources_shift_the_distribution() {
    let g = random_graph(25, 4, 9);
    let rel = Relatedness::new(g);
    let toward_3 = rel.multi_source_weighted(&[(3, 0.9), (17, 0.1)]).unwrap();
    let toward_17 = rel.multi_source_weighted(&[(3, 0.1), (17, 0.9)]).unwrap();
    assert!(toward_3[3] > toward_17[3]);
    assert!(toward_17[17] > toward_3[17]);
}

fn small_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2usize..9).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_approximate_always_converges(adj in small_graph()) {
        let g = graph(adj);
        for from in 0..g.node_count() {
            let run = sourced_pagerank_run(
                &g,
                &SourceSet::single(from),
                SolveMode::Approximate,
                SolverConfig::default(),
            ).unwrap();
            prop_assert!(run.converged, "from={} change={}", from, run.change);
            prop_assert!(run.scores.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn prop_pairwise_symmetric_and_self_is_one(adj in small_graph(), a in 0usize..9, b in 0usize..9) {
        let g = graph(adj);
        let n = g.node_count();
        let (a, b) = (a % n, b % n);
        let mut rel = Relatedness::new(g);

        let ab = rel.pairwise(a, b).unwrap();
        let ba = rel.pairwise(b, a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-9, "ab={} ba={}", ab, ba);
        prop_assert!(ab <= 1.0 + 1e-9 && ab >= -1.0 - 1e-9);

        let aa = rel.pairwise(a, a).unwrap();
        prop_assert!((aa - 1.0).abs() < 1e-9, "aa={}", aa);
    }

    #[test]
    fn prop_cache_is_transparent(adj in small_graph(), a in 0usize..9, x in 0usize..9, y in 0usize..9) {
        let g = graph(adj);
        let n = g.node_count();
        let (a, x, y) = (a % n, x % n, y % n);

        let mut warm = Relatedness::new(g.clone());
        warm.pairwise(a, x).unwrap();
        let cached = warm.pairwise(a, y).unwrap();

        let mut cold = Relatedness::new(g);
        let uncached = cold.pairwise(a, y).unwrap();
        prop_assert_eq!(cached, uncached);
    }

    #[test]
    fn prop_most_related_is_sorted_and_excludes_source(adj in small_graph(), from in 0usize..9) {
        let g = graph(adj);
        let n = g.node_count();
        let from = from % n;
        let mut rel = Relatedness::new(g);
        let top = rel.most_related(from, 3).unwrap();
        prop_assert_eq!(top.len(), 3.min(n - 1));
        prop_assert!(top.iter().all(|&(v, _)| v != from && v < n));
        prop_assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        for &(v, s) in &top {
            prop_assert_eq!(rel.score(from, v, SolveMode::Approximate).unwrap(), s);
        }
    }
}

#[test]
fn global_rank_is_exposed_by_the_graph_store() {
    let g = star5();
    let total: f64 = (0..g.node_count()).map(|v| g.global_rank(v)).sum();
    assert_close(total, 1.0, 1e-6);
    assert_eq!(g.out_degree(0), 4);
    assert_eq!(g.out_degree(3), 0);
}
