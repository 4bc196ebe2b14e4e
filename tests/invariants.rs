use follow_rank::directory::Profile;
use follow_rank::graph::GraphBuilder;
use follow_rank::rank::RankSolver;
use follow_rank::selection::SelectionAccumulator;
use std::collections::HashSet;

/// Small deterministic generator so graphs are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn assert_prob_like(xs: &[f64]) {
    assert!(!xs.is_empty());
    for &x in xs {
        assert!(x.is_finite(), "non-finite score: {x}");
        assert!(x >= 0.0, "negative score: {x}");
    }
    let s: f64 = xs.iter().copied().sum();
    assert!((s - 1.0).abs() <= 1e-9, "sum={s} not ~1");
}

fn random_graph(seed: u64, nodes: u64, seeds: &[&str]) -> follow_rank::graph::CompressedGraph {
    let mut rng = Lcg(seed);
    let mut builder = GraphBuilder::new(seeds);
    for src in 0..nodes {
        let degree = rng.next(6);
        let targets: Vec<String> = (0..degree).map(|_| format!("n{}", rng.next(nodes))).collect();
        builder.add_edges(&format!("n{src}"), &targets);
    }
    builder.build()
}

#[test]
fn ranks_are_a_distribution_for_random_graphs() {
    for seed in 0..10 {
        let graph = random_graph(seed, 60, &["n0", "n1", "n2"]);
        for iterations in [0, 1, 3, 100] {
            let ranks = RankSolver::new(0.8, iterations)
                .unwrap()
                .calculate(&graph)
                .unwrap();
            assert_eq!(ranks.len(), graph.node_count);
            assert_prob_like(&ranks);
        }
    }
}

#[test]
fn single_seed_graph_keeps_all_mass_on_the_seed() {
    let graph = GraphBuilder::new(&["only"]).build();
    let ranks = RankSolver::default().calculate(&graph).unwrap();
    assert_eq!(ranks, vec![1.0]);
}

#[test]
fn graph_indices_follow_first_seen_order() {
    let mut builder = GraphBuilder::new(&["s0", "s1", "s2"]);
    builder.add_edges("x", &["s1", "y", "x", "z"]);
    builder.add_edges("z", &["w"]);

    let graph = builder.build();

    assert_eq!(graph.node_ids, vec!["s0", "s1", "s2", "x", "y", "z", "w"]);
    assert_eq!(graph.seeds, vec![0, 1, 2]);
    for node in 0..graph.node_count {
        for &target in graph.outgoing_edges(node) {
            assert!((target as usize) < graph.node_count);
        }
    }
}

#[test]
fn selection_is_bounded_and_reproducible() {
    let build = |seed: u64| {
        let mut rng = Lcg(seed);
        let mut acc = SelectionAccumulator::new(["c0".to_string()].into_iter().collect());
        for source in 0..12 {
            let follows: Vec<Profile> = (0..rng.next(15))
                .map(|_| {
                    let id = format!("c{}", rng.next(40));
                    Profile::new(id.clone(), id).with_follower_count(rng.next(4))
                })
                .collect();
            acc.record(&format!("s{source}"), &follows);
        }
        acc
    };

    for seed in 0..5 {
        let acc = build(seed);
        let distinct = acc.all_candidates().len();
        assert!(!acc.all_candidates().contains(&"c0".to_string()));

        for limit in [1, 2, 5, 10, 25, 50] {
            let selected = acc.select(limit);
            assert_eq!(selected.len(), limit.min(distinct));
            assert_eq!(selected.iter().collect::<HashSet<_>>().len(), selected.len());
            assert_eq!(selected, build(seed).select(limit));

            // nothing left out may outrank anything selected
            let min_selected = selected.iter().map(|id| acc.count_of(id)).min().unwrap_or(0);
            let chosen: HashSet<&String> = selected.iter().collect();
            for id in acc.all_candidates() {
                if !chosen.contains(id) {
                    assert!(acc.count_of(id) <= min_selected);
                }
            }
        }
    }
}
