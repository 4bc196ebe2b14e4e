use follow_rank::cache::NoCache;
use follow_rank::config::{Config, RankingParameters};
use follow_rank::data::MemoryDirectory;
use follow_rank::directory::{
    DirectoryError, FollowsFetcher, Profile, ProfileDirectory, ProfileFetcher, ProfileSource,
};
use follow_rank::rank::RankError;
use follow_rank::ranking::{Phase, RankedAccount, RankingCreator};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

fn fetchers(
    dir: &MemoryDirectory,
) -> (
    ProfileFetcher<&MemoryDirectory>,
    FollowsFetcher<&MemoryDirectory>,
) {
    let config = Config::default();
    (
        ProfileFetcher::new(dir, Box::new(NoCache), &config),
        FollowsFetcher::new(dir, Box::new(NoCache), &config),
    )
}

fn params(seeds: &[&str], fanout: usize, include_own_follows: bool) -> RankingParameters {
    RankingParameters::new(
        "me",
        seeds.iter().map(|s| s.to_string()).collect(),
        100,
        fanout,
        include_own_follows,
        false,
    )
    .unwrap()
}

fn ids(ranked: &[RankedAccount]) -> Vec<&str> {
    ranked.iter().map(|ra| ra.profile.id.as_str()).collect()
}

/// a follows b and c, both follow a back
fn triangle() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new();
    dir.add_profile(Profile::new("a", "alice").with_follower_count(2));
    dir.add_profile(Profile::new("b", "bob").with_follower_count(1));
    dir.add_profile(Profile::new("c", "carol").with_follower_count(1));
    dir.add_follows("a", &["b", "c"]);
    dir.add_follows("b", &["a"]);
    dir.add_follows("c", &["a"]);
    dir
}

#[test]
fn seed_with_reciprocal_follows_ranks_highest() {
    let dir = triangle();
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 10, true)).unwrap();

    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].profile.id, "a");
    assert!(ranked[0].score > ranked[1].score);
    let total: f64 = ranked.iter().map(|ra| ra.score).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(creator.status().phase(), Phase::Completed);
}

#[test]
fn seeds_resolve_by_handle() {
    let dir = triangle();
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["alice"], 10, true)).unwrap();

    assert_eq!(ranked[0].profile.handle, "alice");
}

#[test]
fn results_are_hydrated_with_full_profiles() {
    let dir = triangle();
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 10, true)).unwrap();

    // follow listings carry no follower counts; hydration restores them
    assert!(ranked.iter().all(|ra| ra.profile.follower_count.is_some()));
}

#[test]
fn own_follows_and_self_are_excluded() {
    let mut dir = triangle();
    dir.add_follows("me", &["b"]);
    dir.add_follows("a", &["me"]);
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 10, false)).unwrap();
    let found = ids(&ranked);
    assert!(!found.contains(&"b"));
    assert!(!found.contains(&"me"));
    assert!(found.contains(&"c"));

    let ranked = creator.create(&params(&["a"], 10, true)).unwrap();
    let found = ids(&ranked);
    assert!(found.contains(&"b"));
    assert!(!found.contains(&"me"));
}

#[test]
fn result_limit_truncates_by_score() {
    let dir = triangle();
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);
    let mut p = params(&["a"], 10, true);
    p.result_limit = 1;

    let ranked = creator.create(&p).unwrap();

    assert_eq!(ids(&ranked), vec!["a"]);
}

#[test]
fn failing_follow_fetch_is_treated_as_empty() {
    let mut dir = triangle();
    dir.fail_follows_of("b");
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 10, true)).unwrap();

    assert_eq!(ranked.len(), 3);
    let score = |id: &str| ranked.iter().find(|ra| ra.profile.id == id).unwrap().score;
    // b no longer passes rank back to a
    assert!(score("b") > 0.0);
    assert!(score("a") > score("c"));
}

#[test]
fn profile_failure_propagates_and_completes_status() {
    let mut dir = triangle();
    dir.fail_profile("a");
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let err = creator.create(&params(&["a"], 10, true)).unwrap_err();

    assert!(err.downcast_ref::<DirectoryError>().is_some());
    assert_eq!(creator.status().phase(), Phase::Completed);
    assert_eq!(creator.status().percent_complete(), 100.0);
}

#[test]
fn first_level_ties_favour_accounts_with_more_followers() {
    // a's follow listing puts q first, but p is far more followed
    let mut dir = MemoryDirectory::new();
    dir.add_profile(Profile::new("p", "popular").with_follower_count(100));
    dir.add_profile(Profile::new("q", "quiet").with_follower_count(1));
    dir.add_follows("a", &["q", "p"]);
    dir.add_follows("p", &["x"]);
    dir.add_follows("q", &["y"]);
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 1, true)).unwrap();
    let found: HashSet<&str> = ids(&ranked).into_iter().collect();

    // only p is expanded, so only its follows reach the graph
    assert!(found.contains("x"));
    assert!(!found.contains("y"));
    assert_eq!(found, ["a", "p", "q", "x"].into_iter().collect());
}

/// Profile directory whose `fail_on`-th request fails
struct FailingCall<'a> {
    inner: &'a MemoryDirectory,
    calls: AtomicUsize,
    fail_on: usize,
}

impl ProfileDirectory for FailingCall<'_> {
    fn resolve_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(DirectoryError::Request(format!("call {call} refused")));
        }
        self.inner.get_profiles(identifiers)
    }
}

#[test]
fn hydration_failure_after_completion_keeps_status_completed() {
    let dir = triangle();
    // seeds, then a's follows, then the final hydration
    let profiles = FailingCall {
        inner: &dir,
        calls: AtomicUsize::new(0),
        fail_on: 3,
    };
    let (_, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);
    let status = creator.status();

    let (result, phases) = std::thread::scope(|s| {
        let poller = s.spawn(move || {
            let mut phases = Vec::new();
            loop {
                let phase = status.phase();
                phases.push(phase);
                if phase == Phase::Completed {
                    return phases;
                }
                std::thread::yield_now();
            }
        });
        let result = creator.create(&params(&["a"], 10, true));
        (result, poller.join().unwrap())
    });

    assert!(result.is_err());
    assert_eq!(profiles.calls.load(Ordering::SeqCst), 3);
    assert_eq!(creator.status().phase(), Phase::Completed);
    assert_eq!(creator.status().percent_complete(), 100.0);
    assert!(phases.windows(2).all(|w| w[0] <= w[1]), "{phases:?}");
}

#[test]
fn unknown_seeds_fail_with_empty_seed_set() {
    let dir = triangle();
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let err = creator.create(&params(&["nobody"], 10, true)).unwrap_err();

    assert_eq!(err.downcast_ref::<RankError>(), Some(&RankError::EmptySeedSet));
    assert!(creator.status().is_completed());
}

/// Profile directory that cannot resolve some accounts
struct HidingDirectory<'a> {
    inner: &'a MemoryDirectory,
    hidden: HashSet<String>,
}

impl ProfileDirectory for HidingDirectory<'_> {
    fn resolve_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        Ok(self
            .inner
            .get_profiles(identifiers)?
            .into_iter()
            .filter(|p| !self.hidden.contains(&p.id))
            .collect())
    }
}

#[test]
fn inner_fringe_edges_are_unfiltered_outer_fringe_edges_are_filtered() {
    // a -> f -> {s, t}; fan-out 1 selects f, then s (first in f's list)
    // s follows a, t and far; far was never observed as a candidate
    // a also follows ghost, whose profile cannot be resolved
    let mut dir = MemoryDirectory::new();
    dir.add_follows("a", &["f", "ghost"]);
    dir.add_follows("f", &["s", "t"]);
    dir.add_follows("s", &["a", "t", "far"]);
    dir.add_follows("t", &["far"]);

    let profiles = HidingDirectory {
        inner: &dir,
        hidden: ["ghost".to_string()].into_iter().collect(),
    };
    let (_, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);

    let ranked = creator.create(&params(&["a"], 1, true)).unwrap();
    let found: HashSet<&str> = ids(&ranked).into_iter().collect();

    // ghost enters the graph through the seed's unfiltered follow list
    assert!(found.contains("ghost"));
    // far is only reachable through a second level account and is filtered out
    assert!(!found.contains("far"));
    assert_eq!(found, ["a", "f", "s", "t", "ghost"].into_iter().collect());
}

#[test]
fn progress_is_monotonic_while_polled() {
    let mut dir = MemoryDirectory::new();
    for i in 0..30 {
        let targets: Vec<String> = (0..10).map(|j| format!("n{}", (i * 3 + j) % 40)).collect();
        dir.add_follows(&format!("n{i}"), &targets);
    }
    let (profiles, follows) = fetchers(&dir);
    let creator = RankingCreator::new(&profiles, &follows);
    let status = creator.status();

    let (ranked, seen) = std::thread::scope(|s| {
        let poller = s.spawn(move || {
            let mut seen = Vec::new();
            loop {
                seen.push(status.percent_complete());
                if status.is_completed() {
                    return seen;
                }
                std::thread::yield_now();
            }
        });
        let ranked = creator.create(&params(&["n0"], 5, true));
        (ranked, poller.join().unwrap())
    });

    assert!(!ranked.unwrap().is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(seen.last(), Some(&100.0));
}
