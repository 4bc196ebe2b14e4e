//! Sampling and ranking orchestration
//!
//! A run expands the seed accounts two hops deep, bounded by the per-level
//! fan-out limit, assembles the sampled follow graph and ranks it with
//! personalized PageRank restarting at the seeds.

use crate::config::RankingParameters;
use crate::directory::{FollowDirectory, Profile, ProfileDirectory};
use crate::graph::{CompressedGraph, GraphBuilder};
use crate::rank::RankSolver;
use crate::ranking::status::{Phase, StatusHandle};
use crate::ranking::RankedAccount;
use crate::selection::SelectionAccumulator;
use anyhow::Result;
use log::Level;
use std::collections::{HashMap, HashSet};

/// Per-run state shared by the phases
#[derive(Debug, Default)]
struct RunState {
    /// Every profile seen during the run, keyed by id
    profiles: HashMap<String, Profile>,

    /// Unfiltered follow lists of every account fetched during the run
    follows: HashMap<String, Vec<String>>,
}

/// Outcome of expanding the seeds
struct FirstLevel {
    seeds: Vec<String>,
    selected: Vec<String>,
    candidates: Vec<String>,
}

/// Outcome of expanding the first level
struct SecondLevel {
    selected: Vec<String>,
    candidates: Vec<String>,
}

/// Creates rankings of accounts relevant to a set of seed accounts
pub struct RankingCreator<P, F> {
    profiles: P,
    follows: F,
    solver: RankSolver,
    status: StatusHandle,
}

impl<P: ProfileDirectory, F: FollowDirectory> RankingCreator<P, F> {
    pub fn new(profiles: P, follows: F) -> Self {
        Self {
            profiles,
            follows,
            solver: RankSolver::default(),
            status: StatusHandle::new(),
        }
    }

    /// Use a solver other than the default (damping 0.8, 100 iterations)
    pub fn with_solver(mut self, solver: RankSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Handle for polling progress from another thread
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Run a ranking.
    ///
    /// The status always ends in `Completed`, whether or not the run succeeds.
    pub fn create(&self, params: &RankingParameters) -> Result<Vec<RankedAccount>> {
        self.status.reset();

        let result = self.run(params);
        if let Err(e) = &result {
            log::error!("Ranking failed: {:#}", e);
            self.status.change_phase(Phase::Completed, 0);
        }
        result
    }

    fn run(&self, params: &RankingParameters) -> Result<Vec<RankedAccount>> {
        let mut state = RunState::default();

        let first_level = self.select_first_level(params, &mut state)?;
        let second_level = self.select_second_level(params, &mut state, &first_level);
        let graph =
            self.fetch_second_level_follows(params, &mut state, &first_level, &second_level);

        log::info!(
            "Ranking follow graph with {} nodes and {} edges ({} bytes)",
            graph.node_count,
            graph.edge_count(),
            graph.memory_usage()
        );
        let ranks = self.solver.calculate(&graph)?;

        // Accounts without a known profile cannot be reported
        let mut ranked: Vec<RankedAccount> = graph
            .node_ids
            .iter()
            .zip(ranks)
            .filter_map(|(id, score)| {
                state.profiles.get(id).map(|profile| RankedAccount {
                    profile: profile.clone(),
                    score,
                })
            })
            .collect();
        self.status.change_phase(Phase::Completed, 0);

        // Never recommend the caller, nor by default anyone they already follow
        let mut excluded: HashSet<String> = HashSet::new();
        excluded.insert(params.self_id.clone());
        if !params.include_own_follows {
            self.log_fetch(params, &params.self_id);
            excluded.extend(
                self.follows
                    .fetch_follows(&params.self_id)
                    .into_iter()
                    .map(|p| p.id),
            );
        }

        // Highest scores first, then cut to the requested size
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.retain(|account| !excluded.contains(&account.profile.id));
        ranked.truncate(params.result_limit);

        self.hydrate_profiles(&mut ranked)?;

        log::info!("Ranked {} accounts", ranked.len());
        Ok(ranked)
    }

    /// Resolve the seeds and pick the most followed accounts among their follows
    fn select_first_level(
        &self,
        params: &RankingParameters,
        state: &mut RunState,
    ) -> Result<FirstLevel> {
        log::info!("Phase: {}", Phase::SelectFirstLevel);
        log::log!(
            self.fetch_log_level(params),
            "Fetching profiles of {:?}",
            params.seed_identifiers
        );

        // Identifiers may be handles; the same account may be named twice
        let seed_profiles = self.profiles.resolve_profiles(&params.seed_identifiers)?;
        let mut seeds: Vec<String> = Vec::with_capacity(seed_profiles.len());
        for profile in seed_profiles {
            if !state.profiles.contains_key(&profile.id) {
                seeds.push(profile.id.clone());
            }
            state.profiles.insert(profile.id.clone(), profile);
        }
        log::info!("Resolved {} seed accounts", seeds.len());

        let mut accumulator = SelectionAccumulator::new(seeds.iter().cloned().collect());
        for seed in &seeds {
            let follows = self.fetch_follows(params, state, seed);
            // Listings lack follower counts, which the tie-break needs
            let follow_ids: Vec<String> = follows.into_iter().map(|p| p.id).collect();
            let followed_profiles = self.profiles.resolve_profiles(&follow_ids)?;
            accumulator.record(seed, &followed_profiles);
        }

        let selected = accumulator.select(params.per_level_fanout_limit);
        log::info!(
            "Selected {} of {} first level accounts",
            selected.len(),
            accumulator.all_candidates().len()
        );

        Ok(FirstLevel {
            candidates: accumulator.all_candidates().to_vec(),
            seeds,
            selected,
        })
    }

    /// Pick the most followed accounts among the follows of the first level
    fn select_second_level(
        &self,
        params: &RankingParameters,
        state: &mut RunState,
        first_level: &FirstLevel,
    ) -> SecondLevel {
        self.status
            .change_phase(Phase::SelectSecondLevel, first_level.selected.len());
        log::info!("Phase: {}", Phase::SelectSecondLevel);

        // Seeds and first level accounts are already part of the sample
        let excluded: HashSet<String> = first_level
            .seeds
            .iter()
            .chain(&first_level.selected)
            .cloned()
            .collect();
        let mut accumulator = SelectionAccumulator::new(excluded);

        for id in &first_level.selected {
            let follows = self.fetch_follows(params, state, id);
            accumulator.record(id, &follows);
            self.status.fetched();
        }

        let selected = accumulator.select(params.per_level_fanout_limit);
        log::info!(
            "Selected {} of {} second level accounts",
            selected.len(),
            accumulator.all_candidates().len()
        );

        SecondLevel {
            candidates: accumulator.all_candidates().to_vec(),
            selected,
        }
    }

    /// Assemble the sampled graph.
    ///
    /// Seeds and first level accounts contribute all their follows; second
    /// level accounts only contribute follows inside the observed candidate
    /// universe, which bounds growth at the outer fringe.
    fn fetch_second_level_follows(
        &self,
        params: &RankingParameters,
        state: &mut RunState,
        first_level: &FirstLevel,
        second_level: &SecondLevel,
    ) -> CompressedGraph {
        self.status
            .change_phase(Phase::FetchSecondLevelFollows, second_level.selected.len());
        log::info!("Phase: {}", Phase::FetchSecondLevelFollows);

        // Inner accounts keep every follow
        let mut builder = GraphBuilder::new(&first_level.seeds);
        for id in first_level.seeds.iter().chain(&first_level.selected) {
            if let Some(follows) = state.follows.get(id) {
                builder.add_edges(id, follows);
            }
        }

        // Every account observed as a candidate, selected or not
        let universe: HashSet<&str> = first_level
            .seeds
            .iter()
            .chain(&first_level.candidates)
            .chain(&second_level.candidates)
            .map(String::as_str)
            .collect();

        for id in &second_level.selected {
            let follows = self.fetch_follows(params, state, id);
            let inside: Vec<&str> = follows
                .iter()
                .map(|p| p.id.as_str())
                .filter(|followed| universe.contains(followed))
                .collect();
            if !inside.is_empty() {
                builder.add_edges(id, &inside);
            }
            self.status.fetched();
        }

        builder.build()
    }

    /// Fetch follows of `id`, remembering the list and the profiles it carries
    fn fetch_follows(
        &self,
        params: &RankingParameters,
        state: &mut RunState,
        id: &str,
    ) -> Vec<Profile> {
        self.log_fetch(params, id);

        let follows = self.follows.fetch_follows(id);
        state
            .follows
            .insert(id.to_string(), follows.iter().map(|p| p.id.clone()).collect());
        for profile in &follows {
            state.profiles.insert(profile.id.clone(), profile.clone());
        }
        follows
    }

    /// Replace lightweight profiles with fully resolved ones
    fn hydrate_profiles(&self, ranked: &mut [RankedAccount]) -> Result<()> {
        let ids: Vec<String> = ranked.iter().map(|ra| ra.profile.id.clone()).collect();
        let mut details: HashMap<String, Profile> = self
            .profiles
            .resolve_profiles(&ids)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        for account in ranked.iter_mut() {
            if let Some(profile) = details.remove(&account.profile.id) {
                account.profile = profile;
            }
        }
        Ok(())
    }

    fn fetch_log_level(&self, params: &RankingParameters) -> Level {
        if params.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    fn log_fetch(&self, params: &RankingParameters, id: &str) {
        log::log!(self.fetch_log_level(params), "Fetching follows of {}", id);
    }
}
