//! Most-followed account selection
//!
//! Counts how many recorded sources follow each candidate and keeps a
//! bounded top set. Ties straddling the cutoff are resolved round-robin over
//! the sources, each source offering its border candidates in descending
//! follower-count order, so the outcome depends only on recording order.

use crate::directory::Profile;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct SelectionAccumulator {
    /// Accounts never counted as candidates
    excluded: HashSet<String>,

    /// Number of sources following each candidate
    counts: HashMap<String, usize>,

    /// Candidates in first-observed order
    candidates: Vec<String>,

    /// Accepted follows per source, by descending follower count
    source_follows: Vec<(String, Vec<String>)>,

    /// Position of each source in `source_follows`
    source_positions: HashMap<String, usize>,
}

impl SelectionAccumulator {
    pub fn new(excluded: HashSet<String>) -> Self {
        Self {
            excluded,
            ..Self::default()
        }
    }

    /// Record the accounts followed by `source_id`.
    ///
    /// Recording the same source again appends to its list.
    pub fn record(&mut self, source_id: &str, followed: &[Profile]) {
        let accepted: Vec<&Profile> = followed
            .iter()
            .filter(|p| !self.excluded.contains(&p.id))
            .collect();

        // Tally candidates, remembering first-seen order
        for profile in &accepted {
            match self.counts.get_mut(&profile.id) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(profile.id.clone(), 1);
                    self.candidates.push(profile.id.clone());
                }
            }
        }

        // Stable sort keeps listing order among equal follower counts
        let sorted: Vec<String> = accepted
            .into_iter()
            .sorted_by_key(|p| Reverse(p.follower_count.unwrap_or(0)))
            .map(|p| p.id.clone())
            .collect();

        match self.source_positions.get(source_id) {
            Some(&pos) => self.source_follows[pos].1.extend(sorted),
            None => {
                self.source_positions
                    .insert(source_id.to_string(), self.source_follows.len());
                self.source_follows.push((source_id.to_string(), sorted));
            }
        }
    }

    /// Select at most `limit` candidates with the highest counts
    pub fn select(&self, limit: usize) -> Vec<String> {
        if self.candidates.len() <= limit {
            return self.candidates.clone();
        }
        if limit == 0 {
            return Vec::new();
        }

        let ranked: Vec<(&str, usize)> = self
            .candidates
            .iter()
            .map(|id| (id.as_str(), self.counts[id]))
            .sorted_by_key(|&(_, count)| Reverse(count))
            .collect();

        // Cutoff falls between two different counts
        if ranked[limit - 1].1 != ranked[limit].1 {
            return ranked[..limit]
                .iter()
                .map(|&(id, _)| id.to_string())
                .collect();
        }

        // Everything above the border is in; border candidates compete
        let border_count = ranked[limit].1;
        let mut selected: Vec<String> = ranked
            .iter()
            .filter(|&&(_, count)| count > border_count)
            .map(|&(id, _)| id.to_string())
            .collect();
        let on_border: HashSet<&str> = ranked
            .iter()
            .filter(|&&(_, count)| count == border_count)
            .map(|&(id, _)| id)
            .collect();

        // Each source's border candidates, best followed first
        let border_follows: Vec<Vec<&str>> = self
            .source_follows
            .iter()
            .map(|(_, follows)| {
                follows
                    .iter()
                    .map(String::as_str)
                    .filter(|id| on_border.contains(id))
                    .collect()
            })
            .collect();
        let longest = border_follows.iter().map(Vec::len).max().unwrap_or(0);

        // Take one candidate per source per round
        let mut picked: HashSet<&str> = HashSet::new();
        'positions: for position in 0..longest {
            for follows in &border_follows {
                if selected.len() >= limit {
                    break 'positions;
                }
                if let Some(&id) = follows.get(position) {
                    if picked.insert(id) {
                        selected.push(id.to_string());
                    }
                }
            }
        }

        selected
    }

    /// Every candidate observed so far, selected or not
    pub fn all_candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Number of recorded sources following `id`
    pub fn count_of(&self, id: &str) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }
}
