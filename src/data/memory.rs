//! In-process follow directory

use crate::directory::{DirectoryError, FollowPage, FollowSource, Profile, ProfileSource};
use std::collections::{HashMap, HashSet};

/// Directory holding profiles and follow lists in memory.
///
/// Identifiers resolve by id first, then by handle. Accounts can be marked as
/// failing to simulate remote errors.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    profiles: HashMap<String, Profile>,
    handle_index: HashMap<String, String>,
    follows: HashMap<String, Vec<String>>,
    failing_follows: HashSet<String>,
    failing_profiles: HashSet<String>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile
    pub fn add_profile(&mut self, profile: Profile) {
        if let Some(old) = self.profiles.get(&profile.id) {
            self.handle_index.remove(&old.handle);
        }
        self.handle_index
            .insert(profile.handle.clone(), profile.id.clone());
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Append follows of `id`; unknown accounts get a profile whose handle is the id
    pub fn add_follows<S: AsRef<str>>(&mut self, id: &str, followed: &[S]) {
        self.ensure_profile(id);
        for target in followed {
            self.ensure_profile(target.as_ref());
        }
        self.follows
            .entry(id.to_string())
            .or_default()
            .extend(followed.iter().map(|s| s.as_ref().to_string()));
    }

    /// Make every follow listing of `id` fail
    pub fn fail_follows_of(&mut self, id: &str) {
        self.failing_follows.insert(id.to_string());
    }

    /// Make every profile request containing `identifier` fail
    pub fn fail_profile(&mut self, identifier: &str) {
        self.failing_profiles.insert(identifier.to_string());
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn account_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn follows_of(&self, id: &str) -> &[String] {
        self.follows.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn ensure_profile(&mut self, id: &str) {
        if !self.profiles.contains_key(id) {
            self.add_profile(Profile::new(id, id));
        }
    }

    fn lookup(&self, identifier: &str) -> Option<&Profile> {
        self.profiles.get(identifier).or_else(|| {
            self.handle_index
                .get(identifier)
                .and_then(|id| self.profiles.get(id))
        })
    }
}

impl ProfileSource for MemoryDirectory {
    fn get_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        if let Some(bad) = identifiers
            .iter()
            .find(|identifier| self.failing_profiles.contains(*identifier))
        {
            return Err(DirectoryError::Request(format!(
                "profile lookup failed for {}",
                bad
            )));
        }

        Ok(identifiers
            .iter()
            .filter_map(|identifier| self.lookup(identifier).cloned())
            .collect())
    }
}

impl FollowSource for MemoryDirectory {
    fn get_follows(
        &self,
        id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<FollowPage, DirectoryError> {
        if self.failing_follows.contains(id) {
            return Err(DirectoryError::Request(format!(
                "follow listing failed for {}",
                id
            )));
        }
        if !self.profiles.contains_key(id) {
            return Err(DirectoryError::NotFound(id.to_string()));
        }

        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| DirectoryError::InvalidCursor(c.to_string()))?,
            None => 0,
        };
        let all = self.follows_of(id);
        let start = start.min(all.len());
        let end = start.saturating_add(limit).min(all.len());

        let follows = all[start..end]
            .iter()
            .filter_map(|target| self.profiles.get(target))
            .map(Profile::without_follower_count)
            .collect();

        Ok(FollowPage {
            follows,
            cursor: (end < all.len()).then(|| end.to_string()),
        })
    }
}
