//! Cache-fronted fetchers over raw directory sources

use crate::cache::Cache;
use crate::config::Config;
use crate::directory::{
    DirectoryError, FollowDirectory, FollowSource, Profile, ProfileDirectory, ProfileSource,
};

/// Resolves profiles through a cache, batching misses to the source
pub struct ProfileFetcher<S> {
    source: S,
    cache: Box<dyn Cache<Profile>>,
    batch_size: usize,
}

impl<S: ProfileSource> ProfileFetcher<S> {
    pub fn new(source: S, cache: Box<dyn Cache<Profile>>, config: &Config) -> Self {
        Self {
            source,
            cache,
            batch_size: config.profile_batch_size.max(1),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: ProfileSource> ProfileDirectory for ProfileFetcher<S> {
    fn resolve_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        let mut result = Vec::with_capacity(identifiers.len());
        let mut misses = Vec::new();

        for identifier in identifiers {
            match self.cache.get(identifier) {
                Some(profile) => result.push(profile),
                None => misses.push(identifier.clone()),
            }
        }

        log::debug!(
            "Resolving {} profiles ({} cached, {} from source)",
            identifiers.len(),
            result.len(),
            misses.len()
        );

        for batch in misses.chunks(self.batch_size) {
            for profile in self.source.get_profiles(batch)? {
                if let Err(e) = self.cache.put(&profile.id, &profile) {
                    log::warn!("Failed to cache profile {}: {}", profile.id, e);
                }
                result.push(profile);
            }
        }

        Ok(result)
    }
}

/// Fetches complete follow listings through a cache, page by page
pub struct FollowsFetcher<S> {
    source: S,
    cache: Box<dyn Cache<Vec<Profile>>>,
    page_size: usize,
    max_follows: usize,
}

impl<S: FollowSource> FollowsFetcher<S> {
    pub fn new(source: S, cache: Box<dyn Cache<Vec<Profile>>>, config: &Config) -> Self {
        Self {
            source,
            cache,
            page_size: config.follows_page_size.max(1),
            max_follows: config.max_follows,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn fetch_from_source(&self, id: &str) -> Result<Vec<Profile>, DirectoryError> {
        let mut follows = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .source
                .get_follows(id, cursor.as_deref(), self.page_size)?;
            let page_len = page.follows.len();
            follows.extend(page.follows);

            if follows.len() >= self.max_follows || page_len < self.page_size {
                break;
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(follows)
    }
}

impl<S: FollowSource> FollowDirectory for FollowsFetcher<S> {
    fn fetch_follows(&self, id: &str) -> Vec<Profile> {
        if let Some(follows) = self.cache.get(id) {
            return follows;
        }

        match self.fetch_from_source(id) {
            Ok(follows) => {
                if let Err(e) = self.cache.put(id, &follows) {
                    log::warn!("Failed to cache follows of {}: {}", id, e);
                }
                follows
            }
            Err(e) => {
                log::warn!("Failed to fetch follows of {}, treating as empty: {}", id, e);
                Vec::new()
            }
        }
    }
}
