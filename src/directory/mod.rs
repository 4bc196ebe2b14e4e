//! Account directory abstractions
//!
//! Raw sources (`ProfileSource`, `FollowSource`) talk to whatever holds the
//! follow data. The ranking core only sees the collaborator traits
//! (`ProfileDirectory`, `FollowDirectory`), which the cache-fronted fetchers in
//! [`fetcher`] implement.

pub mod fetcher;

pub use fetcher::{FollowsFetcher, ProfileFetcher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An account profile as returned by a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
}

impl Profile {
    pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            display_name: None,
            follower_count: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_follower_count(mut self, follower_count: u64) -> Self {
        self.follower_count = Some(follower_count);
        self
    }

    /// Copy without the follower count, as carried by follow listings
    pub fn without_follower_count(&self) -> Self {
        Self {
            follower_count: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Request(String),
    #[error("unknown account: {0}")]
    NotFound(String),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

/// One page of a follow listing
#[derive(Debug, Clone, Default)]
pub struct FollowPage {
    pub follows: Vec<Profile>,
    /// Cursor for the next page, `None` when the listing is exhausted
    pub cursor: Option<String>,
}

/// Source of profile records; handles a single batch per call
pub trait ProfileSource {
    fn get_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError>;
}

/// Source of paginated follow listings
pub trait FollowSource {
    fn get_follows(
        &self,
        id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<FollowPage, DirectoryError>;
}

/// Resolves identifiers (ids or handles) to profiles.
///
/// Output order is not aligned with the input and unknown identifiers are
/// omitted, so callers must index the result by id.
pub trait ProfileDirectory {
    fn resolve_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError>;
}

/// Lists the accounts followed by an account.
///
/// Never fails: a source error yields an empty list so one bad account cannot
/// abort a ranking run.
pub trait FollowDirectory {
    fn fetch_follows(&self, id: &str) -> Vec<Profile>;
}

impl<T: ProfileDirectory + ?Sized> ProfileDirectory for &T {
    fn resolve_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        (**self).resolve_profiles(identifiers)
    }
}

impl<T: FollowDirectory + ?Sized> FollowDirectory for &T {
    fn fetch_follows(&self, id: &str) -> Vec<Profile> {
        (**self).fetch_follows(id)
    }
}

impl<T: ProfileSource + ?Sized> ProfileSource for &T {
    fn get_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, DirectoryError> {
        (**self).get_profiles(identifiers)
    }
}

impl<T: FollowSource + ?Sized> FollowSource for &T {
    fn get_follows(
        &self,
        id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<FollowPage, DirectoryError> {
        (**self).get_follows(id, cursor, limit)
    }
}
