//! Account ranking orchestration

pub mod creator;
pub mod status;

pub use creator::RankingCreator;
pub use status::{Phase, Status, StatusHandle};

use crate::directory::Profile;
use serde::Serialize;

/// An account together with its personalized rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAccount {
    pub profile: Profile,
    pub score: f64,
}
