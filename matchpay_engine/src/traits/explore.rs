use thiserror::Error;

use crate::db_types::{ExploreCandidate, UserId, UserProfile};

/// Candidate source for the explore feed: everyone except the requester and the ids they have already swiped on,
/// kept when the offered/wanted skill tags overlap in at least one direction, bounded to the page size.
/// Ranking beyond the overlap count is out of scope.
#[allow(async_fn_in_trait)]
pub trait ExploreManagement: Clone {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), ExploreApiError>;

    async fn fetch_profile(&self, id: &UserId) -> Result<Option<UserProfile>, ExploreApiError>;

    async fn candidates_for(&self, user: &UserId, limit: i64) -> Result<Vec<ExploreCandidate>, ExploreApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum ExploreApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No profile exists for user {0}")]
    UserNotFound(UserId),
}

impl From<sqlx::Error> for ExploreApiError {
    fn from(e: sqlx::Error) -> Self {
        ExploreApiError::DatabaseError(e.to_string())
    }
}
