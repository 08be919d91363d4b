use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{ExploreCandidate, UserId, UserProfile},
    traits::{ExploreApiError, ExploreManagement},
};

pub const DEFAULT_EXPLORE_PAGE: i64 = 20;

/// `ExploreApi` serves the swipe deck: profiles the user hasn't decided on yet, best skill-fit first.
pub struct ExploreApi<B> {
    db: B,
}

impl<B: Debug> Debug for ExploreApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExploreApi ({:?})", self.db)
    }
}

impl<B> ExploreApi<B>
where B: ExploreManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), ExploreApiError> {
        self.db.upsert_profile(profile).await
    }

    pub async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, ExploreApiError> {
        self.db.fetch_profile(user).await
    }

    /// Candidates the user has not swiped on, scored by skill overlap. `limit` defaults to a page of
    /// [`DEFAULT_EXPLORE_PAGE`] when `None`.
    pub async fn candidates(&self, user: &UserId, limit: Option<i64>) -> Result<Vec<ExploreCandidate>, ExploreApiError> {
        let limit = limit.unwrap_or(DEFAULT_EXPLORE_PAGE);
        let candidates = self.db.candidates_for(user, limit).await?;
        trace!("🔄️🔭️ {} explore candidates for {user}", candidates.len());
        Ok(candidates)
    }
}
