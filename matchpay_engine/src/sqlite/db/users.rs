use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{ExploreCandidate, UserId, UserProfile},
    sqlite::db::swipes,
    traits::ExploreApiError,
};

pub async fn upsert_profile(
    profile: &UserProfile,
    conn: &mut SqliteConnection,
) -> Result<UserProfile, ExploreApiError> {
    let profile = sqlx::query_as(
        r#"
            INSERT INTO users (id, display_name, skills_offered, skills_wanted)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET display_name = excluded.display_name,
                skills_offered = excluded.skills_offered,
                skills_wanted = excluded.skills_wanted
            RETURNING *;
        "#,
    )
    .bind(profile.id.as_str())
    .bind(profile.display_name.as_str())
    .bind(profile.skills_offered.as_str())
    .bind(profile.skills_wanted.as_str())
    .fetch_one(conn)
    .await?;
    Ok(profile)
}

pub async fn fetch_profile(user: &UserId, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, ExploreApiError> {
    let profile =
        sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user.as_str()).fetch_optional(conn).await?;
    Ok(profile)
}

/// Profiles the user has not swiped on whose skill tags overlap theirs in at least one direction, scored by how
/// many of the skills they want the candidate offers and ordered best-first. Skill tags live in CSV columns, so
/// the overlap test happens here rather than in SQL.
pub async fn candidates_for(
    user: &UserId,
    limit: usize,
    conn: &mut SqliteConnection,
) -> Result<Vec<ExploreCandidate>, ExploreApiError> {
    let me = fetch_profile(user, &mut *conn).await?.ok_or_else(|| ExploreApiError::UserNotFound(user.clone()))?;
    let seen = swipes::swiped_ids(user, &mut *conn).await.map_err(|e| ExploreApiError::DatabaseError(e.to_string()))?;
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id != ");
    builder.push_bind(user.as_str());
    if !seen.is_empty() {
        builder.push(" AND id NOT IN (");
        let mut ids = builder.separated(", ");
        for id in &seen {
            ids.push_bind(id.as_str());
        }
        builder.push(")");
    }
    let profiles: Vec<UserProfile> = builder.build_query_as().fetch_all(conn).await?;
    trace!("🗃️ Explore pool for {user}: {} unseen profiles", profiles.len());
    let wanted = me.wanted_tags();
    let offered = me.offered_tags();
    let mut candidates = profiles
        .into_iter()
        .filter_map(|profile| {
            let shared = profile.offered_tags().iter().filter(|tag| wanted.contains(tag)).count() as i64;
            let reciprocal = profile.wanted_tags().iter().any(|tag| offered.contains(tag));
            (shared > 0 || reciprocal).then_some(ExploreCandidate { profile, shared_skills: shared })
        })
        .collect::<Vec<ExploreCandidate>>();
    candidates.sort_by(|a, b| b.shared_skills.cmp(&a.shared_skills).then(a.profile.id.cmp(&b.profile.id)));
    candidates.truncate(limit);
    Ok(candidates)
}
