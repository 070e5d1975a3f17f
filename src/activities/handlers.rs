use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use crate::{auth::jwt::AuthUser, error::ApiError, extract::Json, state::AppState};

use super::{
    dto::{category_filter, ActivityFilter, ActivityResponse, CreateActivityRequest, ListQuery, StatsQuery},
    repo,
    stats::{self, WeeklyStats},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs).post(create_log))
        .route("/stats/weekly", get(weekly_stats))
}

#[instrument(skip(state, payload))]
pub async fn create_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityResponse>), ApiError> {
    let new = payload.validate()?;
    let activity = repo::insert(&state.db, user_id, &new).await?;
    info!(user_id, activity_id = activity.id, "activity logged");
    Ok((StatusCode::CREATED, Json(activity.into())))
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ActivityResponse>>, ApiError> {
    let filter = query.validate()?;
    let rows = repo::list(&state.db, user_id, &filter).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn weekly_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<WeeklyStats>, ApiError> {
    let (week_start, week_end) = stats::week_bounds(stats::today_local());
    let window = ActivityFilter {
        category: None,
        start_date: Some(week_start),
        end_date: Some(week_end),
    };
    let rows = repo::list(&state.db, user_id, &window).await?;
    let category = category_filter(query.category);
    Ok(Json(stats::aggregate(
        &rows,
        week_start,
        week_end,
        category.as_deref(),
    )))
}
