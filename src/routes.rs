use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, catalog, credits,
    eligibility::resolve_eligible,
    error::{AppError, AppResult},
    identity::Principal,
    models::{
        Category, EligibleItem, HydratedNomination, MovieWithViewers, NominationStatus,
        SaveNominationsRequest, SuggestMovieRequest, ToggleSeenRequest, UserSummary,
    },
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/categories", get(categories))
        .route("/api/users", get(users))
        .route("/api/movies", get(movies))
        .route("/api/movies/{tmdb_id}", delete(delete_movie))
        .route("/api/movies/suggest", post(suggest_movie))
        .route("/api/movies/toggle-seen", post(toggle_seen))
        .route("/api/nominations", get(get_nominations).put(save_nominations))
        .route("/api/nominations/eligible", get(eligible))
        .route("/api/nominations/status", get(status))
        .with_state(state)
}

/// Query parameters arrive as raw strings so a malformed id is reported the
/// same way as a missing one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationQuery {
    user_id: Option<String>,
    category_id: Option<String>,
}

fn parse_id(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}

pub async fn categories(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

pub async fn users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(catalog::list_users(&state.db).await?))
}

pub async fn movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<MovieWithViewers>>> {
    Ok(Json(catalog::list_movies(&state.db).await?))
}

pub async fn suggest_movie(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SuggestMovieRequest>, JsonRejection>,
) -> AppResult<Json<MovieWithViewers>> {
    let Json(req) = body?;
    let movie = catalog::suggest_movie(&state.db, &req, state.config.new_release_min_year).await?;

    if !credits::has_credits(&state.db, movie.movie.id).await? {
        credits::spawn_ingestion(
            state.db.clone(),
            state.tmdb.clone(),
            movie.movie.id,
            movie.movie.tmdb_id,
        );
    }

    Ok(Json(movie))
}

pub async fn toggle_seen(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    body: Result<Json<ToggleSeenRequest>, JsonRejection>,
) -> AppResult<Json<MovieWithViewers>> {
    let Json(req) = body?;
    Ok(Json(catalog::toggle_seen(&state.db, principal, &req).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(tmdb_id): Path<String>,
) -> AppResult<Json<Value>> {
    let tmdb_id = parse_id(Some(&tmdb_id)).ok_or_else(|| AppError::invalid("Invalid movie ID"))?;
    catalog::delete_movie(&state.db, principal, tmdb_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn eligible(
    State(state): State<Arc<AppState>>,
    Query(q): Query<NominationQuery>,
) -> AppResult<Json<Vec<EligibleItem>>> {
    let category_id = parse_id(q.category_id.as_deref())
        .ok_or_else(|| AppError::invalid("categoryId required"))?;
    Ok(Json(resolve_eligible(&state.db, category_id).await?))
}

pub async fn get_nominations(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(q): Query<NominationQuery>,
) -> AppResult<Json<Vec<HydratedNomination>>> {
    let (Some(user_id), Some(category_id)) =
        (parse_id(q.user_id.as_deref()), parse_id(q.category_id.as_deref()))
    else {
        return Err(AppError::invalid("userId and categoryId required"));
    };

    Ok(Json(state.nominations.get_nominations(principal, user_id, category_id).await?))
}

pub async fn save_nominations(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    body: Result<Json<SaveNominationsRequest>, JsonRejection>,
) -> AppResult<Json<Vec<HydratedNomination>>> {
    const REQUIRED: &str = "userId, categoryId, and nominations array required";

    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "malformed nominations body");
        AppError::invalid(REQUIRED)
    })?;
    let (Some(user_id), Some(category_id), Some(entries)) =
        (req.user_id, req.category_id, req.nominations)
    else {
        return Err(AppError::invalid(REQUIRED));
    };

    let saved =
        state.nominations.validate_and_save(principal, user_id, category_id, &entries).await?;
    Ok(Json(saved))
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(q): Query<NominationQuery>,
) -> AppResult<Json<NominationStatus>> {
    let user_id =
        parse_id(q.user_id.as_deref()).ok_or_else(|| AppError::invalid("userId required"))?;
    let completed_category_ids =
        state.nominations.completed_category_ids(principal, user_id).await?;
    Ok(Json(NominationStatus { completed_category_ids }))
}
