use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};

use crate::{
    db::now_sec,
    eligibility::meets_viewer_threshold,
    entities::{category, movie, movie_view, users},
    error::{AppError, AppResult},
    identity::{Principal, authenticated, authorize},
    models::{
        Category, MovieSummary, MovieWithViewers, Pool, SuggestMovieRequest, ToggleSeenRequest,
        UserSummary, Viewer,
    },
};

/// Categories grouped by pool, then type, then name.
pub async fn list_categories<C: ConnectionTrait>(db: &C) -> AppResult<Vec<Category>> {
    let mut categories = category::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(Category::from_model)
        .collect::<AppResult<Vec<_>>>()?;

    categories.sort_by(|a, b| {
        (a.pool, a.category_type, &a.name).cmp(&(b.pool, b.category_type, &b.name))
    });
    Ok(categories)
}

/// Everyone who can be picked as a viewer, by name.
pub async fn list_users<C: ConnectionTrait>(db: &C) -> AppResult<Vec<UserSummary>> {
    Ok(users::Entity::find()
        .order_by_asc(users::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect())
}

/// Every movie with its viewers, newest first.
pub async fn list_movies<C: ConnectionTrait>(db: &C) -> AppResult<Vec<MovieWithViewers>> {
    let mut rows = movie::Entity::find().find_with_related(movie_view::Entity).all(db).await?;
    rows.sort_by(|(a, _), (b, _)| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

    let viewer_ids: Vec<i32> =
        rows.iter().flat_map(|(_, views)| views.iter().map(|v| v.user_id)).collect();
    let names = user_names(db, viewer_ids).await?;

    rows.into_iter().map(|(movie, views)| with_viewers(movie, views, &names)).collect()
}

pub async fn load_movie_with_viewers<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> AppResult<MovieWithViewers> {
    let (movie, views) = movie::Entity::find_by_id(movie_id)
        .find_with_related(movie_view::Entity)
        .all(db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found(format!("Movie {movie_id} not found")))?;

    let names = user_names(db, views.iter().map(|v| v.user_id).collect()).await?;
    with_viewers(movie, views, &names)
}

/// Records that `viewer_ids` have watched a movie, creating the movie on
/// first suggestion. The pool is fixed at creation time from the release year.
pub async fn suggest_movie(
    db: &DatabaseConnection,
    req: &SuggestMovieRequest,
    new_release_min_year: i32,
) -> AppResult<MovieWithViewers> {
    let tmdb_id = req.tmdb_id.filter(|id| *id > 0);
    let title = req.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let (Some(tmdb_id), Some(title)) = (tmdb_id, title) else {
        return Err(AppError::invalid("Missing required fields: tmdbId, title, viewerIds"));
    };
    if req.viewer_ids.is_empty() {
        return Err(AppError::invalid("Missing required fields: tmdbId, title, viewerIds"));
    }

    let mut viewer_ids = req.viewer_ids.clone();
    viewer_ids.sort_unstable();
    viewer_ids.dedup();

    let known = users::Entity::find()
        .filter(users::Column::Id.is_in(viewer_ids.iter().copied()))
        .count(db)
        .await?;
    if known as usize != viewer_ids.len() {
        return Err(AppError::invalid("viewerIds contains an unknown user"));
    }

    let now = now_sec();
    let txn = db.begin().await?;

    let existing = movie::Entity::find().filter(movie::Column::TmdbId.eq(tmdb_id)).one(&txn).await?;
    let movie_id = match existing {
        Some(movie) => movie.id,
        None => {
            let pool = Pool::for_release_year(req.year, new_release_min_year);
            let created = movie::ActiveModel {
                id: Default::default(),
                tmdb_id: Set(tmdb_id),
                title: Set(title.to_string()),
                year: Set(req.year),
                poster_path: Set(req.poster_path.clone()),
                overview: Set(req.overview.clone()),
                pool: Set(pool.as_code().to_string()),
                original_language: Set(req.original_language.clone()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            debug!(movie_id = created.id, tmdb_id = tmdb_id, pool = pool.as_code(), "created movie");
            created.id
        },
    };

    let seen_by: HashSet<i32> = movie_view::Entity::find()
        .filter(movie_view::Column::MovieId.eq(movie_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|v| v.user_id)
        .collect();

    for user_id in viewer_ids.into_iter().filter(|id| !seen_by.contains(id)) {
        movie_view::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            has_seen: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    load_movie_with_viewers(db, movie_id).await
}

/// Flips a viewer's has-seen flag. Eligibility only counts viewer records,
/// so this never changes what can be nominated.
pub async fn toggle_seen<C: ConnectionTrait>(
    db: &C,
    principal: Principal,
    req: &ToggleSeenRequest,
) -> AppResult<MovieWithViewers> {
    let (Some(tmdb_id), Some(user_id), Some(has_seen)) = (req.tmdb_id, req.user_id, req.has_seen)
    else {
        return Err(AppError::invalid("Missing required fields: tmdbId, userId, hasSeen"));
    };
    authorize(principal, user_id)?;

    let movie = movie::Entity::find()
        .filter(movie::Column::TmdbId.eq(tmdb_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Movie not found"))?;

    let updated = movie_view::Entity::update_many()
        .col_expr(movie_view::Column::HasSeen, Expr::value(has_seen))
        .filter(movie_view::Column::MovieId.eq(movie.id))
        .filter(movie_view::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::not_found("MovieView record not found for this user and movie"));
    }

    load_movie_with_viewers(db, movie.id).await
}

/// Removes a movie by its TMDB id. Views, credits and any nominations that
/// point at it go with it through the foreign keys.
pub async fn delete_movie<C: ConnectionTrait>(
    db: &C,
    principal: Principal,
    tmdb_id: i32,
) -> AppResult<()> {
    let user_id = authenticated(principal)?;

    let deleted = movie::Entity::delete_many()
        .filter(movie::Column::TmdbId.eq(tmdb_id))
        .exec(db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(AppError::not_found("Movie not found"));
    }

    info!(tmdb_id = tmdb_id, user_id = user_id, "deleted movie");
    Ok(())
}

async fn user_names<C: ConnectionTrait>(
    db: &C,
    mut ids: Vec<i32>,
) -> AppResult<HashMap<i32, String>> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

fn with_viewers(
    movie: movie::Model,
    views: Vec<movie_view::Model>,
    names: &HashMap<i32, String>,
) -> AppResult<MovieWithViewers> {
    let overview = movie.overview.clone();
    let viewers: Vec<Viewer> = views
        .into_iter()
        .map(|v| Viewer {
            user_id: v.user_id,
            name: names.get(&v.user_id).cloned().unwrap_or_default(),
            has_seen: v.has_seen,
        })
        .collect();

    let summary = MovieSummary::from_model(movie, viewers.len())?;
    Ok(MovieWithViewers {
        is_valid: meets_viewer_threshold(summary.viewer_count),
        movie: summary,
        overview,
        viewers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::nomination,
        models::{CategoryType, CreditRole},
        test_support::{
            insert_credit, insert_person, insert_user, insert_users, seeded_category, setup_db,
        },
    };

    fn suggestion(tmdb_id: i32, year: Option<i32>, viewer_ids: Vec<i32>) -> SuggestMovieRequest {
        SuggestMovieRequest {
            tmdb_id: Some(tmdb_id),
            title: Some("Heat".to_string()),
            year,
            poster_path: None,
            overview: Some("Cops and robbers.".to_string()),
            original_language: Some("en".to_string()),
            viewer_ids,
        }
    }

    #[tokio::test]
    async fn seeded_categories_are_grouped_by_pool() {
        let db = setup_db().await;
        let categories = list_categories(&db).await.unwrap();
        assert_eq!(categories.len(), 21);
        assert_eq!(categories[0].pool, Pool::NewRelease);
        assert_eq!(categories[0].category_type, CategoryType::Film);
        assert_eq!(categories[0].name, "Best Cinematography");

        let last = categories.last().unwrap();
        assert_eq!(last.pool, Pool::All);
        assert_eq!(last.name, "Best Foreign Language Film");
    }

    #[tokio::test]
    async fn suggest_creates_movie_with_pool_from_year() {
        let db = setup_db().await;
        let viewers = insert_users(&db, 2).await;

        let classic = suggest_movie(&db, &suggestion(949, Some(1995), viewers.clone()), 2025)
            .await
            .unwrap();
        assert_eq!(classic.movie.pool, Pool::Classic);
        assert!(classic.is_valid);
        assert_eq!(classic.viewers.len(), 2);

        let fresh = suggest_movie(&db, &suggestion(1, Some(2025), vec![viewers[0]]), 2025)
            .await
            .unwrap();
        assert_eq!(fresh.movie.pool, Pool::NewRelease);
        assert!(!fresh.is_valid);

        let undated = suggest_movie(&db, &suggestion(2, None, vec![viewers[0]]), 2025).await.unwrap();
        assert_eq!(undated.movie.pool, Pool::All);
    }

    #[tokio::test]
    async fn suggest_existing_movie_adds_only_new_viewers() {
        let db = setup_db().await;
        let viewers = insert_users(&db, 3).await;

        suggest_movie(&db, &suggestion(949, Some(1995), vec![viewers[0]]), 2025).await.unwrap();
        let again = suggest_movie(&db, &suggestion(949, Some(2030), viewers.clone()), 2025)
            .await
            .unwrap();

        assert_eq!(again.movie.viewer_count, 3);
        assert_eq!(again.movie.pool, Pool::Classic);
        assert_eq!(list_movies(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn suggest_rejects_missing_fields_and_unknown_viewers() {
        let db = setup_db().await;
        let viewers = insert_users(&db, 1).await;

        let err = suggest_movie(&db, &suggestion(949, None, vec![]), 2025).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let mut untitled = suggestion(949, None, viewers.clone());
        untitled.title = Some("  ".to_string());
        assert!(suggest_movie(&db, &untitled, 2025).await.is_err());

        let err = suggest_movie(&db, &suggestion(949, None, vec![viewers[0], 77_777]), 2025)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(list_movies(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_seen_flips_flag_without_changing_viewer_count() {
        let db = setup_db().await;
        let viewers = insert_users(&db, 2).await;
        suggest_movie(&db, &suggestion(949, Some(1995), viewers.clone()), 2025).await.unwrap();

        let req =
            ToggleSeenRequest { tmdb_id: Some(949), user_id: Some(viewers[1]), has_seen: Some(true) };
        let movie = toggle_seen(&db, Principal(Some(viewers[1])), &req).await.unwrap();

        assert_eq!(movie.movie.viewer_count, 2);
        assert!(movie.is_valid);
        let flagged: Vec<bool> = movie.viewers.iter().map(|v| v.has_seen).collect();
        assert_eq!(flagged.iter().filter(|seen| **seen).count(), 1);

        let err = toggle_seen(&db, Principal(Some(viewers[0])), &req).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let missing = ToggleSeenRequest { tmdb_id: Some(1), ..req };
        let err = toggle_seen(&db, Principal(Some(viewers[1])), &missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn users_are_listed_by_name() {
        let db = setup_db().await;
        insert_user(&db, "zoe").await;
        insert_user(&db, "adam").await;
        insert_user(&db, "mia").await;

        let names: Vec<String> =
            list_users(&db).await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["adam", "mia", "zoe"]);
    }

    #[tokio::test]
    async fn delete_movie_cascades_to_views_credits_and_nominations() {
        let db = setup_db().await;
        let viewers = insert_users(&db, 2).await;
        let movie = suggest_movie(&db, &suggestion(949, Some(1995), viewers.clone()), 2025)
            .await
            .unwrap()
            .movie
            .id;
        let person = insert_person(&db, "Al Pacino", Some(2)).await;
        insert_credit(&db, movie, person, CreditRole::Actor, Some(0)).await;
        let category = seeded_category(&db, "Best Picture", Pool::Classic).await;
        nomination::ActiveModel {
            user_id: Set(viewers[0]),
            category_id: Set(category),
            rank: Set(1),
            movie_id: Set(Some(movie)),
            movie_credit_id: Set(None),
            created_at: Set(0),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let err = delete_movie(&db, Principal(None), 949).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));

        delete_movie(&db, Principal(Some(viewers[0])), 949).await.unwrap();

        assert!(list_movies(&db).await.unwrap().is_empty());
        assert_eq!(movie_view::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(crate::entities::movie_credit::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(nomination::Entity::find().count(&db).await.unwrap(), 0);

        let err = delete_movie(&db, Principal(Some(viewers[0])), 949).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
