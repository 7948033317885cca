use std::{collections::HashSet, sync::Arc};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::info;

use crate::{
    clock::{Clock, Deadline},
    eligibility::{MIN_VIEWERS, load_category, meets_viewer_threshold, movies_by_id},
    entities::movie_credit,
    error::{AppError, AppResult},
    identity::{Principal, authorize},
    models::{
        Category, CategoryType, CreditRole, HydratedNomination, MovieSummary, NominationInput,
        NominationTarget, ProposedNomination,
    },
    store::NominationStore,
};

pub const MAX_NOMINATIONS: usize = 5;
const MIN_RANK: i32 = 1;
const MAX_RANK: i32 = 5;

#[derive(Clone)]
pub struct NominationService {
    store: NominationStore,
    clock: Arc<dyn Clock>,
    deadline: Deadline,
}

impl NominationService {
    pub fn new(store: NominationStore, clock: Arc<dyn Clock>, deadline: Deadline) -> Self {
        Self { store, clock, deadline }
    }

    pub fn is_locked(&self) -> bool {
        self.deadline.has_passed(self.clock.now())
    }

    /// Validates a ranked list for one category and, if every check passes,
    /// replaces the user's stored set with it. Nothing is written on failure.
    pub async fn validate_and_save(
        &self,
        principal: Principal,
        user_id: i32,
        category_id: i32,
        entries: &[NominationInput],
    ) -> AppResult<Vec<HydratedNomination>> {
        if self.is_locked() {
            return Err(AppError::forbidden("Nominations period closed"));
        }
        authorize(principal, user_id)?;

        let db = self.store.db();
        let category = load_category(db, category_id).await?;
        let proposed = validate_structure(&category, entries)?;
        check_eligibility(db, &category, &proposed).await?;

        self.store.replace_all(user_id, category_id, &proposed).await?;
        info!(
            user_id = user_id,
            category_id = category_id,
            count = proposed.len(),
            "saved nominations"
        );

        self.store.list(user_id, category_id).await
    }

    pub async fn get_nominations(
        &self,
        principal: Principal,
        user_id: i32,
        category_id: i32,
    ) -> AppResult<Vec<HydratedNomination>> {
        authorize(principal, user_id)?;
        self.store.list(user_id, category_id).await
    }

    pub async fn completed_category_ids(
        &self,
        principal: Principal,
        user_id: i32,
    ) -> AppResult<Vec<i32>> {
        authorize(principal, user_id)?;
        self.store.completed_category_ids(user_id).await
    }
}

/// Shape checks that need no database access: list length, rank range and
/// uniqueness, item kind, item uniqueness. Checked in that order.
pub fn validate_structure(
    category: &Category,
    entries: &[NominationInput],
) -> AppResult<Vec<ProposedNomination>> {
    if entries.len() > MAX_NOMINATIONS {
        return Err(AppError::invalid(format!(
            "too many nominations: at most {MAX_NOMINATIONS} per category"
        )));
    }

    if let Some(entry) = entries.iter().find(|e| !(MIN_RANK..=MAX_RANK).contains(&e.rank)) {
        return Err(AppError::invalid(format!(
            "rank out of range: {} (ranks must be {MIN_RANK}-{MAX_RANK})",
            entry.rank
        )));
    }

    let mut ranks = HashSet::new();
    for entry in entries {
        if !ranks.insert(entry.rank) {
            return Err(AppError::invalid(format!("duplicate rank {}", entry.rank)));
        }
    }

    let proposed = entries
        .iter()
        .map(|entry| {
            target_for(category.category_type, entry)
                .map(|target| ProposedNomination { rank: entry.rank, target })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let mut items = HashSet::new();
    for entry in &proposed {
        if !items.insert(entry.target) {
            let description = match entry.target {
                NominationTarget::Film(id) => format!("movie {id}"),
                NominationTarget::Credit(id) => format!("movie credit {id}"),
            };
            return Err(AppError::invalid(format!("duplicate item: {description}")));
        }
    }

    Ok(proposed)
}

fn target_for(category_type: CategoryType, entry: &NominationInput) -> AppResult<NominationTarget> {
    match (category_type, entry.movie_id, entry.movie_credit_id) {
        (CategoryType::Film, Some(id), None) => Ok(NominationTarget::Film(id)),
        (CategoryType::Film, _, _) => Err(AppError::invalid("FILM categories require movieId only")),
        (_, None, Some(id)) => Ok(NominationTarget::Credit(id)),
        (kind, _, _) => Err(AppError::invalid(format!(
            "{} categories require movieCreditId only",
            kind.as_code()
        ))),
    }
}

/// Existence, role, pool and viewer checks against current data, item by item
/// in submission order.
async fn check_eligibility<C: ConnectionTrait>(
    db: &C,
    category: &Category,
    proposed: &[ProposedNomination],
) -> AppResult<()> {
    match category.category_type.credit_role() {
        None => {
            let ids: Vec<i32> = proposed.iter().filter_map(|p| p.target.movie_id()).collect();
            let movies = movies_by_id(db, &ids).await?;
            for id in ids {
                let movie = movies
                    .get(&id)
                    .ok_or_else(|| AppError::invalid(format!("Movie {id} not found")))?;
                check_movie(category, movie)?;
            }
        },
        Some(role) => {
            let ids: Vec<i32> = proposed.iter().filter_map(|p| p.target.movie_credit_id()).collect();
            let credits = if ids.is_empty() {
                Vec::new()
            } else {
                movie_credit::Entity::find()
                    .filter(movie_credit::Column::Id.is_in(ids.iter().copied()))
                    .all(db)
                    .await?
            };
            let movie_ids: Vec<i32> = credits.iter().map(|c| c.movie_id).collect();
            let movies = movies_by_id(db, &movie_ids).await?;

            for id in ids {
                let credit = credits
                    .iter()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::invalid(format!("MovieCredit {id} not found")))?;
                if CreditRole::from_code(&credit.role) != Some(role) {
                    return Err(AppError::invalid(format!("Credit {id} role mismatch")));
                }
                let movie = movies.get(&credit.movie_id).ok_or_else(|| {
                    AppError::invalid(format!("Movie {} not found", credit.movie_id))
                })?;
                check_movie(category, movie)?;
            }
        },
    }
    Ok(())
}

fn check_movie(category: &Category, movie: &MovieSummary) -> AppResult<()> {
    if !category.pool.accepts(movie.pool) {
        return Err(AppError::invalid(format!("Movie \"{}\" pool mismatch", movie.title)));
    }
    if !meets_viewer_threshold(movie.viewer_count) {
        return Err(AppError::invalid(format!(
            "Movie \"{}\" needs {MIN_VIEWERS}+ viewers",
            movie.title
        )));
    }
    Ok(())
}
