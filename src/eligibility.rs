use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::{
    entities::{category, movie, movie_credit, movie_view, person},
    error::{AppError, AppResult},
    models::{Category, CategoryType, CreditBundle, CreditRole, EligibleItem, MovieSummary, Pool},
};

/// Distinct viewer records a movie needs before anything from it can be nominated.
pub const MIN_VIEWERS: usize = 2;

/// Most credits a single movie may contribute to one gendered acting category.
pub const CREDITS_PER_MOVIE_CAP: usize = 5;

pub const DEFAULT_LANGUAGE: &str = "en";

const FEMALE: i32 = 1;
const MALE: i32 = 2;

const LEAD_MAX_ORDER: i32 = 2;
const SUPPORTING_MIN_ORDER: i32 = 2;

pub fn meets_viewer_threshold(viewer_count: usize) -> bool {
    viewer_count >= MIN_VIEWERS
}

pub async fn load_category<C: ConnectionTrait>(db: &C, category_id: i32) -> AppResult<Category> {
    let model = category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {category_id} not found")))?;
    Category::from_model(model)
}

/// Everything a user may currently nominate in `category_id`. Recomputed on
/// every call.
pub async fn resolve_eligible<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
) -> AppResult<Vec<EligibleItem>> {
    let category = load_category(db, category_id).await?;

    let items: Vec<EligibleItem> = match category.category_type.credit_role() {
        None => eligible_films(db, &category).await?.into_iter().map(EligibleItem::Film).collect(),
        Some(role) => eligible_credits(db, &category, role)
            .await?
            .into_iter()
            .map(EligibleItem::Credit)
            .collect(),
    };

    debug!(
        category_id = category.id,
        category = %category.name,
        eligible = items.len(),
        "resolved eligible items"
    );

    Ok(items)
}

/// Movies a category drawing from `pool` may use, with at least
/// [`MIN_VIEWERS`] viewer records.
pub async fn valid_movies<C: ConnectionTrait>(db: &C, pool: Pool) -> AppResult<Vec<MovieSummary>> {
    let mut query = movie::Entity::find();
    if pool != Pool::All {
        query = query.filter(movie::Column::Pool.is_in([pool.as_code(), Pool::All.as_code()]));
    }

    let rows = query.find_with_related(movie_view::Entity).all(db).await?;

    rows.into_iter()
        .filter(|(_, views)| meets_viewer_threshold(views.len()))
        .map(|(movie, views)| MovieSummary::from_model(movie, views.len()))
        .collect()
}

/// Loads the given movies with their viewer counts, keyed by id. Unknown ids
/// are simply absent from the map.
pub async fn movies_by_id<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> AppResult<HashMap<i32, MovieSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = movie::Entity::find()
        .filter(movie::Column::Id.is_in(ids.iter().copied()))
        .find_with_related(movie_view::Entity)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(movie, views)| MovieSummary::from_model(movie, views.len()).map(|m| (m.id, m)))
        .collect()
}

async fn eligible_films<C: ConnectionTrait>(
    db: &C,
    category: &Category,
) -> AppResult<Vec<MovieSummary>> {
    let mut movies = valid_movies(db, category.pool).await?;

    if is_foreign_language_category(&category.name) {
        movies.retain(is_foreign_language);
    }

    movies.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(movies)
}

async fn eligible_credits<C: ConnectionTrait>(
    db: &C,
    category: &Category,
    role: CreditRole,
) -> AppResult<Vec<CreditBundle>> {
    let movies: HashMap<i32, MovieSummary> =
        valid_movies(db, category.pool).await?.into_iter().map(|m| (m.id, m)).collect();
    if movies.is_empty() {
        return Ok(Vec::new());
    }

    let rows = movie_credit::Entity::find()
        .filter(movie_credit::Column::Role.eq(role.as_code()))
        .filter(movie_credit::Column::MovieId.is_in(movies.keys().copied()))
        .find_also_related(person::Entity)
        .all(db)
        .await?;

    let mut credits = Vec::with_capacity(rows.len());
    for (credit, person) in rows {
        let (Some(person), Some(movie)) = (person, movies.get(&credit.movie_id)) else {
            continue;
        };
        credits.push(CreditBundle::new(credit, person, movie.clone())?);
    }

    let tier = match category.category_type {
        CategoryType::Actor => ActingTier::for_category(&category.name),
        _ => None,
    };

    if let Some(tier) = tier {
        credits.retain(|c| tier.admits(c));
    }

    sort_credits(&mut credits);

    if tier.is_some() {
        credits = cap_per_movie(credits, CREDITS_PER_MOVIE_CAP);
    }

    Ok(credits)
}

pub fn is_foreign_language_category(name: &str) -> bool {
    name.to_ascii_lowercase().contains("foreign language")
}

fn is_foreign_language(movie: &MovieSummary) -> bool {
    movie
        .original_language
        .as_deref()
        .map(str::trim)
        .is_some_and(|lang| !lang.is_empty() && !lang.eq_ignore_ascii_case(DEFAULT_LANGUAGE))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Billing {
    Lead,
    Supporting,
}

impl Billing {
    fn admits(self, order: i32) -> bool {
        match self {
            Billing::Lead => order <= LEAD_MAX_ORDER,
            Billing::Supporting => order >= SUPPORTING_MIN_ORDER,
        }
    }
}

/// Gender and billing restriction encoded in the name of an acting category.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActingTier {
    pub gender: i32,
    pub billing: Billing,
}

impl ActingTier {
    pub fn for_category(name: &str) -> Option<Self> {
        let (gender, billing) = match name.trim() {
            "Best Actor" => (MALE, Billing::Lead),
            "Best Actress" => (FEMALE, Billing::Lead),
            "Best Supporting Actor" => (MALE, Billing::Supporting),
            "Best Supporting Actress" => (FEMALE, Billing::Supporting),
            _ => return None,
        };
        Some(Self { gender, billing })
    }

    /// Credits without a gender or billing order never qualify.
    pub fn admits(self, credit: &CreditBundle) -> bool {
        credit.person.gender == Some(self.gender)
            && credit.billing_order.is_some_and(|order| self.billing.admits(order))
    }
}

/// Billing order ascending (unbilled last), then person name.
pub fn sort_credits(credits: &mut [CreditBundle]) {
    credits.sort_by(|a, b| {
        billing_key(a).cmp(&billing_key(b)).then_with(|| a.person.name.cmp(&b.person.name))
    });
}

fn billing_key(credit: &CreditBundle) -> i32 {
    credit.billing_order.unwrap_or(i32::MAX)
}

/// Keeps the first `cap` credits of each movie, preserving order.
pub fn cap_per_movie(credits: Vec<CreditBundle>, cap: usize) -> Vec<CreditBundle> {
    let mut taken: HashMap<i32, usize> = HashMap::new();
    credits
        .into_iter()
        .filter(|credit| {
            let count = taken.entry(credit.movie.id).or_default();
            *count += 1;
            *count <= cap
        })
        .collect()
}
