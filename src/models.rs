use serde::{Deserialize, Serialize};

use crate::{
    entities::{category, movie, movie_credit, person, users},
    error::{AppError, AppResult},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pool {
    NewRelease,
    Classic,
    All,
}

impl Pool {
    pub fn as_code(self) -> &'static str {
        match self {
            Pool::NewRelease => "NEW_RELEASE",
            Pool::Classic => "CLASSIC",
            Pool::All => "ALL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NEW_RELEASE" => Some(Pool::NewRelease),
            "CLASSIC" => Some(Pool::Classic),
            "ALL" => Some(Pool::All),
            _ => None,
        }
    }

    /// Whether a category drawing from `self` accepts a movie tagged `movie_pool`.
    /// `ALL` on either side matches everything.
    pub fn accepts(self, movie_pool: Pool) -> bool {
        self == Pool::All || movie_pool == Pool::All || self == movie_pool
    }

    /// Pool assigned to a movie when it is first suggested.
    pub fn for_release_year(year: Option<i32>, new_release_min_year: i32) -> Self {
        match year {
            Some(y) if y >= new_release_min_year => Pool::NewRelease,
            Some(_) => Pool::Classic,
            None => Pool::All,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Film,
    Actor,
    Director,
}

impl CategoryType {
    pub fn as_code(self) -> &'static str {
        match self {
            CategoryType::Film => "FILM",
            CategoryType::Actor => "ACTOR",
            CategoryType::Director => "DIRECTOR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FILM" => Some(CategoryType::Film),
            "ACTOR" => Some(CategoryType::Actor),
            "DIRECTOR" => Some(CategoryType::Director),
            _ => None,
        }
    }

    /// Credit role nominated in this category, `None` for film categories.
    pub fn credit_role(self) -> Option<CreditRole> {
        match self {
            CategoryType::Film => None,
            CategoryType::Actor => Some(CreditRole::Actor),
            CategoryType::Director => Some(CreditRole::Director),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditRole {
    Actor,
    Director,
}

impl CreditRole {
    pub fn as_code(self) -> &'static str {
        match self {
            CreditRole::Actor => "ACTOR",
            CreditRole::Director => "DIRECTOR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ACTOR" => Some(CreditRole::Actor),
            "DIRECTOR" => Some(CreditRole::Director),
            _ => None,
        }
    }
}

fn bad_code(table: &str, id: i32, code: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("{table} {id} has unknown code {code:?}"))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub pool: Pool,
}

impl Category {
    pub fn from_model(model: category::Model) -> AppResult<Self> {
        let category_type = CategoryType::from_code(&model.category_type)
            .ok_or_else(|| bad_code("category", model.id, &model.category_type))?;
        let pool =
            Pool::from_code(&model.pool).ok_or_else(|| bad_code("category", model.id, &model.pool))?;
        Ok(Self { id: model.id, name: model.name, category_type, pool })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i32,
    pub tmdb_id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
    pub pool: Pool,
    pub original_language: Option<String>,
    pub viewer_count: usize,
}

impl MovieSummary {
    pub fn from_model(model: movie::Model, viewer_count: usize) -> AppResult<Self> {
        let pool = Pool::from_code(&model.pool).ok_or_else(|| bad_code("movie", model.id, &model.pool))?;
        Ok(Self {
            id: model.id,
            tmdb_id: model.tmdb_id,
            title: model.title,
            year: model.year,
            poster_path: model.poster_path,
            pool,
            original_language: model.original_language,
            viewer_count,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: i32,
    pub tmdb_id: i32,
    pub name: String,
    pub photo_path: Option<String>,
    pub gender: Option<i32>,
}

impl From<person::Model> for PersonSummary {
    fn from(model: person::Model) -> Self {
        Self {
            id: model.id,
            tmdb_id: model.tmdb_id,
            name: model.name,
            photo_path: model.photo_path,
            gender: model.gender,
        }
    }
}

/// A credit joined with the person and movie it links.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBundle {
    pub id: i32,
    pub role: CreditRole,
    pub character: Option<String>,
    pub billing_order: Option<i32>,
    pub person: PersonSummary,
    pub movie: MovieSummary,
}

impl CreditBundle {
    pub fn new(
        credit: movie_credit::Model,
        person: person::Model,
        movie: MovieSummary,
    ) -> AppResult<Self> {
        let role = CreditRole::from_code(&credit.role)
            .ok_or_else(|| bad_code("movie_credit", credit.id, &credit.role))?;
        Ok(Self {
            id: credit.id,
            role,
            character: credit.character,
            billing_order: credit.billing_order,
            person: person.into(),
            movie,
        })
    }
}

/// A candidate a user may nominate.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum EligibleItem {
    Film(MovieSummary),
    Credit(CreditBundle),
}

/// What a nomination points at. The variant always agrees with the
/// category type once a proposal has been validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NominationTarget {
    Film(i32),
    Credit(i32),
}

impl NominationTarget {
    pub fn from_columns(movie_id: Option<i32>, movie_credit_id: Option<i32>) -> Option<Self> {
        match (movie_id, movie_credit_id) {
            (Some(id), None) => Some(NominationTarget::Film(id)),
            (None, Some(id)) => Some(NominationTarget::Credit(id)),
            _ => None,
        }
    }

    pub fn movie_id(self) -> Option<i32> {
        match self {
            NominationTarget::Film(id) => Some(id),
            NominationTarget::Credit(_) => None,
        }
    }

    pub fn movie_credit_id(self) -> Option<i32> {
        match self {
            NominationTarget::Film(_) => None,
            NominationTarget::Credit(id) => Some(id),
        }
    }
}

/// One entry of a ranked list as submitted by the client.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationInput {
    pub rank: i32,
    pub movie_id: Option<i32>,
    pub movie_credit_id: Option<i32>,
}

/// A structurally valid entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProposedNomination {
    pub rank: i32,
    pub target: NominationTarget,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NominatedItem {
    Film {
        movie: MovieSummary,
    },
    Credit {
        #[serde(rename = "movieCredit")]
        movie_credit: CreditBundle,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedNomination {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub rank: i32,
    #[serde(flatten)]
    pub item: NominatedItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveNominationsRequest {
    pub user_id: Option<i32>,
    pub category_id: Option<i32>,
    pub nominations: Option<Vec<NominationInput>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationStatus {
    pub completed_category_ids: Vec<i32>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub created_at: i64,
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self { id: model.id, name: model.name, created_at: model.created_at }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub user_id: i32,
    pub name: String,
    pub has_seen: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieWithViewers {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub overview: Option<String>,
    pub is_valid: bool,
    pub viewers: Vec<Viewer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestMovieRequest {
    pub tmdb_id: Option<i32>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub viewer_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSeenRequest {
    pub tmdb_id: Option<i32>,
    pub user_id: Option<i32>,
    pub has_seen: Option<bool>,
}
