use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub tmdb_id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    /// Pool code, see `models::Pool`.
    pub pool: String,
    pub original_language: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_view::Entity")]
    MovieView,
    #[sea_orm(has_many = "super::movie_credit::Entity")]
    MovieCredit,
    #[sea_orm(has_many = "super::nomination::Entity")]
    Nomination,
}

impl Related<super::movie_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieView.def()
    }
}

impl Related<super::movie_credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieCredit.def()
    }
}

impl Related<super::nomination::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nomination.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
