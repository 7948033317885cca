use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub tmdb_id: i32,
    pub name: String,
    pub photo_path: Option<String>,
    /// TMDB gender code: 1 female, 2 male, 0/3 or missing otherwise.
    pub gender: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_credit::Entity")]
    MovieCredit,
}

impl Related<super::movie_credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieCredit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
