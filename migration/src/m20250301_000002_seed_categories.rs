use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FILM: &str = "FILM";
const ACTOR: &str = "ACTOR";
const DIRECTOR: &str = "DIRECTOR";

/// Categories offered once per era pool.
const POOLED_CATEGORIES: &[(&str, &str)] = &[
    ("Best Picture", FILM),
    ("Best Screenplay", FILM),
    ("Best Cinematography", FILM),
    ("Best Score", FILM),
    ("Best Editing", FILM),
    ("Best Actor", ACTOR),
    ("Best Actress", ACTOR),
    ("Best Supporting Actor", ACTOR),
    ("Best Supporting Actress", ACTOR),
    ("Best Director", DIRECTOR),
];

const POOLS: &[&str] = &["NEW_RELEASE", "CLASSIC"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Category::Table).columns([
            Category::Name,
            Category::CategoryType,
            Category::Pool,
        ]);

        for pool in POOLS {
            for (name, kind) in POOLED_CATEGORIES {
                insert
                    .values([(*name).into(), (*kind).into(), (*pool).into()])
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
            }
        }

        insert
            .values(["Best Foreign Language Film".into(), FILM.into(), "ALL".into()])
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.exec_stmt(Query::delete().from_table(Category::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Name,
    CategoryType,
    Pool,
}
