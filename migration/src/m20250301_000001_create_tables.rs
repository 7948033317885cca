use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_uniq(Users::Name))
                    .col(big_integer(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(integer_uniq(Movie::TmdbId))
                    .col(string(Movie::Title))
                    .col(integer_null(Movie::Year))
                    .col(string_null(Movie::PosterPath))
                    .col(text_null(Movie::Overview))
                    .col(string(Movie::Pool))
                    .col(string_null(Movie::OriginalLanguage))
                    .col(big_integer(Movie::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_pool")
                    .table(Movie::Table)
                    .col(Movie::Pool)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieView::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieView::Id))
                    .col(integer(MovieView::MovieId))
                    .col(integer(MovieView::UserId))
                    .col(boolean(MovieView::HasSeen).default(false))
                    .col(big_integer(MovieView::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_view_movie")
                            .from(MovieView::Table, MovieView::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_view_user")
                            .from(MovieView::Table, MovieView::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_view_unique")
                    .table(MovieView::Table)
                    .col(MovieView::MovieId)
                    .col(MovieView::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(integer_uniq(Person::TmdbId))
                    .col(string(Person::Name))
                    .col(string_null(Person::PhotoPath))
                    .col(integer_null(Person::Gender))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCredit::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieCredit::Id))
                    .col(integer(MovieCredit::MovieId))
                    .col(integer(MovieCredit::PersonId))
                    .col(string(MovieCredit::Role))
                    .col(string_null(MovieCredit::Character))
                    .col(integer_null(MovieCredit::BillingOrder))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_credit_movie")
                            .from(MovieCredit::Table, MovieCredit::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_credit_person")
                            .from(MovieCredit::Table, MovieCredit::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_credit_unique")
                    .table(MovieCredit::Table)
                    .col(MovieCredit::MovieId)
                    .col(MovieCredit::PersonId)
                    .col(MovieCredit::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_auto(Category::Id))
                    .col(string(Category::Name))
                    .col(string(Category::CategoryType))
                    .col(string(Category::Pool))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_category_name_pool")
                    .table(Category::Table)
                    .col(Category::Name)
                    .col(Category::Pool)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Nomination::Table)
                    .if_not_exists()
                    .col(pk_auto(Nomination::Id))
                    .col(integer(Nomination::UserId))
                    .col(integer(Nomination::CategoryId))
                    .col(integer(Nomination::Rank))
                    .col(integer_null(Nomination::MovieId))
                    .col(integer_null(Nomination::MovieCreditId))
                    .col(big_integer(Nomination::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nomination_user")
                            .from(Nomination::Table, Nomination::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nomination_category")
                            .from(Nomination::Table, Nomination::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nomination_movie")
                            .from(Nomination::Table, Nomination::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nomination_movie_credit")
                            .from(Nomination::Table, Nomination::MovieCreditId)
                            .to(MovieCredit::Table, MovieCredit::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nomination_user_category_rank")
                    .table(Nomination::Table)
                    .col(Nomination::UserId)
                    .col(Nomination::CategoryId)
                    .col(Nomination::Rank)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Nomination::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Category::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCredit::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieView::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    TmdbId,
    Title,
    Year,
    PosterPath,
    Overview,
    Pool,
    OriginalLanguage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MovieView {
    Table,
    Id,
    MovieId,
    UserId,
    HasSeen,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    TmdbId,
    Name,
    PhotoPath,
    Gender,
}

#[derive(DeriveIden)]
enum MovieCredit {
    Table,
    Id,
    MovieId,
    PersonId,
    Role,
    Character,
    BillingOrder,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
    Name,
    CategoryType,
    Pool,
}

#[derive(DeriveIden)]
enum Nomination {
    Table,
    Id,
    UserId,
    CategoryId,
    Rank,
    MovieId,
    MovieCreditId,
    CreatedAt,
}
