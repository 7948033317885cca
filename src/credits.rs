use std::sync::Arc;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, sea_query::OnConflict,
};
use tracing::{debug, warn};

use crate::{
    entities::{movie_credit, person},
    error::{AppError, AppResult},
    models::CreditRole,
    tmdb::{MovieCredits, TmdbClient},
};

/// Only the top of the billing is imported as acting credits.
pub const MAX_CAST: usize = 10;

const DIRECTOR_JOB: &str = "Director";

pub async fn has_credits<C: ConnectionTrait>(db: &C, movie_id: i32) -> AppResult<bool> {
    let count = movie_credit::Entity::find()
        .filter(movie_credit::Column::MovieId.eq(movie_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Fetches credits for a movie in the background. Failures are logged only.
pub fn spawn_ingestion(db: DatabaseConnection, tmdb: Arc<TmdbClient>, movie_id: i32, tmdb_id: i32) {
    tokio::spawn(async move {
        match ingest_credits_for_movie(&db, &tmdb, movie_id, tmdb_id).await {
            Ok(stored) => debug!(movie_id = movie_id, tmdb_id = tmdb_id, stored = stored, "ingested credits"),
            Err(err) => warn!(movie_id = movie_id, tmdb_id = tmdb_id, error = %err, "failed to ingest credits"),
        }
    });
}

pub async fn ingest_credits_for_movie<C: ConnectionTrait>(
    db: &C,
    tmdb: &TmdbClient,
    movie_id: i32,
    tmdb_id: i32,
) -> AppResult<usize> {
    let credits = tmdb.get_movie_credits(tmdb_id).await?;
    store_credits(db, movie_id, &credits).await
}

/// Upserts persons and credits; running it again refreshes names, photos and
/// billing instead of duplicating rows.
pub async fn store_credits<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    credits: &MovieCredits,
) -> AppResult<usize> {
    let mut stored = 0;

    for member in credits.cast.iter().take(MAX_CAST) {
        let person_id =
            upsert_person(db, member.id, &member.name, member.profile_path.clone(), member.gender)
                .await?;
        upsert_credit(
            db,
            movie_id,
            person_id,
            CreditRole::Actor,
            member.character.clone(),
            member.order,
        )
        .await?;
        stored += 1;
    }

    for member in credits.crew.iter().filter(|c| c.job == DIRECTOR_JOB) {
        let person_id =
            upsert_person(db, member.id, &member.name, member.profile_path.clone(), member.gender)
                .await?;
        upsert_credit(db, movie_id, person_id, CreditRole::Director, None, None).await?;
        stored += 1;
    }

    Ok(stored)
}

async fn upsert_person<C: ConnectionTrait>(
    db: &C,
    tmdb_id: i32,
    name: &str,
    photo_path: Option<String>,
    gender: Option<i32>,
) -> AppResult<i32> {
    let model = person::ActiveModel {
        id: Default::default(),
        tmdb_id: Set(tmdb_id),
        name: Set(name.to_string()),
        photo_path: Set(photo_path),
        gender: Set(gender),
    };

    person::Entity::insert(model)
        .on_conflict(
            OnConflict::column(person::Column::TmdbId)
                .update_columns([
                    person::Column::Name,
                    person::Column::PhotoPath,
                    person::Column::Gender,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let person = person::Entity::find()
        .filter(person::Column::TmdbId.eq(tmdb_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("person {tmdb_id} missing after upsert")))?;
    Ok(person.id)
}

async fn upsert_credit<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    person_id: i32,
    role: CreditRole,
    character: Option<String>,
    billing_order: Option<i32>,
) -> AppResult<()> {
    let model = movie_credit::ActiveModel {
        id: Default::default(),
        movie_id: Set(movie_id),
        person_id: Set(person_id),
        role: Set(role.as_code().to_string()),
        character: Set(character),
        billing_order: Set(billing_order),
    };

    movie_credit::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                movie_credit::Column::MovieId,
                movie_credit::Column::PersonId,
                movie_credit::Column::Role,
            ])
            .update_columns([movie_credit::Column::Character, movie_credit::Column::BillingOrder])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Pool,
        test_support::{insert_movie, setup_db},
        tmdb::{CastMember, CrewMember},
    };

    fn cast(id: i32, order: i32) -> CastMember {
        CastMember {
            id,
            name: format!("Actor {id}"),
            profile_path: None,
            gender: Some(2),
            character: Some(format!("Role {id}")),
            order: Some(order),
        }
    }

    fn crew(id: i32, job: &str) -> CrewMember {
        CrewMember { id, name: format!("Crew {id}"), profile_path: None, gender: None, job: job.into() }
    }

    #[tokio::test]
    async fn stores_top_cast_and_directors() {
        let db = setup_db().await;
        let movie = insert_movie(&db, "Heat", Pool::Classic, Some("en")).await;
        let credits = MovieCredits {
            cast: (0..12).map(|i| cast(100 + i, i)).collect(),
            crew: vec![crew(900, "Director"), crew(901, "Editor")],
        };

        assert!(!has_credits(&db, movie).await.unwrap());
        let stored = store_credits(&db, movie, &credits).await.unwrap();
        assert_eq!(stored, MAX_CAST + 1);
        assert!(has_credits(&db, movie).await.unwrap());

        let directors = movie_credit::Entity::find()
            .filter(movie_credit::Column::Role.eq(CreditRole::Director.as_code()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(directors.len(), 1);
        assert_eq!(directors[0].billing_order, None);
    }

    #[tokio::test]
    async fn reingesting_updates_instead_of_duplicating() {
        let db = setup_db().await;
        let movie = insert_movie(&db, "Heat", Pool::Classic, Some("en")).await;

        store_credits(&db, movie, &MovieCredits { cast: vec![cast(7, 3)], crew: vec![] })
            .await
            .unwrap();
        store_credits(&db, movie, &MovieCredits { cast: vec![cast(7, 1)], crew: vec![] })
            .await
            .unwrap();

        let rows = movie_credit::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].billing_order, Some(1));
        assert_eq!(person::Entity::find().all(&db).await.unwrap().len(), 1);
    }
}
