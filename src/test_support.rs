use std::sync::atomic::{AtomicI32, Ordering};

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::{
    entities::{category, movie, movie_credit, movie_view, person, users},
    models::{CategoryType, CreditRole, Pool},
};

static NEXT_EXTERNAL_ID: AtomicI32 = AtomicI32::new(1_000);

fn next_external_id() -> i32 {
    NEXT_EXTERNAL_ID.fetch_add(1, Ordering::Relaxed)
}

pub async fn setup_db() -> DatabaseConnection {
    crate::db::connect_and_migrate("sqlite::memory:").await.unwrap()
}

pub async fn insert_user(db: &DatabaseConnection, name: &str) -> i32 {
    users::ActiveModel { name: Set(name.to_string()), created_at: Set(0), ..Default::default() }
        .insert(db)
        .await
        .unwrap()
        .id
}

/// Creates `n` fresh users and returns their ids.
pub async fn insert_users(db: &DatabaseConnection, n: usize) -> Vec<i32> {
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        ids.push(insert_user(db, &format!("viewer-{}", next_external_id())).await);
    }
    ids
}

pub async fn insert_movie(
    db: &DatabaseConnection,
    title: &str,
    pool: Pool,
    original_language: Option<&str>,
) -> i32 {
    movie::ActiveModel {
        tmdb_id: Set(next_external_id()),
        title: Set(title.to_string()),
        year: Set(None),
        poster_path: Set(None),
        overview: Set(None),
        pool: Set(pool.as_code().to_string()),
        original_language: Set(original_language.map(str::to_string)),
        created_at: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn add_views(db: &DatabaseConnection, movie_id: i32, user_ids: &[i32]) {
    for &user_id in user_ids {
        movie_view::ActiveModel {
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            has_seen: Set(false),
            created_at: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }
}

/// Movie in `pool` seen by `viewers` brand-new users.
pub async fn movie_with_viewers(
    db: &DatabaseConnection,
    title: &str,
    pool: Pool,
    viewers: usize,
) -> i32 {
    let id = insert_movie(db, title, pool, Some("en")).await;
    let users = insert_users(db, viewers).await;
    add_views(db, id, &users).await;
    id
}

pub async fn insert_person(db: &DatabaseConnection, name: &str, gender: Option<i32>) -> i32 {
    person::ActiveModel {
        tmdb_id: Set(next_external_id()),
        name: Set(name.to_string()),
        photo_path: Set(None),
        gender: Set(gender),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_credit(
    db: &DatabaseConnection,
    movie_id: i32,
    person_id: i32,
    role: CreditRole,
    billing_order: Option<i32>,
) -> i32 {
    movie_credit::ActiveModel {
        movie_id: Set(movie_id),
        person_id: Set(person_id),
        role: Set(role.as_code().to_string()),
        character: Set(None),
        billing_order: Set(billing_order),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_category(
    db: &DatabaseConnection,
    name: &str,
    category_type: CategoryType,
    pool: Pool,
) -> i32 {
    category::ActiveModel {
        name: Set(name.to_string()),
        category_type: Set(category_type.as_code().to_string()),
        pool: Set(pool.as_code().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// Id of one of the categories seeded by the migrations.
pub async fn seeded_category(db: &DatabaseConnection, name: &str, pool: Pool) -> i32 {
    category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .filter(category::Column::Pool.eq(pool.as_code()))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .id
}
