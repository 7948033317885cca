use std::{collections::HashMap, future::Future, pin::Pin};

use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, warn};

use crate::{
    db::now_sec,
    eligibility::movies_by_id,
    entities::{movie_credit, nomination, person},
    error::{AppError, AppResult},
    models::{CreditBundle, HydratedNomination, NominatedItem, NominationTarget, ProposedNomination},
};

#[derive(Clone)]
pub struct NominationStore {
    db: DatabaseConnection,
}

impl NominationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `work` inside one transaction. An `Err` from `work` drops the
    /// transaction, which rolls it back.
    pub async fn with_transaction<T, F>(&self, work: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>,
    {
        let txn = self.db.begin().await?;
        let out = work(&txn).await?;
        txn.commit().await?;
        Ok(out)
    }

    /// Swaps the stored set for `(user_id, category_id)` for `entries`. The
    /// delete and the inserts commit together or not at all; concurrent saves
    /// for the same pair resolve as last write wins.
    pub async fn replace_all(
        &self,
        user_id: i32,
        category_id: i32,
        entries: &[ProposedNomination],
    ) -> AppResult<()> {
        let now = now_sec();
        let inserted = entries.len();
        let entries = entries.to_vec();

        let removed = self
            .with_transaction(move |txn| {
                Box::pin(async move {
                    let removed = nomination::Entity::delete_many()
                        .filter(nomination::Column::UserId.eq(user_id))
                        .filter(nomination::Column::CategoryId.eq(category_id))
                        .exec(txn)
                        .await?;

                    for entry in entries {
                        let model = nomination::ActiveModel {
                            id: Default::default(),
                            user_id: Set(user_id),
                            category_id: Set(category_id),
                            rank: Set(entry.rank),
                            movie_id: Set(entry.target.movie_id()),
                            movie_credit_id: Set(entry.target.movie_credit_id()),
                            created_at: Set(now),
                        };
                        nomination::Entity::insert(model).exec(txn).await?;
                    }

                    Ok::<_, AppError>(removed.rows_affected)
                })
            })
            .await?;

        debug!(
            user_id = user_id,
            category_id = category_id,
            removed = removed,
            inserted = inserted,
            "replaced nominations"
        );

        Ok(())
    }

    /// Current set for a user and category, rank ascending.
    pub async fn list(&self, user_id: i32, category_id: i32) -> AppResult<Vec<HydratedNomination>> {
        let rows = nomination::Entity::find()
            .filter(nomination::Column::UserId.eq(user_id))
            .filter(nomination::Column::CategoryId.eq(category_id))
            .order_by_asc(nomination::Column::Rank)
            .all(&self.db)
            .await?;

        self.hydrate(rows).await
    }

    /// Categories in which the user has saved at least one nomination.
    pub async fn completed_category_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        let ids = nomination::Entity::find()
            .select_only()
            .column(nomination::Column::CategoryId)
            .distinct()
            .filter(nomination::Column::UserId.eq(user_id))
            .order_by_asc(nomination::Column::CategoryId)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn hydrate(&self, rows: Vec<nomination::Model>) -> AppResult<Vec<HydratedNomination>> {
        let mut targeted = Vec::with_capacity(rows.len());
        for row in rows {
            match NominationTarget::from_columns(row.movie_id, row.movie_credit_id) {
                Some(target) => targeted.push((row, target)),
                None => warn!(nomination_id = row.id, "nomination has no single target, skipping"),
            }
        }

        let credit_ids: Vec<i32> = targeted.iter().filter_map(|(_, t)| t.movie_credit_id()).collect();
        let credits: HashMap<i32, (movie_credit::Model, person::Model)> = if credit_ids.is_empty() {
            HashMap::new()
        } else {
            movie_credit::Entity::find()
                .filter(movie_credit::Column::Id.is_in(credit_ids))
                .find_also_related(person::Entity)
                .all(&self.db)
                .await?
                .into_iter()
                .filter_map(|(credit, person)| person.map(|p| (credit.id, (credit, p))))
                .collect()
        };

        let mut movie_ids: Vec<i32> = targeted
            .iter()
            .filter_map(|(_, t)| t.movie_id())
            .chain(credits.values().map(|(credit, _)| credit.movie_id))
            .collect();
        movie_ids.sort_unstable();
        movie_ids.dedup();
        let movies = movies_by_id(&self.db, &movie_ids).await?;

        let mut out = Vec::with_capacity(targeted.len());
        for (row, target) in targeted {
            let item = match target {
                NominationTarget::Film(movie_id) => {
                    movies.get(&movie_id).cloned().map(|movie| NominatedItem::Film { movie })
                },
                NominationTarget::Credit(credit_id) => match credits.get(&credit_id) {
                    Some((credit, person)) => match movies.get(&credit.movie_id) {
                        Some(movie) => Some(NominatedItem::Credit {
                            movie_credit: CreditBundle::new(
                                credit.clone(),
                                person.clone(),
                                movie.clone(),
                            )?,
                        }),
                        None => None,
                    },
                    None => None,
                },
            };

            let Some(item) = item else {
                warn!(nomination_id = row.id, "nominated item no longer exists, skipping");
                continue;
            };

            out.push(HydratedNomination {
                id: row.id,
                user_id: row.user_id,
                category_id: row.category_id,
                rank: row.rank,
                item,
            });
        }

        Ok(out)
    }
}
