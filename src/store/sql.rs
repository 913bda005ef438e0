use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, Set,
    TransactionTrait,
    sea_query::{Alias, Expr, Func, OnConflict, Query},
};
use tracing::debug;

use super::{Rows, Store, StoreSession};
use crate::{
    entities::{company, local_sequence, movie, person, personal},
    error::IngestResult,
    models::{EntityKind, EntityRow, LinkRow, LinkTable, LocalTable, MovieRow, ViewingRow},
};

#[derive(Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Store for SqlStore {
    type Session = SqlSession;

    async fn begin(&self) -> IngestResult<SqlSession> {
        Ok(SqlSession { txn: self.db.begin().await? })
    }
}

/// Dropping a session without `commit` rolls the transaction back.
pub struct SqlSession {
    txn: DatabaseTransaction,
}

impl SqlSession {
    async fn max_id(&self, table: &str) -> IngestResult<i64> {
        let stmt = Query::select()
            .expr_as(Func::max(Expr::col(Alias::new("id"))), Alias::new("max_id"))
            .from(Alias::new(table))
            .to_owned();
        let backend = self.txn.get_database_backend();

        let max = match self.txn.query_one(backend.build(&stmt)).await? {
            Some(row) => row.try_get::<Option<i64>>("", "max_id")?,
            None => None,
        };
        Ok(max.unwrap_or(0))
    }

    async fn insert_movie(&self, row: &MovieRow) -> IngestResult<()> {
        let model = movie::ActiveModel {
            id: Set(row.id),
            title: Set(row.title.clone()),
            runtime: Set(row.runtime),
            budget: Set(row.budget.clone()),
            opening_weekend: Set(row.opening_weekend.clone()),
            worldwide_gross: Set(row.worldwide_gross.clone()),
            rating: Set(row.rating),
            votes: Set(row.votes),
            cover_url: Set(row.cover_url.clone()),
            cover_url_full: Set(row.cover_url_full.clone()),
            plot_outline: Set(row.plot_outline.clone()),
            year: Set(row.year),
            plot: Set(row.plot.clone()),
            synopsis: Set(row.synopsis.clone()),
            locations: Set(row.locations.clone()),
            genres: Set(row.genres.clone()),
        };
        movie::Entity::insert(model).exec_without_returning(&self.txn).await?;
        Ok(())
    }

    async fn insert_people(&self, rows: &[EntityRow]) -> IngestResult<()> {
        let models = rows
            .iter()
            .map(|r| person::ActiveModel { id: Set(r.id), name: Set(r.name.clone()) });
        person::Entity::insert_many(models).exec_without_returning(&self.txn).await?;
        Ok(())
    }

    async fn insert_companies(&self, rows: &[EntityRow]) -> IngestResult<()> {
        let models = rows
            .iter()
            .map(|r| company::ActiveModel { id: Set(r.id), name: Set(r.name.clone()) });
        company::Entity::insert_many(models).exec_without_returning(&self.txn).await?;
        Ok(())
    }

    async fn insert_links(&self, table: LinkTable, rows: &[LinkRow]) -> IngestResult<()> {
        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table.table_name())).columns([
            Alias::new("id"),
            Alias::new("movie_id"),
            Alias::new(table.target_column()),
        ]);
        for row in rows {
            stmt.values([row.id.into(), row.movie_id.into(), row.target_id.into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        let backend = self.txn.get_database_backend();
        self.txn.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn insert_viewing(&self, row: &ViewingRow) -> IngestResult<()> {
        let model = personal::ActiveModel {
            id: Set(row.id),
            movie_id: Set(row.movie_id),
            watch_date: Set(row.watch_date.to_string()),
            rating: Set(row.rating),
            method: Set(row.method.clone()),
        };
        personal::Entity::insert(model).exec_without_returning(&self.txn).await?;
        Ok(())
    }

    async fn advance_counter(&self, table: LocalTable, last_id: i64) -> IngestResult<()> {
        let model = local_sequence::ActiveModel {
            table_name: Set(table.table_name().to_string()),
            last_id: Set(last_id),
        };

        local_sequence::Entity::insert(model)
            .on_conflict(
                OnConflict::column(local_sequence::Column::TableName)
                    .update_column(local_sequence::Column::LastId)
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StoreSession for SqlSession {
    async fn exists(&self, kind: EntityKind, id: i64) -> IngestResult<bool> {
        let found = match kind {
            EntityKind::Movie => movie::Entity::find_by_id(id).one(&self.txn).await?.is_some(),
            EntityKind::Person => person::Entity::find_by_id(id).one(&self.txn).await?.is_some(),
            EntityKind::Company => company::Entity::find_by_id(id).one(&self.txn).await?.is_some(),
        };
        Ok(found)
    }

    async fn next_local_id(&self, table: LocalTable) -> IngestResult<i64> {
        let counter = local_sequence::Entity::find_by_id(table.table_name().to_string())
            .one(&self.txn)
            .await?;

        let last = match counter {
            Some(counter) => counter.last_id,
            None => self.max_id(table.table_name()).await?,
        };
        Ok(last + 1)
    }

    async fn insert_rows(&mut self, rows: Rows<'_>) -> IngestResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        match rows {
            Rows::Movie(row) => self.insert_movie(row).await?,
            Rows::People(batch) => self.insert_people(batch).await?,
            Rows::Companies(batch) => self.insert_companies(batch).await?,
            Rows::Links(table, batch) => self.insert_links(table, batch).await?,
            Rows::Viewing(row) => self.insert_viewing(row).await?,
        }

        if let Some((local, high)) = rows.local_high_water() {
            let last = self.next_local_id(local).await? - 1;
            self.advance_counter(local, last.max(high)).await?;
        }

        debug!(table = rows.table_name(), rows = rows.len(), "inserted rows");
        Ok(())
    }

    async fn commit(self) -> IngestResult<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{db, store::conformance};

    async fn store() -> (SqlStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", temp.path().join("test.db").display());
        let db = db::connect_and_migrate(&url).await.unwrap();
        (SqlStore::new(db), temp)
    }

    #[tokio::test]
    async fn exists_tracks_inserts() {
        let (store, _temp) = store().await;
        conformance::exists_tracks_inserts(&store).await;
    }

    #[tokio::test]
    async fn local_ids_start_at_one_and_advance() {
        let (store, _temp) = store().await;
        conformance::local_ids_start_at_one_and_advance(&store).await;
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let (store, _temp) = store().await;
        conformance::empty_batches_are_no_ops(&store).await;
    }

    #[tokio::test]
    async fn uncommitted_session_rolls_back() {
        let (store, _temp) = store().await;
        {
            let mut session = store.begin().await.unwrap();
            session.insert_rows(Rows::Movie(&conformance::movie(5))).await.unwrap();
            assert!(session.exists(EntityKind::Movie, 5).await.unwrap());
        }

        let session = store.begin().await.unwrap();
        assert!(!session.exists(EntityKind::Movie, 5).await.unwrap());
    }

    #[tokio::test]
    async fn counter_is_seeded_from_existing_rows() {
        let (store, _temp) = store().await;
        let mut session = store.begin().await.unwrap();
        session.insert_rows(Rows::Movie(&conformance::movie(1))).await.unwrap();

        // Rows written without going through the gateway leave no counter behind.
        session
            .txn
            .execute_unprepared("INSERT INTO personal VALUES (4, 1, '2023-01-01', 8.0, 'Cinema')")
            .await
            .unwrap();
        assert_eq!(session.next_local_id(LocalTable::Personal).await.unwrap(), 5);
    }
}
