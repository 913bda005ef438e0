use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Rows, Store, StoreSession};
use crate::{
    error::IngestResult,
    models::{EntityKind, LocalTable},
};

#[derive(Clone, Debug)]
pub struct FlatFileStore {
    dir: PathBuf,
}

impl FlatFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> IngestResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Store for FlatFileStore {
    type Session = FlatFileSession;

    async fn begin(&self) -> IngestResult<FlatFileSession> {
        Ok(FlatFileSession { dir: self.dir.clone() })
    }
}

pub struct FlatFileSession {
    dir: PathBuf,
}

impl FlatFileSession {
    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn counter_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.seq"))
    }

    // Unparsable first fields, e.g. a legacy header row, are skipped.
    fn scan_ids(&self, table: &str) -> IngestResult<Vec<i64>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader =
            csv::ReaderBuilder::new().has_headers(false).flexible(true).from_path(&path)?;

        let mut ids = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(id) = record.get(0).and_then(|f| f.trim().parse::<i64>().ok()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    // A counter left behind by an append whose counter write failed must not
    // hand out ids already in the table.
    fn last_id(&self, table: &str) -> IngestResult<i64> {
        let counter_path = self.counter_path(table);
        let counter = if counter_path.exists() {
            let raw = fs::read_to_string(&counter_path)?;
            let parsed = raw.trim().parse::<i64>().ok();
            if parsed.is_none() {
                debug!(table = table, "unreadable counter file, reseeding from table");
            }
            parsed
        } else {
            None
        };

        let scanned = self.scan_ids(table)?.into_iter().max().unwrap_or(0);
        Ok(counter.map_or(scanned, |c| c.max(scanned)))
    }

    fn store_last_id(&self, table: &str, last: i64) -> IngestResult<()> {
        let counter = self.counter_path(table);
        let staged = self.dir.join(format!("{table}.seq.tmp"));
        fs::write(&staged, format!("{last}\n"))?;
        fs::rename(&staged, &counter)?;
        Ok(())
    }

    fn append<T: Serialize>(&self, table: &str, rows: &[T]) -> IngestResult<()> {
        let file = OpenOptions::new().create(true).append(true).open(self.table_path(table))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl StoreSession for FlatFileSession {
    async fn exists(&self, kind: EntityKind, id: i64) -> IngestResult<bool> {
        Ok(self.scan_ids(kind.table_name())?.contains(&id))
    }

    async fn next_local_id(&self, table: LocalTable) -> IngestResult<i64> {
        Ok(self.last_id(table.table_name())? + 1)
    }

    async fn insert_rows(&mut self, rows: Rows<'_>) -> IngestResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let table = rows.table_name();
        match rows {
            Rows::Movie(row) => self.append(table, std::slice::from_ref(row))?,
            Rows::People(batch) | Rows::Companies(batch) => self.append(table, batch)?,
            Rows::Links(_, batch) => self.append(table, batch)?,
            Rows::Viewing(row) => self.append(table, std::slice::from_ref(row))?,
        }

        if let Some((local, high)) = rows.local_high_water() {
            let last = self.last_id(local.table_name())?;
            self.store_last_id(local.table_name(), last.max(high))?;
        }

        debug!(table = table, rows = rows.len(), "appended rows");
        Ok(())
    }

    // Every append is already flushed.
    async fn commit(self) -> IngestResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        models::{LinkRow, LinkTable, Role, ViewingRow},
        store::conformance,
    };

    fn store() -> (FlatFileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        (FlatFileStore::open(temp.path().join("data")).unwrap(), temp)
    }

    #[tokio::test]
    async fn exists_tracks_inserts() {
        let (store, _temp) = store();
        conformance::exists_tracks_inserts(&store).await;
    }

    #[tokio::test]
    async fn local_ids_start_at_one_and_advance() {
        let (store, _temp) = store();
        conformance::local_ids_start_at_one_and_advance(&store).await;
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let (store, _temp) = store();
        conformance::empty_batches_are_no_ops(&store).await;
        assert!(!store.dir().join("production_company.csv").exists());
    }

    #[tokio::test]
    async fn rows_are_header_free_with_empty_nulls() {
        let (store, _temp) = store();
        let mut session = store.begin().await.unwrap();
        session.insert_rows(Rows::Movie(&conformance::movie(99810))).await.unwrap();
        session
            .insert_rows(Rows::Viewing(&ViewingRow {
                id: 1,
                movie_id: 99810,
                watch_date: jiff::civil::date(2023, 4, 14),
                rating: 9.0,
                method: "Blu-ray".to_string(),
            }))
            .await
            .unwrap();

        let movies = fs::read_to_string(store.dir().join("movie.csv")).unwrap();
        assert_eq!(movies, "99810,Movie 99810,100,,,,7.5,10,,,,1990,,,,Drama\n");
        let personal = fs::read_to_string(store.dir().join("personal.csv")).unwrap();
        assert_eq!(personal, "1,99810,2023-04-14,9.0,Blu-ray\n");
        let counter = fs::read_to_string(store.dir().join("personal.seq")).unwrap();
        assert_eq!(counter.trim(), "1");
    }

    #[tokio::test]
    async fn counter_is_seeded_from_existing_rows() {
        let (store, _temp) = store();
        fs::write(store.dir().join("writer.csv"), "id,movie_id,person_id\n3,1,7\n9,1,8\n").unwrap();
        fs::write(store.dir().join("movie.csv"), "0099810,Red October\n").unwrap();

        let mut session = store.begin().await.unwrap();
        let writer = LocalTable::Link(LinkTable::Role(Role::Writer));
        assert_eq!(session.next_local_id(writer).await.unwrap(), 10);
        assert!(session.exists(EntityKind::Movie, 99810).await.unwrap());

        session
            .insert_rows(Rows::Links(
                LinkTable::Role(Role::Writer),
                &[LinkRow { id: 10, movie_id: 1, target_id: 9 }],
            ))
            .await
            .unwrap();
        assert_eq!(session.next_local_id(writer).await.unwrap(), 11);
        assert!(store.dir().join("writer.seq").exists());
    }

    #[tokio::test]
    async fn stale_counter_never_reuses_stored_ids() {
        let (store, _temp) = store();
        fs::write(store.dir().join("writer.csv"), "1,1,7\n2,1,8\n3,1,9\n4,1,10\n5,1,11\n").unwrap();
        fs::write(store.dir().join("writer.seq"), "2\n").unwrap();

        let session = store.begin().await.unwrap();
        let writer = LocalTable::Link(LinkTable::Role(Role::Writer));
        assert_eq!(session.next_local_id(writer).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn counter_ahead_of_table_is_kept() {
        let (store, _temp) = store();
        fs::write(store.dir().join("personal.csv"), "1,5,2023-01-01,8.0,Cinema\n").unwrap();
        fs::write(store.dir().join("personal.seq"), "4\n").unwrap();

        let session = store.begin().await.unwrap();
        assert_eq!(session.next_local_id(LocalTable::Personal).await.unwrap(), 5);
    }
}
