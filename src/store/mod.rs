pub mod flat_file;
pub mod sql;

use async_trait::async_trait;

use crate::{
    error::IngestResult,
    models::{EntityKind, EntityRow, LinkRow, LinkTable, LocalTable, MovieRow, ViewingRow},
};

pub use flat_file::FlatFileStore;
pub use sql::SqlStore;

#[derive(Clone, Copy, Debug)]
pub enum Rows<'a> {
    Movie(&'a MovieRow),
    People(&'a [EntityRow]),
    Companies(&'a [EntityRow]),
    Links(LinkTable, &'a [LinkRow]),
    Viewing(&'a ViewingRow),
}

impl Rows<'_> {
    pub fn table_name(&self) -> &'static str {
        match self {
            Rows::Movie(_) => EntityKind::Movie.table_name(),
            Rows::People(_) => EntityKind::Person.table_name(),
            Rows::Companies(_) => EntityKind::Company.table_name(),
            Rows::Links(table, _) => table.table_name(),
            Rows::Viewing(_) => LocalTable::Personal.table_name(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Rows::Movie(_) | Rows::Viewing(_) => 1,
            Rows::People(rows) | Rows::Companies(rows) => rows.len(),
            Rows::Links(_, rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn local_high_water(&self) -> Option<(LocalTable, i64)> {
        match self {
            Rows::Links(table, rows) => {
                rows.iter().map(|r| r.id).max().map(|id| (LocalTable::Link(*table), id))
            },
            Rows::Viewing(row) => Some((LocalTable::Personal, row.id)),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    type Session: StoreSession;

    async fn begin(&self) -> IngestResult<Self::Session>;
}

#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Exact match on provider id.
    async fn exists(&self, kind: EntityKind, id: i64) -> IngestResult<bool>;

    async fn next_local_id(&self, table: LocalTable) -> IngestResult<i64>;

    async fn insert_rows(&mut self, rows: Rows<'_>) -> IngestResult<()>;

    async fn commit(self) -> IngestResult<()>;
}
