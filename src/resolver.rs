use std::collections::HashSet;

use tracing::debug;

use crate::{
    error::IngestResult,
    models::{Credit, EntityKind, EntityRow},
    store::StoreSession,
};

pub async fn movie_exists<S: StoreSession>(session: &S, id: i64) -> IngestResult<bool> {
    session.exists(EntityKind::Movie, id).await
}

pub async fn person_exists<S: StoreSession>(session: &S, id: i64) -> IngestResult<bool> {
    session.exists(EntityKind::Person, id).await
}

pub async fn company_exists<S: StoreSession>(session: &S, id: i64) -> IngestResult<bool> {
    session.exists(EntityKind::Company, id).await
}

/// New rows for a batch of credits, in first-seen order.
pub async fn resolve_new<'a, S, I>(
    session: &S,
    kind: EntityKind,
    candidates: I,
) -> IngestResult<Vec<EntityRow>>
where
    S: StoreSession,
    I: IntoIterator<Item = &'a Credit>,
{
    let mut seen = HashSet::new();
    let batch: Vec<&Credit> = candidates
        .into_iter()
        .filter(|credit| credit.id.is_some_and(|id| seen.insert(id)))
        .collect();

    let mut fresh = Vec::with_capacity(batch.len());
    for credit in batch {
        let Some(id) = credit.id else {
            continue;
        };
        if session.exists(kind, id).await? {
            debug!(table = kind.table_name(), id = id, "already stored");
            continue;
        }
        fresh.push(EntityRow { id, name: credit.name.clone() });
    }

    Ok(fresh)
}
