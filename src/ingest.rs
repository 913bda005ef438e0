use tracing::{debug, info, warn};

use crate::{
    error::{IngestError, IngestResult},
    links, mapper,
    models::{EntityKind, LinkRow, LinkTable, LocalTable, Role, ViewingRequest, ViewingRow},
    resolver,
    source::MovieSource,
    store::{Rows, Store, StoreSession},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IngestPath {
    /// Movie already stored: only the viewing is appended, nothing is fetched.
    PersonalOnly,
    FullIngest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IngestReport {
    pub movie_id: i64,
    pub path: IngestPath,
    pub viewing_id: i64,
    pub new_people: usize,
    pub new_companies: usize,
    pub links: usize,
}

/// On the flat-file backend rows appended before a failure stay.
pub struct Ingestor<S, P> {
    store: S,
    source: P,
}

impl<S, P> Ingestor<S, P>
where
    S: Store,
    P: MovieSource,
{
    pub fn new(store: S, source: P) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn ingest(&self, request: &ViewingRequest) -> IngestResult<IngestReport> {
        let mut session = self.store.begin().await?;

        debug!(movie_id = request.movie_id, "checking for duplicate movie");
        let report = if resolver::movie_exists(&session, request.movie_id).await? {
            info!(movie_id = request.movie_id, "duplicate movie, adding personal viewing only");
            let viewing_id = append_viewing(&mut session, request).await?;
            IngestReport {
                movie_id: request.movie_id,
                path: IngestPath::PersonalOnly,
                viewing_id,
                new_people: 0,
                new_companies: 0,
                links: 0,
            }
        } else {
            self.full_ingest(&mut session, request).await?
        };

        session.commit().await?;

        info!(
            movie_id = report.movie_id,
            path = ?report.path,
            viewing_id = report.viewing_id,
            new_people = report.new_people,
            new_companies = report.new_companies,
            links = report.links,
            "ingestion complete"
        );
        Ok(report)
    }

    async fn full_ingest(
        &self,
        session: &mut S::Session,
        request: &ViewingRequest,
    ) -> IngestResult<IngestReport> {
        let movie_id = request.movie_id;

        let doc = self.source.fetch(movie_id).await?;
        let mapped = mapper::map_document(&doc)?;
        if mapped.movie.id != movie_id {
            return Err(IngestError::MalformedDocument(format!(
                "requested movie {movie_id} but document describes {}",
                mapped.movie.id
            )));
        }

        let people = resolver::resolve_new(
            &*session,
            EntityKind::Person,
            Role::ALL.into_iter().flat_map(|role| mapped.role_credits(role)),
        )
        .await?;
        let companies =
            resolver::resolve_new(&*session, EntityKind::Company, &mapped.companies).await?;
        debug!(
            movie_id = movie_id,
            new_people = people.len(),
            new_companies = companies.len(),
            "resolved identities"
        );

        let tables = Role::ALL.map(LinkTable::Role).into_iter().chain([LinkTable::ProductionCompany]);
        let mut link_sets: Vec<(LinkTable, Vec<LinkRow>)> = Vec::new();
        for table in tables {
            let credits = match table {
                LinkTable::Role(role) => mapped.role_credits(role),
                LinkTable::ProductionCompany => mapped.companies.as_slice(),
            };
            let dropped = links::missing_ids(credits);
            if dropped > 0 {
                warn!(
                    movie_id = movie_id,
                    table = table.table_name(),
                    dropped = dropped,
                    "skipping credits without a provider id"
                );
            }
            let first_id = session.next_local_id(LocalTable::Link(table)).await?;
            link_sets.push((table, links::build_links(movie_id, credits, first_id)));
        }

        session.insert_rows(Rows::Movie(&mapped.movie)).await?;
        session.insert_rows(Rows::People(&people)).await?;
        session.insert_rows(Rows::Companies(&companies)).await?;
        for (table, rows) in &link_sets {
            session.insert_rows(Rows::Links(*table, rows)).await?;
        }
        let viewing_id = append_viewing(session, request).await?;

        Ok(IngestReport {
            movie_id,
            path: IngestPath::FullIngest,
            viewing_id,
            new_people: people.len(),
            new_companies: companies.len(),
            links: link_sets.iter().map(|(_, rows)| rows.len()).sum(),
        })
    }
}

/// Viewings are never deduplicated; every call appends one.
async fn append_viewing<T: StoreSession>(
    session: &mut T,
    request: &ViewingRequest,
) -> IngestResult<i64> {
    let id = session.next_local_id(LocalTable::Personal).await?;
    let row = ViewingRow {
        id,
        movie_id: request.movie_id,
        watch_date: request.watch_date,
        rating: request.rating,
        method: request.method.clone(),
    };
    session.insert_rows(Rows::Viewing(&row)).await?;
    Ok(id)
}
