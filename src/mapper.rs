use serde_json::Value;

use crate::{
    error::{IngestError, IngestResult},
    models::{Credit, MappedMovie, MovieRow, Role},
    source::{CreditEntry, MovieDocument, RawId},
};

pub const LIST_SEPARATOR: &str = ";";

pub fn map_document(doc: &MovieDocument) -> IngestResult<MappedMovie> {
    let id = doc
        .id
        .as_ref()
        .and_then(RawId::resolve)
        .ok_or_else(|| IngestError::MalformedDocument("movie id is missing".to_string()))?;

    let movie = MovieRow {
        id,
        title: non_blank(&doc.title).unwrap_or_default(),
        runtime: doc.runtimes.iter().find_map(runtime_minutes),
        budget: non_blank(&doc.box_office.budget),
        opening_weekend: non_blank(&doc.box_office.opening_weekend),
        worldwide_gross: non_blank(&doc.box_office.worldwide_gross),
        rating: doc.rating,
        votes: doc.votes,
        cover_url: non_blank(&doc.cover_url),
        cover_url_full: non_blank(&doc.full_size_cover_url),
        plot_outline: non_blank(&doc.plot_outline),
        year: doc.year,
        plot: doc.plot.iter().map(|p| p.trim()).find(|p| !p.is_empty()).map(str::to_string),
        synopsis: non_blank(&doc.synopsis),
        locations: join_list(&doc.locations),
        genres: join_list(&doc.genres).unwrap_or_default(),
    };

    let credits = Role::ALL
        .into_iter()
        .map(|role| (role, doc.credits(role).iter().map(to_credit).collect()))
        .collect();

    let companies = doc.production_companies.iter().map(to_credit).collect();

    Ok(MappedMovie { movie, credits, companies })
}

fn to_credit(entry: &CreditEntry) -> Credit {
    Credit {
        id: entry.id.as_ref().and_then(RawId::resolve),
        name: non_blank(&entry.name).unwrap_or_default(),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn join_list(items: &[String]) -> Option<String> {
    let joined = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);
    (!joined.is_empty()).then_some(joined)
}

// Runtimes arrive as minutes, optionally qualified by region ("USA:134").
fn runtime_minutes(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.rsplit(':').next()?.trim().parse().ok(),
        _ => None,
    }
}
