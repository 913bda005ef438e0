use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::Serialize;

use crate::error::{IngestError, IngestResult};

/// Parses `"0099810"`, `"tt0099810"` or `"99810"` to the same id.
pub fn parse_provider_id(raw: &str) -> Option<i64> {
    let digits = raw.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|id| *id > 0)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Role {
    Cast,
    Director,
    Producer,
    Writer,
    Composer,
    Cinematographer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Cast,
        Role::Director,
        Role::Producer,
        Role::Writer,
        Role::Composer,
        Role::Cinematographer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Cast => "cast",
            Role::Director => "director",
            Role::Producer => "producer",
            Role::Writer => "writer",
            Role::Composer => "composer",
            Role::Cinematographer => "cinematographer",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntityKind {
    Movie,
    Person,
    Company,
}

impl EntityKind {
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Movie => "movie",
            EntityKind::Person => "person",
            EntityKind::Company => "company",
        }
    }
}

/// Junction tables between a movie and a person (per role) or a company.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LinkTable {
    Role(Role),
    ProductionCompany,
}

impl LinkTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LinkTable::Role(Role::Cast) => "moviecast",
            LinkTable::Role(Role::Director) => "director",
            LinkTable::Role(Role::Producer) => "producer",
            LinkTable::Role(Role::Writer) => "writer",
            LinkTable::Role(Role::Composer) => "composer",
            LinkTable::Role(Role::Cinematographer) => "cinematographer",
            LinkTable::ProductionCompany => "production_company",
        }
    }

    pub fn target_column(self) -> &'static str {
        match self {
            LinkTable::Role(_) => "person_id",
            LinkTable::ProductionCompany => "company_id",
        }
    }

    pub fn target_kind(self) -> EntityKind {
        match self {
            LinkTable::Role(_) => EntityKind::Person,
            LinkTable::ProductionCompany => EntityKind::Company,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LocalTable {
    Personal,
    Link(LinkTable),
}

impl LocalTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LocalTable::Personal => "personal",
            LocalTable::Link(link) => link.table_name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub runtime: Option<i64>,
    pub budget: Option<String>,
    pub opening_weekend: Option<String>,
    pub worldwide_gross: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub cover_url: Option<String>,
    pub cover_url_full: Option<String>,
    pub plot_outline: Option<String>,
    pub year: Option<i32>,
    pub plot: Option<String>,
    pub synopsis: Option<String>,
    pub locations: Option<String>,
    pub genres: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EntityRow {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewingRow {
    pub id: i64,
    pub movie_id: i64,
    pub watch_date: Date,
    pub rating: f64,
    pub method: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LinkRow {
    pub id: i64,
    pub movie_id: i64,
    pub target_id: i64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credit {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct MappedMovie {
    pub movie: MovieRow,
    pub credits: BTreeMap<Role, Vec<Credit>>,
    pub companies: Vec<Credit>,
}

impl MappedMovie {
    pub fn role_credits(&self, role: Role) -> &[Credit] {
        self.credits.get(&role).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewingRequest {
    pub movie_id: i64,
    pub watch_date: Date,
    pub rating: f64,
    pub method: String,
}

impl ViewingRequest {
    pub fn new(movie_id: &str, watch_date: &str, rating: f64, method: &str) -> IngestResult<Self> {
        let movie_id = parse_provider_id(movie_id)
            .ok_or_else(|| IngestError::InvalidRequest(format!("bad movie id {movie_id:?}")))?;
        let watch_date: Date = watch_date.trim().parse().map_err(|e| {
            IngestError::InvalidRequest(format!("bad watch date {watch_date:?}: {e}"))
        })?;
        if !rating.is_finite() {
            return Err(IngestError::InvalidRequest(format!("bad rating {rating}")));
        }
        let method = method.trim();
        if method.is_empty() {
            return Err(IngestError::InvalidRequest("viewing method is required".to_string()));
        }

        Ok(Self { movie_id, watch_date, rating, method: method.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_ignore_prefix_and_leading_zeros() {
        assert_eq!(parse_provider_id("0099810"), Some(99810));
        assert_eq!(parse_provider_id("tt0099810"), Some(99810));
        assert_eq!(parse_provider_id(" 99810 "), Some(99810));
        assert_eq!(parse_provider_id("0000"), None);
        assert_eq!(parse_provider_id("12ab"), None);
        assert_eq!(parse_provider_id(""), None);
    }

    #[test]
    fn viewing_request_validates_inputs() {
        let req = ViewingRequest::new("0099810", "2023-04-14", 9.0, " Blu-ray ").unwrap();
        assert_eq!(req.movie_id, 99810);
        assert_eq!(req.watch_date, jiff::civil::date(2023, 4, 14));
        assert_eq!(req.method, "Blu-ray");

        assert!(matches!(
            ViewingRequest::new("abc", "2023-04-14", 9.0, "Blu-ray"),
            Err(IngestError::InvalidRequest(_))
        ));
        assert!(ViewingRequest::new("1", "14/04/2023", 9.0, "Blu-ray").is_err());
        assert!(ViewingRequest::new("1", "2023-04-14", f64::NAN, "Blu-ray").is_err());
        assert!(ViewingRequest::new("1", "2023-04-14", 7.5, "  ").is_err());
    }

    #[test]
    fn link_tables_name_their_target() {
        assert_eq!(LinkTable::Role(Role::Cast).table_name(), "moviecast");
        assert_eq!(LinkTable::Role(Role::Writer).target_column(), "person_id");
        assert_eq!(LinkTable::ProductionCompany.target_kind(), EntityKind::Company);
        assert_eq!(LocalTable::Personal.table_name(), "personal");
    }
}
