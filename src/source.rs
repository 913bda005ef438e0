use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{IngestError, IngestResult},
    models::{Role, parse_provider_id},
};

/// Called at most once per ingestion, never retried or cached.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch(&self, movie_id: i64) -> IngestResult<MovieDocument>;
}

// Absent keys, explicit nulls and mistyped scalars all read as missing, so the
// row mapper degrades instead of the whole document failing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieDocument {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<RawId>,
    #[serde(alias = "localized_title", deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "list")]
    pub runtimes: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub box_office: BoxOffice,
    #[serde(deserialize_with = "lenient")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub votes: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub cover_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub full_size_cover_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub plot_outline: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "list")]
    pub plot: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub synopsis: Option<String>,
    #[serde(deserialize_with = "list")]
    pub locations: Vec<String>,
    #[serde(deserialize_with = "list")]
    pub genres: Vec<String>,
    #[serde(deserialize_with = "list")]
    pub cast: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub director: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub producer: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub writer: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub composer: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub cinematographer: Vec<CreditEntry>,
    #[serde(deserialize_with = "list")]
    pub production_companies: Vec<CreditEntry>,
}

impl MovieDocument {
    pub fn credits(&self, role: Role) -> &[CreditEntry] {
        match role {
            Role::Cast => &self.cast,
            Role::Director => &self.director,
            Role::Producer => &self.producer,
            Role::Writer => &self.writer,
            Role::Composer => &self.composer,
            Role::Cinematographer => &self.cinematographer,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct BoxOffice {
    #[serde(deserialize_with = "lenient")]
    pub budget: Option<String>,
    #[serde(alias = "opening_weekend_united_states", deserialize_with = "lenient")]
    pub opening_weekend: Option<String>,
    #[serde(alias = "cumulative_worldwide_gross", deserialize_with = "lenient")]
    pub worldwide_gross: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreditEntry {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<RawId>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Provider ids show up both as JSON numbers and as zero-padded strings.
#[derive(Clone, Debug, PartialEq)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn resolve(&self) -> Option<i64> {
        match self {
            RawId::Number(n) => (*n > 0).then_some(*n),
            RawId::Text(s) => parse_provider_id(s),
        }
    }
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// Null entries inside a list are skipped along with a null list.
fn list<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(de)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(other) => serde_json::from_value(other).ok(),
        None => None,
    })
}

fn lenient_id<'de, D>(de: D) -> Result<Option<RawId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_i64().map(RawId::Number),
        Some(Value::String(s)) => Some(RawId::Text(s)),
        _ => None,
    })
}

pub struct HttpSource {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String) -> Self {
        Self { client, access_token, base_url }
    }
}

#[async_trait]
impl MovieSource for HttpSource {
    async fn fetch(&self, movie_id: i64) -> IngestResult<MovieDocument> {
        let url = format!("{}/movie/{}", self.base_url.trim_end_matches('/'), movie_id);
        debug!(movie_id = movie_id, url = %url, "fetching movie document");

        let mut req = self.client.get(url);
        if !self.access_token.trim().is_empty() {
            req = req.bearer_auth(&self.access_token);
        }

        let resp = req.send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IngestError::NotFound { movie_id });
        }

        let doc = resp.error_for_status()?.json::<MovieDocument>().await.map_err(|e| {
            if e.is_decode() {
                IngestError::MalformedDocument(e.to_string())
            } else {
                IngestError::Provider(e)
            }
        })?;
        Ok(doc)
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;

    #[test]
    fn document_tolerates_missing_fields_and_mixed_ids() {
        let doc: MovieDocument = serde_json::from_value(json!({
            "id": "0099810",
            "localized_title": "The Hunt for Red October",
            "director": [{"id": 1234, "name": "John McTiernan"}],
            "writer": [{"id": "0001234", "name": "John McTiernan"}, {"name": "Uncredited"}],
            "box_office": {"opening_weekend_united_states": "$17,161,835"}
        }))
        .unwrap();

        assert_eq!(doc.id.as_ref().and_then(RawId::resolve), Some(99810));
        assert_eq!(doc.title.as_deref(), Some("The Hunt for Red October"));
        assert!(doc.box_office.budget.is_none());
        assert_eq!(doc.box_office.opening_weekend.as_deref(), Some("$17,161,835"));
        assert!(doc.cast.is_empty());
        let writers = doc.credits(Role::Writer);
        assert_eq!(writers[0].id.as_ref().and_then(RawId::resolve), Some(1234));
        assert!(writers[1].id.is_none());
    }

    #[test]
    fn nulls_and_mistyped_scalars_read_as_missing() {
        let doc: MovieDocument = serde_json::from_value(json!({
            "id": 5,
            "title": null,
            "genres": null,
            "plot": null,
            "cast": null,
            "writer": [null, {"id": null, "name": "Anonymous"}],
            "box_office": null,
            "year": "1990",
            "votes": "many",
            "rating": "7.6",
            "runtimes": [null, "120"]
        }))
        .unwrap();

        assert!(doc.title.is_none());
        assert!(doc.genres.is_empty());
        assert!(doc.plot.is_empty());
        assert!(doc.cast.is_empty());
        assert_eq!(doc.writer.len(), 1);
        assert!(doc.writer[0].id.is_none());
        assert!(doc.box_office.budget.is_none());
        assert_eq!(doc.year, Some(1990));
        assert_eq!(doc.votes, None);
        assert_eq!(doc.rating, Some(7.6));
        assert_eq!(doc.runtimes.len(), 1);
    }

    #[tokio::test]
    async fn http_source_maps_undecodable_body_to_malformed_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), String::new(), server.uri());
        let err = source.fetch(3).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument(_)));
    }

    #[tokio::test]
    async fn http_source_fetches_document_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/99810"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 99810, "title": "Red October"})),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), "secret".to_string(), server.uri());
        let doc = source.fetch(99810).await.unwrap();
        assert_eq!(doc.title.as_deref(), Some("Red October"));
    }

    #[tokio::test]
    async fn http_source_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), String::new(), server.uri());
        let err = source.fetch(42).await.unwrap_err();
        assert!(matches!(err, IngestError::NotFound { movie_id: 42 }));
    }

    #[tokio::test]
    async fn http_source_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/7"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), String::new(), format!("{}/", server.uri()));
        let err = source.fetch(7).await.unwrap_err();
        assert!(matches!(err, IngestError::Provider(_)));
    }
}
