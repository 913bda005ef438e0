use std::{path::PathBuf, str::FromStr};

use anyhow::Context;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    Sqlite,
    Csv,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" | "relational" => Ok(Backend::Sqlite),
            "csv" | "flat-file" | "flat_file" => Ok(Backend::Csv),
            other => anyhow::bail!("unknown store backend {other:?}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub backend: Backend,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub provider_base_url: String,
    pub provider_access_token: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .parse()
            .context("STORE_BACKEND")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://reeltrack.db?mode=rwc".to_string());

        let data_dir =
            std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("data"));

        let provider_base_url = std::env::var("PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let provider_access_token =
            std::env::var("PROVIDER_ACCESS_TOKEN").unwrap_or_else(|_| "".to_string());

        Ok(Self { backend, database_url, data_dir, provider_base_url, provider_access_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!(" CSV ".parse::<Backend>().unwrap(), Backend::Csv);
        assert_eq!("flat-file".parse::<Backend>().unwrap(), Backend::Csv);
        assert!("postgres".parse::<Backend>().is_err());
    }
}
