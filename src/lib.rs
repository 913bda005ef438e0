pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ingest;
pub mod links;
pub mod mapper;
pub mod models;
pub mod resolver;
pub mod source;
pub mod store;
