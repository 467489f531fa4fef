pub mod api;
pub mod batch;
pub mod boss_catalog;
pub mod config;
pub mod experience;
pub mod extractor;
pub mod persistence;
pub mod schema;
