// Library for tests to access modules

pub mod config;
pub mod context;
pub mod errors;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod routes;
pub mod stats;
pub mod version;
