// Library root: season data acquisition, caching, aggregation and the
// derived views the dashboard serves.

pub mod analytics;
pub mod cache;
pub mod columns;
pub mod config;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod season;
pub mod table;
