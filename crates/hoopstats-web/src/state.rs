// Application state shared by every request handler.

use std::sync::Arc;

use hoopstats_core::config::ServerConfig;
use hoopstats_core::pipeline::CombinedTable;
use hoopstats_core::season::Season;
use hoopstats_core::table::Table;

/// Everything the handlers read. Constructed once after the combined table
/// is fully built, then shared behind an `Arc`; never mutated.
#[derive(Debug)]
pub struct AppState {
    combined: CombinedTable,
    title: String,
    export_filename: String,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(combined: CombinedTable, title: impl Into<String>, export_filename: impl Into<String>) -> Self {
        Self {
            combined,
            title: title.into(),
            export_filename: export_filename.into(),
        }
    }

    pub fn from_config(combined: CombinedTable, server: &ServerConfig) -> Self {
        Self::new(combined, &server.title, &server.export_filename)
    }

    pub fn table(&self) -> &Table {
        self.combined.table()
    }

    /// Seasons available for selection, in table order (newest first).
    pub fn seasons(&self) -> &[Season] {
        self.combined.seasons()
    }

    /// Initially selected season: the first one in the table.
    pub fn default_season(&self) -> Option<Season> {
        self.seasons().first().copied()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn export_filename(&self) -> &str {
        &self.export_filename
    }
}
