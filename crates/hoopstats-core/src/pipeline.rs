// Aggregation pipeline: fetch every season in turn, stamp rows with their
// season, and concatenate into the combined table served by the dashboard.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::columns;
use crate::fetch::{CachedFetcher, StatsProvider};
use crate::season::{season_range, Season, SeasonError};
use crate::table::Table;

/// Rows shown in the startup preview log.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data fetched for any of the {attempted} requested seasons")]
    NoData { attempted: usize },

    #[error(transparent)]
    Season(#[from] SeasonError),
}

/// All team-season rows that were fetched, plus the seasons that produced
/// them in fetch order. Built once; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    table: Table,
    seasons: Vec<Season>,
}

impl CombinedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Seasons with at least one row, most recent first.
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Drives a [`CachedFetcher`] across a season range with a fixed pause
/// between requests.
pub struct Pipeline<P> {
    fetcher: CachedFetcher<P>,
    request_delay: Duration,
}

impl<P: StatsProvider> Pipeline<P> {
    pub fn new(fetcher: CachedFetcher<P>, request_delay: Duration) -> Self {
        Self {
            fetcher,
            request_delay,
        }
    }

    pub fn fetcher(&self) -> &CachedFetcher<P> {
        &self.fetcher
    }

    /// Fetch seasons `start_year` down to `end_year` and combine them.
    pub async fn build_combined_table(
        &self,
        start_year: u16,
        end_year: u16,
    ) -> Result<CombinedTable, PipelineError> {
        let seasons = season_range(start_year, end_year)?;
        self.build_for_seasons(&seasons).await
    }

    /// Fetch `seasons` in order and combine the non-empty results.
    ///
    /// A failed or empty season is logged and skipped. Returns
    /// [`PipelineError::NoData`] when nothing at all was fetched.
    pub async fn build_for_seasons(
        &self,
        seasons: &[Season],
    ) -> Result<CombinedTable, PipelineError> {
        if let (Some(first), Some(last)) = (seasons.first(), seasons.last()) {
            info!(
                "Fetching data for {} seasons from {first} to {last}",
                seasons.len()
            );
        }

        let mut collected = Vec::new();
        let mut fetched = Vec::new();
        let mut failed = 0usize;

        for (i, season) in seasons.iter().enumerate() {
            info!("Fetching data for season: {season}");
            match self.fetcher.fetch(season).await {
                Ok(table) if table.is_empty() => {
                    info!("No rows returned for season {season}");
                }
                Ok(table) => {
                    collected.push(
                        table.with_constant_column(columns::SEASON, Value::String(season.to_string())),
                    );
                    fetched.push(*season);
                }
                Err(e) => {
                    failed += 1;
                    warn!("Error fetching data for season {season}: {e}");
                }
            }

            if i + 1 < seasons.len() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        if collected.is_empty() {
            warn!("No data fetched ({failed} of {} seasons failed)", seasons.len());
            return Err(PipelineError::NoData {
                attempted: seasons.len(),
            });
        }

        let table = Table::concat(collected);
        info!(
            "Successfully fetched data for {} seasons ({} rows, {failed} failed)",
            fetched.len(),
            table.len()
        );
        log_preview(&table);

        Ok(CombinedTable {
            table,
            seasons: fetched,
        })
    }
}

fn log_preview(table: &Table) {
    debug!("{}", table.columns().join(","));
    for row in table.rows().take(PREVIEW_ROWS) {
        let cells: Vec<String> = row.cells().iter().map(Value::to_string).collect();
        debug!("{}", cells.join(","));
    }
}
