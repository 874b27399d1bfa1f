// Season fetcher: the stats.nba.com team dashboard client and its cached
// front.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::config::ProviderConfig;
use crate::season::Season;
use crate::table::{Table, TableError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Endpoint path, relative to the provider base URL.
const TEAM_STATS_ENDPOINT: &str = "leaguedashteamstats";

/// Cache namespace for team dashboard responses.
pub const TEAM_STATS_NAMESPACE: &str = "league_dash_team_stats";

/// Fixed query parameters the endpoint requires besides `Season`: regular
/// season totals for every team, no filters.
const TEAM_STATS_PARAMS: &[(&str, &str)] = &[
    ("Conference", ""),
    ("DateFrom", ""),
    ("DateTo", ""),
    ("Division", ""),
    ("GameScope", ""),
    ("GameSegment", ""),
    ("LastNGames", "0"),
    ("LeagueID", "00"),
    ("Location", ""),
    ("MeasureType", "Base"),
    ("Month", "0"),
    ("OpponentTeamID", "0"),
    ("Outcome", ""),
    ("PORound", "0"),
    ("PaceAdjust", "N"),
    ("PerMode", "Totals"),
    ("Period", "0"),
    ("PlayerExperience", ""),
    ("PlayerPosition", ""),
    ("PlusMinus", "N"),
    ("Rank", "N"),
    ("SeasonSegment", ""),
    ("SeasonType", "Regular Season"),
    ("ShotClockRange", ""),
    ("StarterBench", ""),
    ("TeamID", "0"),
    ("TwoWay", "0"),
    ("VsConference", ""),
    ("VsDivision", ""),
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<TableError> for FetchError {
    fn from(e: TableError) -> Self {
        FetchError::Malformed(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Provider seam
// ---------------------------------------------------------------------------

/// Source of per-season team statistics.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetch every team's totals for `season`, with lower-cased column names.
    async fn team_stats(&self, season: &Season) -> Result<Table, FetchError>;
}

// ---------------------------------------------------------------------------
// NbaStatsClient
// ---------------------------------------------------------------------------

/// HTTP client for the stats.nba.com `leaguedashteamstats` endpoint.
pub struct NbaStatsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        // The provider rejects requests that do not look like they come from
        // its own site.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
        headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, FetchError> {
        Self::new(&config.base_url, &config.user_agent, config.timeout())
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{}", self.base_url, TEAM_STATS_ENDPOINT)
    }
}

#[async_trait]
impl StatsProvider for NbaStatsClient {
    async fn team_stats(&self, season: &Season) -> Result<Table, FetchError> {
        let season_param = season.to_string();
        let response = self
            .http
            .get(self.endpoint_url())
            .query(&[("Season", season_param.as_str())])
            .query(TEAM_STATS_PARAMS)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let table = parse_team_stats(&body)?;
        debug!(season = %season, rows = table.len(), "parsed team stats");
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", default)]
    result_sets: Option<Vec<ResultSet>>,
    /// Present instead of `resultSets` when the provider rejects a request.
    #[serde(rename = "Message", alias = "message", default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Turn a provider response body into a table built from its first result
/// set, with lower-cased column names.
pub fn parse_team_stats(body: &str) -> Result<Table, FetchError> {
    let response: StatsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let Some(result_sets) = response.result_sets else {
        return Err(match response.message {
            Some(message) => FetchError::Provider(message),
            None => FetchError::Malformed("missing resultSets".into()),
        });
    };

    let first = result_sets
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Provider("response contained no result sets".into()))?;

    Ok(Table::new(first.headers, first.row_set)?.lowercase_columns()?)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// CachedFetcher
// ---------------------------------------------------------------------------

/// A [`StatsProvider`] behind the response cache, keyed by season.
pub struct CachedFetcher<P> {
    provider: P,
    cache: ResponseCache,
    ttl: Duration,
}

impl<P: StatsProvider> CachedFetcher<P> {
    pub fn new(provider: P, cache: ResponseCache, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    /// Team stats for `season`, from the cache when a fresh entry exists.
    pub async fn fetch(&self, season: &Season) -> Result<Table, FetchError> {
        let key = season.to_string();
        self.cache
            .get_or_compute(TEAM_STATS_NAMESPACE, &key, self.ttl, || {
                self.provider.team_stats(season)
            })
            .await
    }

    /// Like [`CachedFetcher::fetch`], but a failure is logged and read as a
    /// season with no rows.
    pub async fn fetch_or_empty(&self, season: &Season) -> Table {
        match self.fetch(season).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Error fetching data for season {season}: {e}");
                Table::empty()
            }
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SAMPLE: &str = r#"{
        "resource": "leaguedashteamstats",
        "parameters": {"Season": "2023-24"},
        "resultSets": [{
            "name": "LeagueDashTeamStats",
            "headers": ["TEAM_ID", "TEAM_NAME", "GP", "PTS", "FG3M", "FG3A", "FG3_PCT"],
            "rowSet": [
                [1610612738, "Boston Celtics", 82, 9887, 1351, 3527, 0.388],
                [1610612743, "Denver Nuggets", 82, 9550, 974, 2640, 0.369]
            ]
        }]
    }"#;

    #[test]
    fn parse_lowercases_headers_and_keeps_rows() {
        let table = parse_team_stats(SAMPLE).unwrap();
        assert_eq!(
            table.columns(),
            &["team_id", "team_name", "gp", "pts", "fg3m", "fg3a", "fg3_pct"]
                .map(String::from)[..]
        );
        assert_eq!(table.len(), 2);

        let first = table.rows().next().unwrap();
        assert_eq!(first.text("team_name"), Some("Boston Celtics"));
        assert_eq!(first.number("pts"), Some(9887.0));
        assert_eq!(first.get("fg3_pct"), Some(&json!(0.388)));
    }

    #[test]
    fn parse_empty_row_set_is_empty_table() {
        let body = r#"{"resultSets":[{"name":"x","headers":["TEAM_NAME"],"rowSet":[]}]}"#;
        let table = parse_team_stats(body).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["team_name".to_string()]);
    }

    #[test]
    fn parse_provider_message_is_provider_error() {
        let body = r#"{"Message":"The field Season must match the regular expression."}"#;
        match parse_team_stats(body) {
            Err(FetchError::Provider(msg)) => assert!(msg.contains("Season")),
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn parse_no_result_sets_is_provider_error() {
        assert!(matches!(
            parse_team_stats(r#"{"resultSets":[]}"#),
            Err(FetchError::Provider(_))
        ));
    }

    #[test]
    fn parse_garbage_is_malformed() {
        assert!(matches!(parse_team_stats("<html>"), Err(FetchError::Malformed(_))));
        assert!(matches!(parse_team_stats("{}"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn parse_ragged_rows_is_malformed() {
        let body = r#"{"resultSets":[{"headers":["A","B"],"rowSet":[[1]]}]}"#;
        assert!(matches!(parse_team_stats(body), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    /// Provider that counts calls and fails for seasons before 2000.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatsProvider for CountingProvider {
        async fn team_stats(&self, season: &Season) -> Result<Table, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if season.start_year() < 2000 {
                return Err(FetchError::Provider("no data".into()));
            }
            Ok(Table::new(
                vec!["team_name".into()],
                vec![vec![json!(format!("Team {season}"))]],
            )?)
        }
    }

    fn counting_fetcher(cache: ResponseCache) -> CachedFetcher<CountingProvider> {
        CachedFetcher::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            cache,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_hits_cache() {
        let disk = crate::cache::DiskCache::in_memory().unwrap();
        let fetcher = counting_fetcher(ResponseCache::Disk(disk));
        let season = Season::new(2023).unwrap();

        let first = fetcher.fetch(&season).await.unwrap();
        let second = fetcher.fetch(&season).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_seasons_are_fetched_separately() {
        let disk = crate::cache::DiskCache::in_memory().unwrap();
        let fetcher = counting_fetcher(ResponseCache::Disk(disk));

        fetcher.fetch(&Season::new(2023).unwrap()).await.unwrap();
        fetcher.fetch(&Season::new(2022).unwrap()).await.unwrap();

        assert_eq!(fetcher.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_or_empty_swallows_provider_errors() {
        let fetcher = counting_fetcher(ResponseCache::Disabled);
        let table = fetcher.fetch_or_empty(&Season::new(1995).unwrap()).await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn failures_are_retried_on_next_call() {
        let disk = crate::cache::DiskCache::in_memory().unwrap();
        let fetcher = counting_fetcher(ResponseCache::Disk(disk));
        let season = Season::new(1995).unwrap();

        assert!(fetcher.fetch(&season).await.is_err());
        assert!(fetcher.fetch(&season).await.is_err());
        assert_eq!(fetcher.provider().calls.load(Ordering::SeqCst), 2);
    }
}
