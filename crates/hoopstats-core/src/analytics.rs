// Derived views over the combined table: per-game team rates and
// league-wide season trends. Pure functions; nothing is written back.
//
// Rows missing a required numeric field, or with zero games played, are left
// out of the view that needs them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::columns;
use crate::season::Season;
use crate::table::{Row, Table};

/// One team's per-game rate in a season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRate {
    pub team_name: String,
    pub value: f64,
}

/// One league-wide value for a season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonRate {
    pub season: Season,
    pub value: f64,
}

/// Distribution summary for a season, rounded to two decimals. A field is
/// `None` when no team in the season had a usable value for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTrendStats {
    pub season: Season,
    pub teams: usize,
    pub fg3a_mean: Option<f64>,
    /// Sample standard deviation; needs at least two teams.
    pub fg3a_std: Option<f64>,
    pub fg3_pct_mean: Option<f64>,
    pub pts_mean: Option<f64>,
}

/// Points per game for every team in `season`.
pub fn points_per_game(table: &Table, season: &Season) -> Vec<TeamRate> {
    per_game(table, season, columns::POINTS)
}

/// Three-pointers made per game for every team in `season`.
pub fn threes_made_per_game(table: &Table, season: &Season) -> Vec<TeamRate> {
    per_game(table, season, columns::THREES_MADE)
}

fn per_game(table: &Table, season: &Season, stat: &str) -> Vec<TeamRate> {
    rows_in_season(table, season)
        .filter_map(|row| {
            let team_name = row.text(columns::TEAM_NAME)?;
            let total = row.number(stat)?;
            let games = games_played(&row)?;
            Some(TeamRate {
                team_name: team_name.to_string(),
                value: total / games,
            })
        })
        .collect()
}

/// League three-point attempts per game for each season, oldest first:
/// total attempts over total games across all teams.
pub fn three_point_attempt_trend(table: &Table) -> Vec<SeasonRate> {
    let mut sums: BTreeMap<Season, (f64, f64)> = BTreeMap::new();
    for row in table.rows() {
        let Some(season) = row_season(&row) else {
            continue;
        };
        let (Some(attempts), Some(games)) = (
            row.number(columns::THREES_ATTEMPTED),
            row.number(columns::GAMES_PLAYED),
        ) else {
            continue;
        };
        let entry = sums.entry(season).or_insert((0.0, 0.0));
        entry.0 += attempts;
        entry.1 += games;
    }

    sums.into_iter()
        .filter(|(_, (_, games))| *games > 0.0)
        .map(|(season, (attempts, games))| SeasonRate {
            season,
            value: attempts / games,
        })
        .collect()
}

/// Per-season mean and spread of three-point attempts, mean three-point
/// percentage and mean points, oldest season first.
pub fn trend_statistics(table: &Table) -> Vec<SeasonTrendStats> {
    #[derive(Default)]
    struct Samples {
        teams: usize,
        fg3a: Vec<f64>,
        fg3_pct: Vec<f64>,
        pts: Vec<f64>,
    }

    let mut by_season: BTreeMap<Season, Samples> = BTreeMap::new();
    for row in table.rows() {
        let Some(season) = row_season(&row) else {
            continue;
        };
        let samples = by_season.entry(season).or_default();
        samples.teams += 1;
        if let Some(v) = row.number(columns::THREES_ATTEMPTED) {
            samples.fg3a.push(v);
        }
        if let Some(v) = row.number(columns::THREE_POINT_PCT) {
            samples.fg3_pct.push(v);
        }
        if let Some(v) = row.number(columns::POINTS) {
            samples.pts.push(v);
        }
    }

    by_season
        .into_iter()
        .map(|(season, s)| SeasonTrendStats {
            season,
            teams: s.teams,
            fg3a_mean: mean(&s.fg3a).map(round2),
            fg3a_std: sample_std(&s.fg3a).map(round2),
            fg3_pct_mean: mean(&s.fg3_pct).map(round2),
            pts_mean: mean(&s.pts).map(round2),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rows_in_season<'a>(table: &'a Table, season: &Season) -> impl Iterator<Item = Row<'a>> {
    let token = season.to_string();
    table
        .rows()
        .filter(move |row| row.text(columns::SEASON) == Some(token.as_str()))
}

fn row_season(row: &Row<'_>) -> Option<Season> {
    row.text(columns::SEASON)?.parse().ok()
}

/// Games played, if present and positive.
fn games_played(row: &Row<'_>) -> Option<f64> {
    row.number(columns::GAMES_PLAYED).filter(|gp| *gp > 0.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
