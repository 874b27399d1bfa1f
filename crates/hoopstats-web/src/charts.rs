// Chart payloads returned by the JSON endpoints and drawn by the dashboard
// page.

use serde::Serialize;

use hoopstats_core::analytics::{self, SeasonRate, TeamRate};
use hoopstats_core::season::Season;
use hoopstats_core::table::Table;

/// Bar chart of one value per team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<TeamRate>,
}

/// Scatter/line chart of one value per season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeasonRate>,
}

/// Points-per-game bars for the season named by `token`. An unknown or
/// malformed season gives a chart with no bars.
pub fn points_per_game(table: &Table, token: &str) -> BarChart {
    bar_chart(
        table,
        token,
        format!("Team Points Per Game - {token}"),
        "Points Per Game",
        analytics::points_per_game,
    )
}

/// Three-pointers-made-per-game bars for the season named by `token`.
pub fn threes_per_game(table: &Table, token: &str) -> BarChart {
    bar_chart(
        table,
        token,
        format!("Team Three Pointers Made Per Game - {token}"),
        "3-Pointers Made Per Game",
        analytics::threes_made_per_game,
    )
}

/// League-wide three-point attempts per game across every season.
pub fn three_point_attempt_trend(table: &Table) -> TrendChart {
    TrendChart {
        title: "Evolution of NBA 3-Point Attempts Per Game".into(),
        x_label: "Season".into(),
        y_label: "3-Point Attempts Per Game".into(),
        points: analytics::three_point_attempt_trend(table),
    }
}

fn bar_chart(
    table: &Table,
    token: &str,
    title: String,
    y_label: &str,
    rates: fn(&Table, &Season) -> Vec<TeamRate>,
) -> BarChart {
    let bars = match token.parse::<Season>() {
        Ok(season) => rates(table, &season),
        Err(_) => Vec::new(),
    };
    BarChart {
        title,
        x_label: "Team".into(),
        y_label: y_label.into(),
        bars,
    }
}
