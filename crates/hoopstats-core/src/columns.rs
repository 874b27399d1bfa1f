// Normalized (lower-cased) column names the pipeline and analytics rely on.

/// Added by the pipeline to every fetched row.
pub const SEASON: &str = "season";

pub const TEAM_NAME: &str = "team_name";
pub const GAMES_PLAYED: &str = "gp";
pub const POINTS: &str = "pts";
pub const THREES_MADE: &str = "fg3m";
pub const THREES_ATTEMPTED: &str = "fg3a";
pub const THREE_POINT_PCT: &str = "fg3_pct";
