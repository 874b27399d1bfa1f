// Season identifiers ("2023-24") and season range generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A basketball season spanning two calendar years, named by the year it
/// starts in. Displays and serializes as `YYYY-YY`, e.g. `2023-24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    start_year: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeasonError {
    #[error("season `{0}` is not in YYYY-YY form")]
    Format(String),

    #[error("season `{token}` should end in `{expected:02}`")]
    Suffix { token: String, expected: u16 },

    #[error("season start year {0} is out of range")]
    Year(u16),
}

impl Season {
    pub const MIN_YEAR: u16 = 1000;
    pub const MAX_YEAR: u16 = 9998;

    pub fn new(start_year: u16) -> Result<Self, SeasonError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&start_year) {
            return Err(SeasonError::Year(start_year));
        }
        Ok(Self { start_year })
    }

    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    /// Two-digit suffix naming the year the season ends in.
    fn end_suffix(&self) -> u16 {
        (self.start_year + 1) % 100
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, self.end_suffix())
    }
}

impl FromStr for Season {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let (year, suffix) = token
            .split_once('-')
            .ok_or_else(|| SeasonError::Format(token.to_string()))?;

        if year.len() != 4 || suffix.len() != 2 {
            return Err(SeasonError::Format(token.to_string()));
        }
        let start_year: u16 = year
            .parse()
            .map_err(|_| SeasonError::Format(token.to_string()))?;
        let end: u16 = suffix
            .parse()
            .map_err(|_| SeasonError::Format(token.to_string()))?;

        let season = Season::new(start_year)?;
        if season.end_suffix() != end {
            return Err(SeasonError::Suffix {
                token: token.to_string(),
                expected: season.end_suffix(),
            });
        }
        Ok(season)
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

/// Seasons from `start_year` down to `end_year` inclusive, most recent first.
///
/// An inverted range (`start_year < end_year`) yields no seasons.
pub fn season_range(start_year: u16, end_year: u16) -> Result<Vec<Season>, SeasonError> {
    if start_year < end_year {
        return Ok(Vec::new());
    }
    (end_year..=start_year).rev().map(Season::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_digit_suffix() {
        assert_eq!(Season::new(2023).unwrap().to_string(), "2023-24");
        assert_eq!(Season::new(1999).unwrap().to_string(), "1999-00");
        assert_eq!(Season::new(2008).unwrap().to_string(), "2008-09");
    }

    #[test]
    fn parse_round_trips_display() {
        for year in [1990, 1999, 2000, 2009, 2024] {
            let season = Season::new(year).unwrap();
            assert_eq!(season.to_string().parse::<Season>().unwrap(), season);
        }
    }

    #[test]
    fn parse_rejects_mismatched_suffix() {
        let err = "2023-25".parse::<Season>().unwrap_err();
        assert_eq!(
            err,
            SeasonError::Suffix {
                token: "2023-25".into(),
                expected: 24
            }
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("2023".parse::<Season>(), Err(SeasonError::Format(_))));
        assert!(matches!("23-24".parse::<Season>(), Err(SeasonError::Format(_))));
        assert!(matches!("abcd-ef".parse::<Season>(), Err(SeasonError::Format(_))));
        assert!(matches!("2023-2024".parse::<Season>(), Err(SeasonError::Format(_))));
    }

    #[test]
    fn range_is_descending_and_inclusive() {
        let seasons = season_range(2024, 1990).unwrap();
        assert_eq!(seasons.len(), 35);
        assert_eq!(seasons.first().unwrap().to_string(), "2024-25");
        assert_eq!(seasons.last().unwrap().to_string(), "1990-91");
        assert!(seasons.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn range_of_one_year() {
        let seasons = season_range(2010, 2010).unwrap();
        assert_eq!(seasons, vec![Season::new(2010).unwrap()]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(season_range(1990, 2024).unwrap().is_empty());
    }

    #[test]
    fn serializes_as_token() {
        let season = Season::new(2015).unwrap();
        assert_eq!(serde_json::to_string(&season).unwrap(), "\"2015-16\"");
        let back: Season = serde_json::from_str("\"2015-16\"").unwrap();
        assert_eq!(back, season);
        assert!(serde_json::from_str::<Season>("\"2015-17\"").is_err());
    }

    #[test]
    fn orders_by_start_year() {
        let mut seasons = vec![
            Season::new(2001).unwrap(),
            Season::new(1999).unwrap(),
            Season::new(2000).unwrap(),
        ];
        seasons.sort();
        let tokens: Vec<String> = seasons.iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens, vec!["1999-00", "2000-01", "2001-02"]);
    }
}
