// avy_ratings - Scrape and analyze historical avalanche danger ratings
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use std::error;
use std::fmt;

/// Avalanche danger level on the public 1 (Low) to 5 (Extreme) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DangerLevel {
    Low = 1,
    Moderate = 2,
    Considerable = 3,
    High = 4,
    Extreme = 5,
}

impl DangerLevel {
    pub const ALL: [DangerLevel; 5] = [
        DangerLevel::Low,
        DangerLevel::Moderate,
        DangerLevel::Considerable,
        DangerLevel::High,
        DangerLevel::Extreme,
    ];

    /// Convert a status code to a level. Code 0 and anything above 5 have no level.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::Moderate),
            3 => Some(Self::Considerable),
            4 => Some(Self::High),
            5 => Some(Self::Extreme),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Zero based position of this level, for indexing 5 element tables.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Considerable => "Considerable",
            Self::High => "High",
            Self::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Elevation band rated independently in each forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElevationBand {
    Alpine,
    Treeline,
    BelowTreeline,
}

impl ElevationBand {
    pub const ALL: [ElevationBand; 3] = [ElevationBand::Alpine, ElevationBand::Treeline, ElevationBand::BelowTreeline];

    /// Prefix used for this band in table column names (`<prefix>_status`, `<prefix>_status_code`).
    pub fn column_prefix(self) -> &'static str {
        match self {
            Self::Alpine => "alpine",
            Self::Treeline => "treeline",
            Self::BelowTreeline => "belowtree",
        }
    }
}

impl fmt::Display for ElevationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpine => write!(f, "Alpine"),
            Self::Treeline => write!(f, "Treeline"),
            Self::BelowTreeline => write!(f, "Below Treeline"),
        }
    }
}

/// How far ahead of the valid date a set of ratings was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    DayOf,
    OneDay,
    TwoDay,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::DayOf, Horizon::OneDay, Horizon::TwoDay];

    /// Number of days between publication and the valid date.
    pub fn days(self) -> u64 {
        match self {
            Self::DayOf => 0,
            Self::OneDay => 1,
            Self::TwoDay => 2,
        }
    }

    /// Short name used in report file names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::DayOf => "day_of",
            Self::OneDay => "one_day",
            Self::TwoDay => "two_day",
        }
    }

    /// Fragment used to build table file names for this horizon.
    pub fn file_tag(self) -> &'static str {
        match self {
            Self::DayOf => "current",
            Self::OneDay => "current_plus1",
            Self::TwoDay => "current_plus2",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayOf => write!(f, "day of"),
            Self::OneDay => write!(f, "one day out"),
            Self::TwoDay => write!(f, "two day out"),
        }
    }
}

/// A single band rating as published: the page's label and its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub label: String,
    pub level: DangerLevel,
}

impl Rating {
    pub fn new<S: Into<String>>(label: S, level: DangerLevel) -> Self {
        Rating {
            label: label.into(),
            level,
        }
    }
}

impl From<DangerLevel> for Rating {
    fn from(level: DangerLevel) -> Self {
        Rating::new(level.label(), level)
    }
}

/// Ratings for all three elevation bands of one forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandRatings {
    pub alpine: Rating,
    pub treeline: Rating,
    pub below_treeline: Rating,
}

impl BandRatings {
    pub fn get(&self, band: ElevationBand) -> &Rating {
        match band {
            ElevationBand::Alpine => &self.alpine,
            ElevationBand::Treeline => &self.treeline,
            ElevationBand::BelowTreeline => &self.below_treeline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingParseError {
    text: String,
}

impl fmt::Display for RatingParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed danger rating '{}'", self.text)
    }
}

impl error::Error for RatingParseError {}

/// Parse rating text shown on the archive page.
///
/// The page renders ratings as `"<code> - <label>"` (e.g. `"3 - Considerable"`). The
/// reversed `"<label> - <code>"` form is accepted as well. Anything else, including a
/// code outside 1-5, is an error.
pub fn parse_rating(text: &str) -> Result<Rating, RatingParseError> {
    let err = || RatingParseError { text: text.to_owned() };
    let (left, right) = text.trim().split_once(" - ").ok_or_else(err)?;
    let (left, right) = (left.trim(), right.trim());

    let (code, label) = match (left.parse::<u8>(), right.parse::<u8>()) {
        (Ok(code), _) => (code, right),
        (_, Ok(code)) => (code, left),
        _ => return Err(err()),
    };

    if label.is_empty() {
        return Err(err());
    }

    DangerLevel::from_code(code)
        .map(|level| Rating::new(label, level))
        .ok_or_else(err)
}

#[cfg(test)]
mod test {
    use super::{parse_rating, DangerLevel, Horizon, Rating};

    #[test]
    fn test_parse_rating_code_first() {
        assert_eq!(Rating::new("Low", DangerLevel::Low), parse_rating("1 - Low").unwrap());
        assert_eq!(
            Rating::new("Considerable", DangerLevel::Considerable),
            parse_rating(" 3 - Considerable\n").unwrap()
        );
    }

    #[test]
    fn test_parse_rating_label_first() {
        assert_eq!(Rating::new("High", DangerLevel::High), parse_rating("High - 4").unwrap());
    }

    #[test]
    fn test_parse_rating_malformed() {
        assert!(parse_rating("Low").is_err());
        assert!(parse_rating("Low - High").is_err());
        assert!(parse_rating("0 - No Rating").is_err());
        assert!(parse_rating("6 - Unknown").is_err());
        assert!(parse_rating("2 - ").is_err());
        assert!(parse_rating("").is_err());
    }

    #[test]
    fn test_danger_level_codes() {
        for level in DangerLevel::ALL {
            assert_eq!(Some(level), DangerLevel::from_code(level.code()));
        }
        assert_eq!(None, DangerLevel::from_code(0));
        assert_eq!(4, DangerLevel::Extreme.index());
    }

    #[test]
    fn test_horizon_days() {
        assert_eq!(vec![0, 1, 2], Horizon::ALL.iter().map(|h| h.days()).collect::<Vec<_>>());
    }
}
