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

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    Missing(&'static str),
    DateOrder { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "unable to read inputs: {}", e),
            Self::Parse(e) => write!(f, "invalid inputs: {}", e),
            Self::Missing(field) => write!(f, "missing required input '{}'", field),
            Self::DateOrder { start, end } => write!(f, "start date {} is after end date {}", start, end),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Scrape inputs, as read from an inputs file or built from command line flags.
///
/// Every field is optional so that a file and flags can be layered. The file uses the
/// same keys as the fields, for example:
///
/// ```json
/// {"region": "sea-to-sky", "start_date": "2019-12-01", "end_date": "2020-04-15", "show_browser_window": "No"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScrapeInputs {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "yes_no")]
    pub show_browser_window: Option<bool>,
}

impl ScrapeInputs {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&json)
    }

    /// Combine with `overrides`, preferring any value set there.
    pub fn overlay(self, overrides: ScrapeInputs) -> Self {
        ScrapeInputs {
            region: overrides.region.or(self.region),
            start_date: overrides.start_date.or(self.start_date),
            end_date: overrides.end_date.or(self.end_date),
            show_browser_window: overrides.show_browser_window.or(self.show_browser_window),
        }
    }

    /// Validate and fill defaults. Region and both dates are required, the browser
    /// window is hidden unless requested.
    pub fn resolve(self) -> Result<ScrapeSettings, ConfigError> {
        let region = self.region.filter(|r| !r.trim().is_empty()).ok_or(ConfigError::Missing("region"))?;
        let start_date = self.start_date.ok_or(ConfigError::Missing("start_date"))?;
        let end_date = self.end_date.ok_or(ConfigError::Missing("end_date"))?;

        if start_date > end_date {
            return Err(ConfigError::DateOrder {
                start: start_date,
                end: end_date,
            });
        }

        Ok(ScrapeSettings {
            region: region.trim().to_owned(),
            start_date,
            end_date,
            show_browser_window: self.show_browser_window.unwrap_or(false),
        })
    }
}

/// Validated scrape inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub region: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub show_browser_window: bool,
}

/// Accept `true`/`false` as well as the strings `"Yes"`/`"No"` (any case).
fn yes_no<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Some(true)),
            "no" | "n" | "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("expected Yes or No, got '{}'", other))),
        },
    }
}
