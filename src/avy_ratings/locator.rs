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

//! Where things live on the forecast archive page.
//!
//! The archive is a client-side rendered application. Ratings are only reachable through
//! the SVG elevation diagram and a handful of generated CSS class names, all of which change
//! whenever the site is rebuilt. Everything that depends on that markup is kept behind the
//! [`PageLocator`] trait so that a markup change means updating a single implementation.

use crate::rating::ElevationBand;
use chrono::NaiveDate;
use std::error;
use std::fmt;
use url::Url;

#[derive(Debug)]
pub enum LocatorError {
    InvalidUrl(String, url::ParseError),
    NotABase(String),
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url, e) => write!(f, "invalid archive URL '{}': {}", url, e),
            Self::NotABase(url) => write!(f, "archive URL '{}' cannot have a path", url),
        }
    }
}

impl error::Error for LocatorError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidUrl(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Locations of the forecast data on an archive page for a single date.
pub trait PageLocator {
    /// URL of the archived forecast for `region` published on `date`.
    fn url(&self, region: &str, date: NaiveDate) -> String;

    /// XPath of the day-of rating text for an elevation band.
    fn band_xpath(&self, band: ElevationBand) -> &str;

    /// XPath of the outlook ratings. It must match six elements, ordered alpine, treeline
    /// and below treeline for the next day followed by the same bands for the day after.
    fn outlook_xpath(&self) -> &str;

    /// XPath of the free-text avalanche problem blocks.
    fn problems_xpath(&self) -> &str;
}

/// Locator for the Avalanche Canada forecast archive.
#[derive(Debug, Clone)]
pub struct AvalancheCanadaLocator {
    base_url: Url,
}

impl AvalancheCanadaLocator {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.avalanche.ca/forecasts/archives/";

    const ALPINE: &'static str = "//*[@id='app']//*[@transform = 'translate(385 211)']//*[@x = '70']";
    const TREELINE: &'static str = "//*[@id='app']//*[@transform = 'translate(405 261)']//*[@x = '70']";
    const BELOW_TREELINE: &'static str = "//*[@id='app']//*[@transform = 'translate(425 311)']//*[@x = '70']";
    const OUTLOOK: &'static str = "//*[@id='app']//*[@class='_2tSd']//*[@class='Xgfa undefined _2j-o _2iRE']";
    const PROBLEMS: &'static str = "//*[@id='app']//*[@class='_1rb7']";

    /// Locator for an archive at `base_url`. Region and date are appended as path
    /// segments, any query string is kept.
    pub fn new(base_url: &str) -> Result<Self, LocatorError> {
        let parsed = Url::parse(base_url).map_err(|e| LocatorError::InvalidUrl(base_url.to_owned(), e))?;
        if parsed.cannot_be_a_base() {
            return Err(LocatorError::NotABase(base_url.to_owned()));
        }

        Ok(AvalancheCanadaLocator { base_url: parsed })
    }
}

impl Default for AvalancheCanadaLocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL).expect("default archive URL is valid")
    }
}

impl PageLocator for AvalancheCanadaLocator {
    fn url(&self, region: &str, date: NaiveDate) -> String {
        let mut url = self.base_url.clone();
        url.set_fragment(None);
        // Checked in new(): the base URL always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(region).push(&date.format("%Y-%m-%d").to_string());
        }

        url.into()
    }

    fn band_xpath(&self, band: ElevationBand) -> &str {
        match band {
            ElevationBand::Alpine => Self::ALPINE,
            ElevationBand::Treeline => Self::TREELINE,
            ElevationBand::BelowTreeline => Self::BELOW_TREELINE,
        }
    }

    fn outlook_xpath(&self) -> &str {
        Self::OUTLOOK
    }

    fn problems_xpath(&self) -> &str {
        Self::PROBLEMS
    }
}
