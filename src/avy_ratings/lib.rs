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

//! Scrape and analyze historical avalanche danger ratings
//!
//! ## Features
//!
//! `avy_ratings` collects the danger ratings published in the [Avalanche Canada] forecast archive
//! for a region and a range of dates, and measures how well the one and two day out forecasts
//! predicted the rating that was eventually reported for each day. It is made of two programs.
//!
//! * `avy_scrape` - Drives a Chromium browser through each archive page and writes three raw
//!   CSV tables: the day-of ratings (with the avalanche problem text), and the one and two day
//!   out forecasts.
//! * `avy_analyze` - Cleans the raw tables, then writes distributions of danger levels by
//!   elevation band, season and month, counts of avalanche problem types, and a forecast
//!   anomaly table for each elevation band and horizon.
//!
//! Each elevation band (alpine, treeline, below treeline) gets a rating from 1 (Low) to
//! 5 (Extreme). An anomaly table has one row per reported level and one column per forecast
//! level. Each cell is the percentage of days with that reported level where the forecast
//! had been the column level. Rows for levels that were never reported are all zero and have
//! an `observed_days` of 0.
//!
//! [Avalanche Canada]: https://www.avalanche.ca/forecasts/archives/
//!
//! ## Build
//!
//! `avy_ratings` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//! Scraping requires a Chrome or Chromium install that can be found on the `PATH`.
//!
//! ```text
//! git clone git@github.com:56quarters/avy_ratings.git && cd avy_ratings
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Scraping
//!
//! Pick a region slug as it appears in archive URLs (for example `sea-to-sky`) and a date
//! range. Only forecast season months (November through April) are visited unless
//! `--all-months` is given.
//!
//! ```text
//! ./avy_scrape --region sea-to-sky --start-date 2019-12-01 --end-date 2020-04-30
//! ```
//!
//! The same values can be kept in a JSON file and passed with `--inputs`. Flags given on the
//! command line take precedence over the file.
//!
//! ```json
//! {"region": "sea-to-sky", "start_date": "2019-12-01", "end_date": "2020-04-30", "show_browser_window": "No"}
//! ```
//!
//! Scraping is deliberately slow: there is a pause after every page load so that the page can
//! finish rendering. Raw tables are written to `data/raw` by default.
//!
//! ### Analysis
//!
//! ```text
//! ./avy_analyze --region sea-to-sky
//! ```
//!
//! Cleaned tables are written to `data/cleaned` and reports to `data/report`. Pass
//! `--given forecast` to condition anomaly rows on the forecast level instead of the
//! reported level.
//!

pub mod anomaly;
pub mod browser;
pub mod clean;
pub mod config;
pub mod dates;
pub mod locator;
pub mod rating;
pub mod report;
pub mod scrape;
pub mod stats;
pub mod table;
