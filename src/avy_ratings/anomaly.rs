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

//! Forecast anomaly: how often an N-day-out forecast matched the rating that was
//! eventually reported for the same day.
//!
//! Day-of and forecast rows are joined on their valid date. For each elevation band the
//! joined pairs are cross-tabulated into a 5x5 table of day counts, and each row of that
//! table is normalized to percentages of the days in the row.
//!
//! A row with no days (for example, no day was ever reported at Extreme) has no
//! meaningful percentages. Those rows are reported as all zero and flagged as
//! unobserved through [`AnomalyMatrix::is_observed`], so "no data" can be told apart
//! from "never happens". No level is treated specially.

use crate::rating::{DangerLevel, ElevationBand, Horizon};
use crate::table::ForecastRecord;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const LEVELS: usize = DangerLevel::ALL.len();

/// Which rating the rows of an anomaly matrix are conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conditioning {
    /// Rows are the reported (day-of) rating: "when the rating was i, what had been forecast?"
    #[default]
    Reported,
    /// Rows are the forecast rating: "when i was forecast, what was reported?"
    Forecast,
}

impl fmt::Display for Conditioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported => write!(f, "reported"),
            Self::Forecast => write!(f, "forecast"),
        }
    }
}

impl FromStr for Conditioning {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reported" => Ok(Self::Reported),
            "forecast" => Ok(Self::Forecast),
            other => Err(format!("unknown conditioning '{}', expected 'reported' or 'forecast'", other)),
        }
    }
}

/// Cross-tabulation of reported against forecast ratings for one band and horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyMatrix {
    pub band: ElevationBand,
    pub horizon: Horizon,
    pub given: Conditioning,
    counts: [[u32; LEVELS]; LEVELS],
}

impl AnomalyMatrix {
    fn new(band: ElevationBand, horizon: Horizon, given: Conditioning) -> Self {
        AnomalyMatrix {
            band,
            horizon,
            given,
            counts: [[0; LEVELS]; LEVELS],
        }
    }

    fn record(&mut self, reported: DangerLevel, forecast: DangerLevel) {
        let (row, col) = match self.given {
            Conditioning::Reported => (reported, forecast),
            Conditioning::Forecast => (forecast, reported),
        };

        self.counts[row.index()][col.index()] += 1;
    }

    /// Days where the conditioning rating was `row` and the other rating was `col`.
    pub fn count(&self, row: DangerLevel, col: DangerLevel) -> u32 {
        self.counts[row.index()][col.index()]
    }

    /// Days where the conditioning rating was `row`.
    pub fn observed(&self, row: DangerLevel) -> u32 {
        self.counts[row.index()].iter().sum()
    }

    pub fn is_observed(&self, row: DangerLevel) -> bool {
        self.observed(row) > 0
    }

    /// Total number of joined days.
    pub fn days(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Percentage of the `row` days where the other rating was `col`. Zero for unobserved rows.
    pub fn percent(&self, row: DangerLevel, col: DangerLevel) -> f64 {
        match self.observed(row) {
            0 => 0.0,
            total => f64::from(self.count(row, col)) / f64::from(total) * 100.0,
        }
    }

    /// Percentages for every column of a row, in level order.
    pub fn row_percentages(&self, row: DangerLevel) -> [f64; LEVELS] {
        let mut out = [0.0; LEVELS];
        for col in DangerLevel::ALL {
            out[col.index()] = self.percent(row, col);
        }

        out
    }

    /// Share of joined days where forecast and report agreed.
    pub fn agreement(&self) -> f64 {
        let days = self.days();
        if days == 0 {
            return 0.0;
        }

        let matched: u32 = DangerLevel::ALL.iter().map(|l| self.count(*l, *l)).sum();
        f64::from(matched) / f64::from(days) * 100.0
    }
}

/// Pair day-of rows with forecast rows valid for the same date. Pairs follow the order
/// of `day_of`; dates present in only one table are skipped.
pub fn align<'a>(
    day_of: &'a [ForecastRecord],
    forecast: &'a [ForecastRecord],
) -> Vec<(&'a ForecastRecord, &'a ForecastRecord)> {
    let mut by_date: HashMap<NaiveDate, Vec<&ForecastRecord>> = HashMap::new();
    for f in forecast {
        by_date.entry(f.date_valid).or_default().push(f);
    }

    let mut out = Vec::new();
    for d in day_of {
        if let Some(matches) = by_date.get(&d.date_valid) {
            out.extend(matches.iter().map(|f| (d, *f)));
        }
    }

    out
}

/// Anomaly matrix for one band from day-of rows and forecast rows at `horizon`.
pub fn anomaly_matrix(
    day_of: &[ForecastRecord],
    forecast: &[ForecastRecord],
    band: ElevationBand,
    horizon: Horizon,
    given: Conditioning,
) -> AnomalyMatrix {
    let mut matrix = AnomalyMatrix::new(band, horizon, given);
    for (reported, predicted) in align(day_of, forecast) {
        matrix.record(reported.rating(band).level, predicted.rating(band).level);
    }

    matrix
}

/// Anomaly matrices for every band at the one and two day horizons, ordered by band and
/// then horizon.
pub fn anomaly_matrices(
    day_of: &[ForecastRecord],
    one_day: &[ForecastRecord],
    two_day: &[ForecastRecord],
    given: Conditioning,
) -> Vec<AnomalyMatrix> {
    let mut out = Vec::with_capacity(ElevationBand::ALL.len() * 2);
    for band in ElevationBand::ALL {
        out.push(anomaly_matrix(day_of, one_day, band, Horizon::OneDay, given));
        out.push(anomaly_matrix(day_of, two_day, band, Horizon::TwoDay, given));
    }

    out
}
