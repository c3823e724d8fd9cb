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

//! Descriptive statistics over cleaned day-of ratings.

use crate::dates::{Season, FORECAST_MONTHS};
use crate::rating::{DangerLevel, ElevationBand};
use crate::table::ForecastRecord;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Avalanche problem types searched for in forecaster problem text.
pub const PROBLEM_KEYWORDS: [&str; 7] = [
    "storm slab",
    "wind slab",
    "wet avalanche",
    "cornice",
    "persistent slab",
    "deep persistent",
    "wet loose",
];

/// Number of days at each danger level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Distribution {
    counts: [u32; 5],
}

impl Distribution {
    pub fn add(&mut self, level: DangerLevel) {
        self.counts[level.index()] += 1;
    }

    pub fn count(&self, level: DangerLevel) -> u32 {
        self.counts[level.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Share of days at `level`, zero when there are no days at all.
    pub fn percent(&self, level: DangerLevel) -> f64 {
        match self.total() {
            0 => 0.0,
            total => f64::from(self.count(level)) / f64::from(total) * 100.0,
        }
    }

    /// Most frequent level, the lower one on a tie.
    pub fn mode(&self) -> Option<DangerLevel> {
        DangerLevel::ALL
            .iter()
            .copied()
            .filter(|l| self.count(*l) > 0)
            .fold(None, |best: Option<DangerLevel>, l| match best {
                Some(b) if self.count(b) >= self.count(l) => Some(b),
                _ => Some(l),
            })
    }
}

/// Distributions for all three elevation bands of one group of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandDistributions {
    pub alpine: Distribution,
    pub treeline: Distribution,
    pub below_treeline: Distribution,
}

impl BandDistributions {
    fn add(&mut self, record: &ForecastRecord) {
        self.alpine.add(record.ratings.alpine.level);
        self.treeline.add(record.ratings.treeline.level);
        self.below_treeline.add(record.ratings.below_treeline.level);
    }

    pub fn get(&self, band: ElevationBand) -> &Distribution {
        match band {
            ElevationBand::Alpine => &self.alpine,
            ElevationBand::Treeline => &self.treeline,
            ElevationBand::BelowTreeline => &self.below_treeline,
        }
    }
}

pub fn by_band(records: &[ForecastRecord]) -> BandDistributions {
    let mut out = BandDistributions::default();
    for r in records {
        out.add(r);
    }

    out
}

/// Distributions per forecast season, in season order. Days outside any season are ignored.
pub fn by_season(records: &[ForecastRecord]) -> BTreeMap<Season, BandDistributions> {
    let mut out: BTreeMap<Season, BandDistributions> = BTreeMap::new();
    for r in records {
        if let Some(season) = Season::of(r.date_valid) {
            out.entry(season).or_default().add(r);
        }
    }

    out
}

/// Distributions per forecast month, in season order (November first). Months without
/// any days are included with empty distributions.
pub fn by_month(records: &[ForecastRecord]) -> Vec<(u32, BandDistributions)> {
    FORECAST_MONTHS
        .iter()
        .map(|month| {
            let mut dist = BandDistributions::default();
            for r in records.iter().filter(|r| r.date_valid.month() == *month) {
                dist.add(r);
            }
            (*month, dist)
        })
        .collect()
}

/// Problem types mentioned in `text`. Matching is case-insensitive and ignores periods.
pub fn mentioned_problems(text: &str) -> Vec<&'static str> {
    let normalized = text.to_lowercase().replace('.', "");
    PROBLEM_KEYWORDS
        .iter()
        .copied()
        .filter(|k| normalized.contains(k))
        .collect()
}

/// Number of days mentioning each problem type, most mentioned first. Problem types
/// never mentioned are left out; ties keep keyword order.
pub fn problem_counts(records: &[ForecastRecord]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = PROBLEM_KEYWORDS.iter().map(|k| (*k, 0)).collect();
    for text in records.iter().filter_map(|r| r.problems.as_deref()) {
        for problem in mentioned_problems(text) {
            if let Some(entry) = counts.iter_mut().find(|(k, _)| *k == problem) {
                entry.1 += 1;
            }
        }
    }

    counts.retain(|(_, n)| *n > 0);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
