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

use crate::rating::{BandRatings, DangerLevel, ElevationBand, Rating};
use crate::table::{columns, ForecastRecord, RawRecord, NO_PROBLEM_TEXT};

/// Share of missing cells per column of a raw table, as percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingReport {
    pub rows: usize,
    pub columns: Vec<(String, f64)>,
}

/// Percent of rows missing a value in each column. Status code 0 counts as present here,
/// matching what a reader of the raw file would see.
pub fn missing_report(records: &[RawRecord], with_problems: bool) -> MissingReport {
    let names = columns(with_problems);
    let mut missing = vec![0usize; names.len()];

    for r in records {
        let mut cells = vec![r.date_valid.is_none()];
        for band in ElevationBand::ALL {
            cells.push(r.status(band).map_or(true, str::is_empty));
            cells.push(r.status_code(band).is_none());
        }
        if with_problems {
            cells.push(r.problems.as_deref().map_or(true, str::is_empty));
        }

        for (count, is_missing) in missing.iter_mut().zip(cells) {
            if is_missing {
                *count += 1;
            }
        }
    }

    let rows = records.len();
    let columns = names
        .into_iter()
        .zip(missing)
        .map(|(name, count)| {
            let pct = if rows == 0 { 0.0 } else { count as f64 / rows as f64 * 100.0 };
            (name, pct)
        })
        .collect();

    MissingReport { rows, columns }
}

/// Result of cleaning one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub records: Vec<ForecastRecord>,
    pub dropped: usize,
}

/// Drop every row missing a date or any band rating (status code 0 is missing) and,
/// when `fill_problems` is set, replace absent problem text with [`NO_PROBLEM_TEXT`].
///
/// Nothing is corrected or interpolated. Cleaning an already cleaned table returns it
/// unchanged.
pub fn clean(records: &[RawRecord], fill_problems: bool) -> Cleaned {
    let mut out = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for r in records {
        match complete(r, fill_problems) {
            Some(rec) => out.push(rec),
            None => dropped += 1,
        }
    }

    Cleaned { records: out, dropped }
}

fn complete(r: &RawRecord, fill_problems: bool) -> Option<ForecastRecord> {
    let date_valid = r.date_valid?;
    let rating = |band: ElevationBand| -> Option<Rating> {
        let level = r.status_code(band).and_then(DangerLevel::from_code)?;
        let label = r
            .status(band)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| level.label());
        Some(Rating::new(label, level))
    };

    let ratings = BandRatings {
        alpine: rating(ElevationBand::Alpine)?,
        treeline: rating(ElevationBand::Treeline)?,
        below_treeline: rating(ElevationBand::BelowTreeline)?,
    };

    let problems = r.problems.clone().filter(|p| !p.trim().is_empty());
    let problems = if fill_problems {
        Some(problems.unwrap_or_else(|| NO_PROBLEM_TEXT.to_owned()))
    } else {
        problems
    };

    Some(ForecastRecord {
        date_valid,
        ratings,
        problems,
    })
}

#[cfg(test)]
mod test {
    use super::{clean, missing_report};
    use crate::rating::DangerLevel;
    use crate::table::{RawRecord, NO_PROBLEM_TEXT};
    use chrono::NaiveDate;

    fn raw(day: u32, codes: [Option<u8>; 3], problems: Option<&str>) -> RawRecord {
        let label = |c: Option<u8>| c.and_then(DangerLevel::from_code).map(|l| l.label().to_owned());
        RawRecord {
            date_valid: NaiveDate::from_ymd_opt(2020, 1, day),
            alpine_status: label(codes[0]),
            alpine_status_code: codes[0],
            treeline_status: label(codes[1]),
            treeline_status_code: codes[1],
            belowtree_status: label(codes[2]),
            belowtree_status_code: codes[2],
            problems: problems.map(String::from),
        }
    }

    #[test]
    fn test_clean_drops_missing_and_zero() {
        let records = vec![
            raw(1, [Some(2), Some(2), Some(1)], Some("Wind slab")),
            raw(2, [None, None, None], None),
            raw(3, [Some(3), Some(0), Some(1)], None),
            raw(4, [Some(3), Some(3), Some(2)], None),
        ];

        let cleaned = clean(&records, true);

        assert_eq!(2, cleaned.records.len());
        assert_eq!(2, cleaned.dropped);
        assert_eq!(Some("Wind slab".to_owned()), cleaned.records[0].problems);
        assert_eq!(Some(NO_PROBLEM_TEXT.to_owned()), cleaned.records[1].problems);
        assert_eq!(DangerLevel::Considerable, cleaned.records[1].ratings.alpine.level);
    }

    #[test]
    fn test_clean_without_fill() {
        let cleaned = clean(&[raw(1, [Some(1), Some(1), Some(1)], None)], false);
        assert_eq!(None, cleaned.records[0].problems);
    }

    #[test]
    fn test_clean_fills_missing_label() {
        let mut r = raw(1, [Some(4), Some(4), Some(4)], None);
        r.treeline_status = None;

        let cleaned = clean(&[r], false);
        assert_eq!("High", cleaned.records[0].ratings.treeline.label);
    }

    #[test]
    fn test_clean_idempotent() {
        let records = vec![
            raw(1, [Some(2), Some(2), Some(1)], Some("Storm slab")),
            raw(2, [Some(0), Some(2), Some(1)], None),
            raw(3, [Some(5), Some(4), Some(3)], None),
        ];

        let once = clean(&records, true);
        let again_raw: Vec<RawRecord> = once.records.iter().map(RawRecord::from).collect();
        let twice = clean(&again_raw, true);

        assert_eq!(0, twice.dropped);
        assert_eq!(once.records, twice.records);
    }

    #[test]
    fn test_missing_report() {
        let records = vec![
            raw(1, [Some(2), Some(2), Some(1)], Some("Wind slab")),
            raw(2, [None, None, None], None),
        ];

        let report = missing_report(&records, true);

        assert_eq!(2, report.rows);
        assert_eq!(("date_valid".to_owned(), 0.0), report.columns[0]);
        assert_eq!(("alpine_status_code".to_owned(), 50.0), report.columns[2]);
        assert_eq!(("problems".to_owned(), 50.0), report.columns[7]);
    }

    #[test]
    fn test_missing_report_empty() {
        let report = missing_report(&[], false);
        assert_eq!(0, report.rows);
        assert!(report.columns.iter().all(|(_, pct)| *pct == 0.0));
    }
}
