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

//! CSV report files produced by the analysis stage.

use crate::anomaly::AnomalyMatrix;
use crate::rating::{DangerLevel, ElevationBand};
use crate::stats::BandDistributions;
use crate::table::{create_output, TableError};
use std::fmt::Write as _;
use std::io;
use std::path::Path;

pub const BAND_DISTRIBUTION_FILE: &str = "distribution_by_band.csv";
pub const SEASON_DISTRIBUTION_FILE: &str = "distribution_by_season.csv";
pub const MONTH_DISTRIBUTION_FILE: &str = "distribution_by_month.csv";
pub const PROBLEM_COUNTS_FILE: &str = "problem_counts.csv";

/// File name for an anomaly matrix, e.g. `anomaly_treeline_two_day.csv`.
pub fn anomaly_file_name(m: &AnomalyMatrix) -> String {
    format!("anomaly_{}_{}.csv", m.band.column_prefix(), m.horizon.slug())
}

fn percent_cell(v: f64) -> String {
    format!("{:.1}", v)
}

pub fn write_anomaly<W: io::Write>(writer: W, m: &AnomalyMatrix) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![m.given.to_string(), "observed_days".to_owned()];
    header.extend(DangerLevel::ALL.iter().map(|l| format!("level_{}", l.code())));
    wtr.write_record(&header)?;

    for row in DangerLevel::ALL {
        let mut cells = vec![row.code().to_string(), m.observed(row).to_string()];
        cells.extend(m.row_percentages(row).iter().map(|v| percent_cell(*v)));
        wtr.write_record(&cells)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write one anomaly matrix as `<dir>/anomaly_<band>_<horizon>.csv`.
pub fn write_anomaly_file(dir: &Path, m: &AnomalyMatrix) -> Result<(), TableError> {
    let path = dir.join(anomaly_file_name(m));
    let file = create_output(&path)?;
    write_anomaly(file, m).map_err(|e| TableError::Csv(path, e))
}

/// Write distributions in long format: `group, band, level, days, percent`.
pub fn write_distributions<'a, W, I>(writer: W, groups: I) -> Result<(), csv::Error>
where
    W: io::Write,
    I: IntoIterator<Item = (String, &'a BandDistributions)>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["group", "band", "level", "days", "percent"])?;

    for (group, dist) in groups {
        for band in ElevationBand::ALL {
            let d = dist.get(band);
            for level in DangerLevel::ALL {
                wtr.write_record([
                    group.clone(),
                    band.column_prefix().to_owned(),
                    level.code().to_string(),
                    d.count(level).to_string(),
                    percent_cell(d.percent(level)),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_distribution_file<'a, I>(path: &Path, groups: I) -> Result<(), TableError>
where
    I: IntoIterator<Item = (String, &'a BandDistributions)>,
{
    let file = create_output(path)?;
    write_distributions(file, groups).map_err(|e| TableError::Csv(path.to_owned(), e))
}

pub fn write_problem_counts<W: io::Write>(writer: W, counts: &[(&str, usize)]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["problem", "mentions"])?;
    for (problem, n) in counts {
        wtr.write_record([problem.to_string(), n.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_problem_counts_file(path: &Path, counts: &[(&str, usize)]) -> Result<(), TableError> {
    let file = create_output(path)?;
    write_problem_counts(file, counts).map_err(|e| TableError::Csv(path.to_owned(), e))
}

/// Plain text rendering of an anomaly matrix for logs and terminals.
pub fn render_anomaly(m: &AnomalyMatrix) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} forecast anomaly (rows: {} rating, {} days)",
        m.band,
        m.horizon,
        m.given,
        m.days()
    );
    let _ = write!(out, "{:>6} {:>6}", "", "days");
    for col in DangerLevel::ALL {
        let _ = write!(out, " {:>7}", col.code());
    }
    let _ = writeln!(out);

    for row in DangerLevel::ALL.iter().rev() {
        let _ = write!(out, "{:>6} {:>6}", row.code(), m.observed(*row));
        for v in m.row_percentages(*row) {
            if m.is_observed(*row) {
                let _ = write!(out, " {:>6.1}%", v);
            } else {
                let _ = write!(out, " {:>7}", "-");
            }
        }
        let _ = writeln!(out);
    }

    out
}

#[cfg(test)]
mod test {
    use super::{anomaly_file_name, render_anomaly, write_anomaly, write_distributions};
    use crate::anomaly::{anomaly_matrix, Conditioning};
    use crate::rating::{BandRatings, DangerLevel, ElevationBand, Horizon};
    use crate::stats::by_band;
    use crate::table::ForecastRecord;
    use chrono::NaiveDate;

    fn record(day: u32, code: u8) -> ForecastRecord {
        let level = DangerLevel::from_code(code).unwrap();
        ForecastRecord {
            date_valid: NaiveDate::from_ymd_opt(2020, 2, day).unwrap(),
            ratings: BandRatings {
                alpine: level.into(),
                treeline: level.into(),
                below_treeline: level.into(),
            },
            problems: None,
        }
    }

    #[test]
    fn test_write_anomaly() {
        let day_of = vec![record(1, 2), record(2, 2), record(3, 3)];
        let forecast = vec![record(1, 2), record(2, 3), record(3, 3)];
        let m = anomaly_matrix(&day_of, &forecast, ElevationBand::Alpine, Horizon::OneDay, Conditioning::Reported);

        let mut buf = Vec::new();
        write_anomaly(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!("anomaly_alpine_one_day.csv", anomaly_file_name(&m));
        assert_eq!(
            "reported,observed_days,level_1,level_2,level_3,level_4,level_5\n\
             1,0,0.0,0.0,0.0,0.0,0.0\n\
             2,2,0.0,50.0,50.0,0.0,0.0\n\
             3,1,0.0,0.0,100.0,0.0,0.0\n\
             4,0,0.0,0.0,0.0,0.0,0.0\n\
             5,0,0.0,0.0,0.0,0.0,0.0\n",
            text
        );
    }

    #[test]
    fn test_write_distributions() {
        let records = vec![record(1, 1), record(2, 2)];
        let dist = by_band(&records);

        let mut buf = Vec::new();
        write_distributions(&mut buf, vec![("all".to_owned(), &dist)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(16, lines.len());
        assert_eq!("group,band,level,days,percent", lines[0]);
        assert_eq!("all,alpine,1,1,50.0", lines[1]);
        assert_eq!("all,belowtree,5,0,0.0", lines[15]);
    }

    #[test]
    fn test_render_anomaly_marks_unobserved() {
        let day_of = vec![record(1, 1)];
        let forecast = vec![record(1, 1)];
        let m = anomaly_matrix(&day_of, &forecast, ElevationBand::Treeline, Horizon::TwoDay, Conditioning::Reported);

        let text = render_anomaly(&m);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(7, lines.len());
        assert!(lines[0].starts_with("Treeline two day out forecast anomaly"));
        assert_eq!("     5      0       -       -       -       -       -", lines[2]);
        assert_eq!("     1      1  100.0%    0.0%    0.0%    0.0%    0.0%", lines[6]);
    }
}
