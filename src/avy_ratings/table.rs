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

//! Flat CSV tables of forecast records.
//!
//! Raw tables hold rows exactly as scraped, including placeholders with nothing but a
//! date. Cleaned tables use the same columns and only contain complete rows.

use crate::rating::{BandRatings, ElevationBand, Horizon, Rating};
use crate::scrape::{ScrapeOutput, ScrapedRow};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DATE_COLUMN: &str = "date_valid";
pub const PROBLEMS_COLUMN: &str = "problems";

/// Sentinel problem text for day-of rows that had none.
pub const NO_PROBLEM_TEXT: &str = "No Text";

#[derive(Debug)]
pub enum TableError {
    Io(PathBuf, io::Error),
    Csv(PathBuf, csv::Error),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            Self::Csv(path, e) => write!(f, "{}: {}", path.display(), e),
        }
    }
}

impl error::Error for TableError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Csv(_, e) => Some(e),
        }
    }
}

/// Column names in table order, with or without the trailing problems column.
pub fn columns(with_problems: bool) -> Vec<String> {
    let mut out = vec![DATE_COLUMN.to_owned()];
    for band in ElevationBand::ALL {
        out.push(format!("{}_status", band.column_prefix()));
        out.push(format!("{}_status_code", band.column_prefix()));
    }

    if with_problems {
        out.push(PROBLEMS_COLUMN.to_owned());
    }

    out
}

/// Region identifier as used in file names: `sea-to-sky` becomes `sea_to_sky`.
fn file_region(region: &str) -> String {
    region.replace('-', "_")
}

/// File name of the raw table for a horizon, e.g. `current_plus1_avalanche_conditions_sea_to_sky_RAW.csv`.
pub fn raw_file_name(horizon: Horizon, region: &str) -> String {
    format!("{}_avalanche_conditions_{}_RAW.csv", horizon.file_tag(), file_region(region))
}

/// File name of the cleaned table for a horizon, e.g. `current_avalanche_danger_ratings_sea_to_sky.csv`.
pub fn cleaned_file_name(horizon: Horizon, region: &str) -> String {
    format!("{}_avalanche_danger_ratings_{}.csv", horizon.file_tag(), file_region(region))
}

/// One table row. Every cell but the date may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub date_valid: Option<NaiveDate>,
    #[serde(default)]
    pub alpine_status: Option<String>,
    #[serde(default, deserialize_with = "status_code")]
    pub alpine_status_code: Option<u8>,
    #[serde(default)]
    pub treeline_status: Option<String>,
    #[serde(default, deserialize_with = "status_code")]
    pub treeline_status_code: Option<u8>,
    #[serde(default)]
    pub belowtree_status: Option<String>,
    #[serde(default, deserialize_with = "status_code")]
    pub belowtree_status_code: Option<u8>,
    #[serde(default)]
    pub problems: Option<String>,
}

impl RawRecord {
    /// Build a row from a scraped row. Multiple problem texts share one cell, one per line.
    pub fn from_scraped(row: &ScrapedRow, problems: Option<&[String]>) -> Self {
        let problems = problems.filter(|p| !p.is_empty()).map(|p| p.join("\n"));
        let status = |band: ElevationBand| row.ratings.as_ref().map(|r| r.get(band).label.clone());
        let code = |band: ElevationBand| row.ratings.as_ref().map(|r| r.get(band).level.code());

        RawRecord {
            date_valid: Some(row.date_valid),
            alpine_status: status(ElevationBand::Alpine),
            alpine_status_code: code(ElevationBand::Alpine),
            treeline_status: status(ElevationBand::Treeline),
            treeline_status_code: code(ElevationBand::Treeline),
            belowtree_status: status(ElevationBand::BelowTreeline),
            belowtree_status_code: code(ElevationBand::BelowTreeline),
            problems,
        }
    }

    pub fn status(&self, band: ElevationBand) -> Option<&str> {
        match band {
            ElevationBand::Alpine => self.alpine_status.as_deref(),
            ElevationBand::Treeline => self.treeline_status.as_deref(),
            ElevationBand::BelowTreeline => self.belowtree_status.as_deref(),
        }
    }

    pub fn status_code(&self, band: ElevationBand) -> Option<u8> {
        match band {
            ElevationBand::Alpine => self.alpine_status_code,
            ElevationBand::Treeline => self.treeline_status_code,
            ElevationBand::BelowTreeline => self.belowtree_status_code,
        }
    }

    fn cells(&self, with_problems: bool) -> Vec<String> {
        let mut out = vec![self
            .date_valid
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()];

        for band in ElevationBand::ALL {
            out.push(self.status(band).unwrap_or_default().to_owned());
            out.push(self.status_code(band).map(|c| c.to_string()).unwrap_or_default());
        }

        if with_problems {
            out.push(self.problems.clone().unwrap_or_default());
        }

        out
    }
}

/// A complete, cleaned forecast row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    pub date_valid: NaiveDate,
    pub ratings: BandRatings,
    pub problems: Option<String>,
}

impl ForecastRecord {
    pub fn rating(&self, band: ElevationBand) -> &Rating {
        self.ratings.get(band)
    }
}

impl From<&ForecastRecord> for RawRecord {
    fn from(r: &ForecastRecord) -> Self {
        RawRecord {
            date_valid: Some(r.date_valid),
            alpine_status: Some(r.ratings.alpine.label.clone()),
            alpine_status_code: Some(r.ratings.alpine.level.code()),
            treeline_status: Some(r.ratings.treeline.label.clone()),
            treeline_status_code: Some(r.ratings.treeline.level.code()),
            belowtree_status: Some(r.ratings.below_treeline.label.clone()),
            belowtree_status_code: Some(r.ratings.below_treeline.level.code()),
            problems: r.problems.clone(),
        }
    }
}

/// Raw tables for each horizon of a scrape. Only the day-of table has problem text.
pub fn raw_tables(output: &ScrapeOutput) -> Vec<(Horizon, Vec<RawRecord>)> {
    let today = output
        .today
        .iter()
        .zip(output.problems.iter())
        .map(|(row, problems)| RawRecord::from_scraped(row, Some(problems)))
        .collect();
    let plus_one = output.plus_one.iter().map(|r| RawRecord::from_scraped(r, None)).collect();
    let plus_two = output.plus_two.iter().map(|r| RawRecord::from_scraped(r, None)).collect();

    vec![
        (Horizon::DayOf, today),
        (Horizon::OneDay, plus_one),
        (Horizon::TwoDay, plus_two),
    ]
}

/// Status codes may be written as integers or as floats with a zero fraction (`2.0`).
fn status_code<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if v.fract() == 0.0 && (0.0..=5.0).contains(&v) => Ok(Some(v as u8)),
        Some(v) => Err(serde::de::Error::custom(format!("invalid danger rating code {}", v))),
    }
}

pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<RawRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    rdr.deserialize().collect()
}

pub fn write_records<W: io::Write>(writer: W, records: &[RawRecord], with_problems: bool) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns(with_problems))?;
    for r in records {
        wtr.write_record(r.cells(with_problems))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Vec<RawRecord>, TableError> {
    let file = fs::File::open(path).map_err(|e| TableError::Io(path.to_owned(), e))?;
    read_records(io::BufReader::new(file)).map_err(|e| TableError::Csv(path.to_owned(), e))
}

/// Create (or truncate) an output file, creating its parent directory if needed.
pub fn create_output(path: &Path) -> Result<io::BufWriter<fs::File>, TableError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| TableError::Io(parent.to_owned(), e))?;
        }
    }

    let file = fs::File::create(path).map_err(|e| TableError::Io(path.to_owned(), e))?;
    Ok(io::BufWriter::new(file))
}

pub fn write_table(path: &Path, records: &[RawRecord], with_problems: bool) -> Result<(), TableError> {
    let file = create_output(path)?;
    write_records(file, records, with_problems).map_err(|e| TableError::Csv(path.to_owned(), e))
}
