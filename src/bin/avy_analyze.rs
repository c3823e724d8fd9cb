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

use avy_ratings::anomaly::{anomaly_matrices, Conditioning};
use avy_ratings::clean::{clean, missing_report};
use avy_ratings::dates::month_name;
use avy_ratings::rating::{ElevationBand, Horizon};
use avy_ratings::report::{
    render_anomaly, write_anomaly_file, write_distribution_file, write_problem_counts_file, BAND_DISTRIBUTION_FILE,
    MONTH_DISTRIBUTION_FILE, PROBLEM_COUNTS_FILE, SEASON_DISTRIBUTION_FILE,
};
use avy_ratings::stats::{by_band, by_month, by_season, problem_counts};
use avy_ratings::table::{cleaned_file_name, raw_file_name, read_table, write_table, ForecastRecord, RawRecord};
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_RAW_DIR: &str = "data/raw";
const DEFAULT_CLEANED_DIR: &str = "data/cleaned";
const DEFAULT_REPORT_DIR: &str = "data/report";

#[derive(Debug, Parser)]
#[clap(name = "avy_analyze", version = clap::crate_version!())]
struct AvyAnalyzeApplication {
    /// Forecast region that was scraped (e.g. 'sea-to-sky')
    #[clap(long)]
    region: String,

    /// Directory containing raw CSV tables written by avy_scrape
    #[clap(long, default_value_t = DEFAULT_RAW_DIR.into())]
    raw_dir: String,

    /// Directory to write cleaned CSV tables to
    #[clap(long, default_value_t = DEFAULT_CLEANED_DIR.into())]
    cleaned_dir: String,

    /// Directory to write report CSV files to
    #[clap(long, default_value_t = DEFAULT_REPORT_DIR.into())]
    report_dir: String,

    /// Rating that anomaly table rows are conditioned on. Allowed values are 'reported'
    /// (the day-of rating) and 'forecast'
    #[clap(long, default_value_t = Conditioning::default())]
    given: Conditioning,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = AvyAnalyzeApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let raw_dir = PathBuf::from(&opts.raw_dir);
    let cleaned_dir = PathBuf::from(&opts.cleaned_dir);
    let report_dir = PathBuf::from(&opts.report_dir);

    let day_of = load_and_clean(&raw_dir, &cleaned_dir, &opts.region, Horizon::DayOf);
    let one_day = load_and_clean(&raw_dir, &cleaned_dir, &opts.region, Horizon::OneDay);
    let two_day = load_and_clean(&raw_dir, &cleaned_dir, &opts.region, Horizon::TwoDay);

    let bands = by_band(&day_of);
    for band in ElevationBand::ALL {
        let dist = bands.get(band);
        tracing::info!(
            message = "danger level distribution",
            band = %band,
            days = dist.total(),
            mode = %dist.mode().map(|l| l.to_string()).unwrap_or_else(|| "none".to_owned()),
        );
    }

    let seasons = by_season(&day_of);
    let months = by_month(&day_of);
    let problems = problem_counts(&day_of);
    for (problem, mentions) in problems.iter() {
        tracing::info!(message = "avalanche problem mentions", problem = %problem, mentions = mentions);
    }

    exit_on_error(write_distribution_file(
        &report_dir.join(BAND_DISTRIBUTION_FILE),
        vec![("all".to_owned(), &bands)],
    ));
    exit_on_error(write_distribution_file(
        &report_dir.join(SEASON_DISTRIBUTION_FILE),
        seasons.iter().map(|(season, dist)| (season.to_string(), dist)),
    ));
    exit_on_error(write_distribution_file(
        &report_dir.join(MONTH_DISTRIBUTION_FILE),
        months.iter().map(|(month, dist)| (month_name(*month).to_owned(), dist)),
    ));
    exit_on_error(write_problem_counts_file(&report_dir.join(PROBLEM_COUNTS_FILE), &problems));

    for matrix in anomaly_matrices(&day_of, &one_day, &two_day, opts.given) {
        tracing::info!(
            message = "forecast anomaly",
            band = %matrix.band,
            horizon = %matrix.horizon,
            days = matrix.days(),
            agreement = %format!("{:.1}%", matrix.agreement()),
        );
        tracing::debug!("\n{}", render_anomaly(&matrix));
        exit_on_error(write_anomaly_file(&report_dir, &matrix));
    }

    tracing::info!(message = "analysis finished", region = %opts.region, report_dir = %report_dir.display());
    Ok(())
}

/// Read a raw table, log its missing values, and write the cleaned version.
fn load_and_clean(raw_dir: &Path, cleaned_dir: &Path, region: &str, horizon: Horizon) -> Vec<ForecastRecord> {
    let with_problems = horizon == Horizon::DayOf;
    let raw_path = raw_dir.join(raw_file_name(horizon, region));
    let raw = read_table(&raw_path).unwrap_or_else(|e| {
        tracing::error!(message = "unable to read raw table", error = %e);
        process::exit(1)
    });

    let report = missing_report(&raw, with_problems);
    for (column, pct) in report.columns.iter() {
        tracing::info!(
            message = "missing values",
            horizon = %horizon,
            column = %column,
            percent = %format!("{:.1}", pct),
        );
    }

    let cleaned = clean(&raw, with_problems);
    let cleaned_path = cleaned_dir.join(cleaned_file_name(horizon, region));
    let rows: Vec<RawRecord> = cleaned.records.iter().map(RawRecord::from).collect();
    exit_on_error(write_table(&cleaned_path, &rows, with_problems));

    tracing::info!(
        message = "cleaned table",
        horizon = %horizon,
        rows = report.rows,
        kept = cleaned.records.len(),
        dropped = cleaned.dropped,
        path = %cleaned_path.display(),
    );

    cleaned.records
}

fn exit_on_error<E: std::fmt::Display>(res: Result<(), E>) {
    if let Err(e) = res {
        tracing::error!(message = "unable to write output", error = %e);
        process::exit(1)
    }
}
