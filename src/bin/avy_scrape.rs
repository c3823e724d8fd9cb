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

use avy_ratings::browser::ChromeDriver;
use avy_ratings::config::ScrapeInputs;
use avy_ratings::dates::{date_range, forecast_season_dates};
use avy_ratings::locator::AvalancheCanadaLocator;
use avy_ratings::rating::Horizon;
use avy_ratings::scrape::Scraper;
use avy_ratings::table::{raw_file_name, raw_tables, write_table};
use chrono::NaiveDate;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_OUT_DIR: &str = "data/raw";
const DEFAULT_INITIAL_DELAY_MILLIS: u64 = 3000;
const DEFAULT_PAGE_DELAY_MILLIS: u64 = 5000;

#[derive(Debug, Parser)]
#[clap(name = "avy_scrape", version = clap::crate_version!())]
struct AvyScrapeApplication {
    /// Forecast region to scrape, as it appears in archive URLs (e.g. 'sea-to-sky')
    #[clap(long)]
    region: Option<String>,

    /// First date to scrape, YYYY-MM-DD
    #[clap(long)]
    start_date: Option<NaiveDate>,

    /// Last date to scrape (inclusive), YYYY-MM-DD
    #[clap(long)]
    end_date: Option<NaiveDate>,

    /// Show the browser window while scraping instead of running headless
    #[clap(long)]
    show_browser: bool,

    /// JSON file with 'region', 'start_date', 'end_date', and 'show_browser_window'
    /// values. Flags given on the command line take precedence.
    #[clap(long)]
    inputs: Option<PathBuf>,

    /// Scrape every date in the range, not only November through April
    #[clap(long)]
    all_months: bool,

    /// Directory to write raw CSV tables to
    #[clap(long, default_value_t = DEFAULT_OUT_DIR.into())]
    out_dir: String,

    /// Base URL of the forecast archive
    #[clap(long, default_value_t = AvalancheCanadaLocator::DEFAULT_BASE_URL.into())]
    archive_url: String,

    /// Pause after loading the first page, in milliseconds
    #[clap(long, default_value_t = DEFAULT_INITIAL_DELAY_MILLIS)]
    initial_delay_millis: u64,

    /// Pause after loading each following page, in milliseconds
    #[clap(long, default_value_t = DEFAULT_PAGE_DELAY_MILLIS)]
    page_delay_millis: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = AvyScrapeApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let from_file = match &opts.inputs {
        Some(path) => ScrapeInputs::load(path).unwrap_or_else(|e| {
            tracing::error!(message = "unable to load scrape inputs", path = %path.display(), error = %e);
            process::exit(1)
        }),
        None => ScrapeInputs::default(),
    };

    let settings = from_file
        .overlay(ScrapeInputs {
            region: opts.region.clone(),
            start_date: opts.start_date,
            end_date: opts.end_date,
            show_browser_window: if opts.show_browser { Some(true) } else { None },
        })
        .resolve()
        .unwrap_or_else(|e| {
            tracing::error!(message = "invalid scrape inputs", error = %e);
            process::exit(1)
        });

    let locator = AvalancheCanadaLocator::new(&opts.archive_url).unwrap_or_else(|e| {
        tracing::error!(message = "invalid archive URL", error = %e);
        process::exit(1)
    });

    let dates = if opts.all_months {
        date_range(settings.start_date, settings.end_date)
    } else {
        forecast_season_dates(settings.start_date, settings.end_date)
    };

    if dates.is_empty() {
        tracing::warn!(
            message = "no forecast season dates in range",
            start_date = %settings.start_date,
            end_date = %settings.end_date,
        );
        return Ok(());
    }

    tracing::info!(
        message = "scrape started",
        region = %settings.region,
        start_date = %settings.start_date,
        end_date = %settings.end_date,
        dates = dates.len(),
    );

    let driver = ChromeDriver::launch(settings.show_browser_window)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(message = "unable to launch browser", error = %e);
            process::exit(1)
        });

    let scraper = Scraper::new(locator, &settings.region).with_delays(
        Duration::from_millis(opts.initial_delay_millis),
        Duration::from_millis(opts.page_delay_millis),
    );

    let output = scraper.scrape(driver, &dates).await.unwrap_or_else(|e| {
        tracing::error!(message = "scrape failed", region = %settings.region, error = %e);
        process::exit(1)
    });

    tracing::info!(
        message = "scrape finished",
        region = %settings.region,
        dates = output.len(),
        published = output.published(),
    );

    let out_dir = PathBuf::from(&opts.out_dir);
    for (horizon, records) in raw_tables(&output) {
        let path = out_dir.join(raw_file_name(horizon, &settings.region));
        write_table(&path, &records, horizon == Horizon::DayOf).unwrap_or_else(|e| {
            tracing::error!(message = "unable to write raw table", error = %e);
            process::exit(1)
        });

        tracing::info!(message = "wrote raw table", horizon = %horizon, rows = records.len(), path = %path.display());
    }

    Ok(())
}
