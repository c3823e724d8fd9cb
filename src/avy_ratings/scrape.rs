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

use crate::browser::{BrowserError, PageDriver};
use crate::locator::PageLocator;
use crate::rating::{parse_rating, BandRatings, ElevationBand, Horizon, RatingParseError};
use chrono::{Days, NaiveDate};
use std::error;
use std::fmt;
use std::time::Duration;

/// Number of outlook ratings on a page: three bands for each of the next two days.
const OUTLOOK_RATINGS: usize = 6;

#[derive(Debug)]
pub enum ScrapeError {
    Browser(BrowserError),
    Rating { date: NaiveDate, source: RatingParseError },
    IncompleteOutlook { date: NaiveDate, found: usize },
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser(e) => write!(f, "{}", e),
            Self::Rating { date, source } => write!(f, "{} for {}", source, date),
            Self::IncompleteOutlook { date, found } => write!(
                f,
                "expected {} outlook ratings for {}, found {}",
                OUTLOOK_RATINGS, date, found
            ),
        }
    }
}

impl error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Browser(e) => Some(e),
            Self::Rating { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<BrowserError> for ScrapeError {
    fn from(e: BrowserError) -> Self {
        Self::Browser(e)
    }
}

/// One scraped row: the date a forecast is valid for and its band ratings.
///
/// Rows without ratings are placeholders for pages that had nothing to scrape. They keep
/// their position in the output and are dropped when the tables are cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRow {
    pub date_valid: NaiveDate,
    pub ratings: Option<BandRatings>,
}

impl ScrapedRow {
    pub fn placeholder(date_valid: NaiveDate) -> Self {
        ScrapedRow {
            date_valid,
            ratings: None,
        }
    }

    /// Row as table cells: the date, then label and code for each band. Placeholders
    /// only have the date.
    pub fn fields(&self) -> Vec<String> {
        let mut out = vec![self.date_valid.format("%Y-%m-%d").to_string()];
        if let Some(ratings) = &self.ratings {
            for band in ElevationBand::ALL {
                let rating = ratings.get(band);
                out.push(rating.label.clone());
                out.push(rating.level.code().to_string());
            }
        }

        out
    }
}

/// Everything scraped in a run as four sequences aligned by index with the input dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOutput {
    pub today: Vec<ScrapedRow>,
    pub plus_one: Vec<ScrapedRow>,
    pub plus_two: Vec<ScrapedRow>,
    pub problems: Vec<Vec<String>>,
}

impl ScrapeOutput {
    fn with_capacity(n: usize) -> Self {
        ScrapeOutput {
            today: Vec::with_capacity(n),
            plus_one: Vec::with_capacity(n),
            plus_two: Vec::with_capacity(n),
            problems: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.today.len()
    }

    pub fn is_empty(&self) -> bool {
        self.today.is_empty()
    }

    /// Number of dates that produced ratings rather than a placeholder.
    pub fn published(&self) -> usize {
        self.today.iter().filter(|r| r.ratings.is_some()).count()
    }
}

/// Sequential scraper for one region of the forecast archive.
#[derive(Debug, Clone)]
pub struct Scraper<L: PageLocator> {
    locator: L,
    region: String,
    initial_delay: Duration,
    page_delay: Duration,
}

impl<L: PageLocator> Scraper<L> {
    pub fn new<S: Into<String>>(locator: L, region: S) -> Self {
        Scraper {
            locator,
            region: region.into(),
            initial_delay: Duration::from_secs(3),
            page_delay: Duration::from_secs(5),
        }
    }

    /// Pause after the first page load and after every following one. These give the
    /// page time to render before it is queried.
    pub fn with_delays(mut self, initial_delay: Duration, page_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.page_delay = page_delay;
        self
    }

    /// Scrape every date in order, then close the driver.
    ///
    /// The driver is closed whether or not scraping succeeded. A scraping error takes
    /// precedence over an error closing the browser.
    pub async fn scrape<D: PageDriver>(&self, mut driver: D, dates: &[NaiveDate]) -> Result<ScrapeOutput, ScrapeError> {
        let res = self.scrape_all(&mut driver, dates).await;
        let closed = driver.close().await;

        match (res, closed) {
            (Ok(out), Ok(())) => Ok(out),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(message = "failed to close browser after error", error = %close_err);
                Err(e)
            }
            (Ok(_), Err(close_err)) => Err(close_err.into()),
        }
    }

    async fn scrape_all<D: PageDriver>(&self, driver: &mut D, dates: &[NaiveDate]) -> Result<ScrapeOutput, ScrapeError> {
        let mut out = ScrapeOutput::with_capacity(dates.len());

        for (i, date) in dates.iter().copied().enumerate() {
            let url = self.locator.url(&self.region, date);
            driver.goto(&url).await?;
            let delay = if i == 0 { self.initial_delay } else { self.page_delay };
            tokio::time::sleep(delay).await;

            let (today, plus_one, plus_two, problems) = self.scrape_page(driver, date).await?;
            if today.ratings.is_some() {
                tracing::info!(
                    message = "scraped forecast",
                    date = %date,
                    progress = %format!("{}/{}", i + 1, dates.len()),
                    problems = problems.len(),
                );
            } else {
                tracing::info!(
                    message = "no forecast published",
                    date = %date,
                    progress = %format!("{}/{}", i + 1, dates.len()),
                );
            }

            out.today.push(today);
            out.plus_one.push(plus_one);
            out.plus_two.push(plus_two);
            out.problems.push(problems);
        }

        Ok(out)
    }

    async fn scrape_page<D: PageDriver>(
        &self,
        driver: &mut D,
        date: NaiveDate,
    ) -> Result<(ScrapedRow, ScrapedRow, ScrapedRow, Vec<String>), ScrapeError> {
        let plus_one = date + Days::new(Horizon::OneDay.days());
        let plus_two = date + Days::new(Horizon::TwoDay.days());

        let alpine = driver.texts(self.locator.band_xpath(ElevationBand::Alpine)).await?;
        let treeline = driver.texts(self.locator.band_xpath(ElevationBand::Treeline)).await?;
        let below = driver.texts(self.locator.band_xpath(ElevationBand::BelowTreeline)).await?;
        let outlook = driver.texts(self.locator.outlook_xpath()).await?;

        // Off-season dates, unpublished forecasts and failed page loads all look the same.
        if alpine.is_empty() || treeline.is_empty() || below.is_empty() || outlook.is_empty() {
            tracing::debug!(
                message = "rating elements missing",
                date = %date,
                alpine = alpine.len(),
                treeline = treeline.len(),
                below_treeline = below.len(),
                outlook = outlook.len(),
            );

            return Ok((
                ScrapedRow::placeholder(date),
                ScrapedRow::placeholder(plus_one),
                ScrapedRow::placeholder(plus_two),
                Vec::new(),
            ));
        }

        if outlook.len() < OUTLOOK_RATINGS {
            return Err(ScrapeError::IncompleteOutlook {
                date,
                found: outlook.len(),
            });
        }

        let problems = driver.texts(self.locator.problems_xpath()).await?;
        let parse = |text: &str| parse_rating(text).map_err(|source| ScrapeError::Rating { date, source });

        let today = BandRatings {
            alpine: parse(&alpine[0])?,
            treeline: parse(&treeline[0])?,
            below_treeline: parse(&below[0])?,
        };
        let next = BandRatings {
            alpine: parse(&outlook[0])?,
            treeline: parse(&outlook[1])?,
            below_treeline: parse(&outlook[2])?,
        };
        let after = BandRatings {
            alpine: parse(&outlook[3])?,
            treeline: parse(&outlook[4])?,
            below_treeline: parse(&outlook[5])?,
        };

        Ok((
            ScrapedRow {
                date_valid: date,
                ratings: Some(today),
            },
            ScrapedRow {
                date_valid: plus_one,
                ratings: Some(next),
            },
            ScrapedRow {
                date_valid: plus_two,
                ratings: Some(after),
            },
            problems.into_iter().filter(|p| !p.is_empty()).collect(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::{ScrapeError, ScrapedRow, Scraper};
    use crate::browser::{BrowserError, PageDriver};
    use crate::locator::{AvalancheCanadaLocator, PageLocator};
    use crate::rating::{BandRatings, DangerLevel, ElevationBand};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Driver serving canned element text per page URL.
    struct FakeDriver {
        pages: HashMap<String, HashMap<String, Vec<String>>>,
        current: Option<String>,
        visited: Vec<String>,
        closed: Arc<AtomicBool>,
    }

    impl FakeDriver {
        fn new(closed: Arc<AtomicBool>) -> Self {
            FakeDriver {
                pages: HashMap::new(),
                current: None,
                visited: Vec::new(),
                closed,
            }
        }

        fn page(&mut self, url: String, elements: Vec<(&str, Vec<&str>)>) {
            let elements = elements
                .into_iter()
                .map(|(xpath, texts)| (xpath.to_owned(), texts.into_iter().map(String::from).collect()))
                .collect();
            self.pages.insert(url, elements);
        }
    }

    #[async_trait]
    impl PageDriver for FakeDriver {
        async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
            self.visited.push(url.to_owned());
            self.current = Some(url.to_owned());
            Ok(())
        }

        async fn texts(&mut self, xpath: &str) -> Result<Vec<String>, BrowserError> {
            Ok(self
                .current
                .as_ref()
                .and_then(|url| self.pages.get(url))
                .and_then(|elements| elements.get(xpath))
                .cloned()
                .unwrap_or_default())
        }

        async fn close(self) -> Result<(), BrowserError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scraper() -> Scraper<AvalancheCanadaLocator> {
        Scraper::new(AvalancheCanadaLocator::default(), "sea-to-sky").with_delays(Duration::ZERO, Duration::ZERO)
    }

    fn published_page(driver: &mut FakeDriver, day: NaiveDate, today: [&str; 3], outlook: [&str; 6]) {
        let locator = AvalancheCanadaLocator::default();
        driver.page(
            locator.url("sea-to-sky", day),
            vec![
                (locator.band_xpath(ElevationBand::Alpine), vec![today[0]]),
                (locator.band_xpath(ElevationBand::Treeline), vec![today[1]]),
                (locator.band_xpath(ElevationBand::BelowTreeline), vec![today[2]]),
                (locator.outlook_xpath(), outlook.to_vec()),
                (locator.problems_xpath(), vec!["Storm slabs. Expect touchy conditions.", ""]),
            ],
        );
    }

    fn fields(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_scrape_known_date() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed.clone());
        published_page(
            &mut driver,
            date(2019, 12, 1),
            ["1 - Low", "1 - Low", "1 - Low"],
            ["1 - Low", "1 - Low", "1 - Low", "1 - Low", "1 - Low", "1 - Low"],
        );

        let out = scraper().scrape(driver, &[date(2019, 12, 1)]).await.unwrap();

        assert_eq!(fields(&["2019-12-01", "Low", "1", "Low", "1", "Low", "1"]), out.today[0].fields());
        assert_eq!(fields(&["2019-12-02", "Low", "1", "Low", "1", "Low", "1"]), out.plus_one[0].fields());
        assert_eq!(fields(&["2019-12-03", "Low", "1", "Low", "1", "Low", "1"]), out.plus_two[0].fields());
        assert_eq!(vec![vec!["Storm slabs. Expect touchy conditions.".to_owned()]], out.problems);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scrape_outlook_order() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed);
        published_page(
            &mut driver,
            date(2020, 1, 10),
            ["4 - High", "3 - Considerable", "2 - Moderate"],
            [
                "5 - Extreme",
                "4 - High",
                "3 - Considerable",
                "3 - Considerable",
                "2 - Moderate",
                "1 - Low",
            ],
        );

        let out = scraper().scrape(driver, &[date(2020, 1, 10)]).await.unwrap();

        let expected_next = BandRatings {
            alpine: DangerLevel::Extreme.into(),
            treeline: DangerLevel::High.into(),
            below_treeline: DangerLevel::Considerable.into(),
        };
        let expected_after = BandRatings {
            alpine: DangerLevel::Considerable.into(),
            treeline: DangerLevel::Moderate.into(),
            below_treeline: DangerLevel::Low.into(),
        };
        assert_eq!(Some(expected_next), out.plus_one[0].ratings);
        assert_eq!(Some(expected_after), out.plus_two[0].ratings);
        assert_eq!(DangerLevel::High, out.today[0].ratings.as_ref().unwrap().alpine.level);
    }

    #[tokio::test]
    async fn test_scrape_placeholder_keeps_alignment() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed);
        published_page(
            &mut driver,
            date(2020, 4, 30),
            ["2 - Moderate", "2 - Moderate", "1 - Low"],
            ["2 - Moderate", "2 - Moderate", "1 - Low", "1 - Low", "1 - Low", "1 - Low"],
        );

        let dates = [date(2020, 4, 29), date(2020, 4, 30), date(2020, 11, 1)];
        let out = scraper().scrape(driver, &dates).await.unwrap();

        assert_eq!(3, out.len());
        assert_eq!(1, out.published());
        assert_eq!(ScrapedRow::placeholder(date(2020, 4, 29)), out.today[0]);
        assert_eq!(ScrapedRow::placeholder(date(2020, 4, 30)), out.plus_one[0]);
        assert_eq!(ScrapedRow::placeholder(date(2020, 5, 1)), out.plus_two[0]);
        assert_eq!(fields(&["2020-11-01"]), out.today[2].fields());
        assert_eq!(date(2020, 11, 3), out.plus_two[2].date_valid);
        assert!(out.problems[0].is_empty());
        assert_eq!(1, out.problems[1].len());
    }

    #[tokio::test]
    async fn test_scrape_visits_each_date() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed);
        let locator = AvalancheCanadaLocator::default();
        let dates = [date(2020, 4, 30), date(2020, 11, 1)];

        let out = scraper().scrape_all(&mut driver, &dates).await.unwrap();

        assert_eq!(2, out.len());
        assert_eq!(
            vec![locator.url("sea-to-sky", dates[0]), locator.url("sea-to-sky", dates[1])],
            driver.visited
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrape_default_delays() {
        let closed = Arc::new(AtomicBool::new(false));
        let driver = FakeDriver::new(closed);
        let scraper = Scraper::new(AvalancheCanadaLocator::default(), "sea-to-sky");
        let dates = [date(2020, 1, 1), date(2020, 1, 2), date(2020, 1, 3)];

        let start = tokio::time::Instant::now();
        let out = scraper.scrape(driver, &dates).await.unwrap();

        // 3s after the first page, 5s after each of the other two.
        assert_eq!(Duration::from_secs(13), start.elapsed());
        assert_eq!(3, out.len());
    }

    #[tokio::test]
    async fn test_scrape_malformed_rating_closes_browser() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed.clone());
        published_page(
            &mut driver,
            date(2020, 2, 2),
            ["Low", "1 - Low", "1 - Low"],
            ["1 - Low", "1 - Low", "1 - Low", "1 - Low", "1 - Low", "1 - Low"],
        );

        let res = scraper().scrape(driver, &[date(2020, 2, 2)]).await;

        assert!(matches!(res, Err(ScrapeError::Rating { .. })));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scrape_incomplete_outlook() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut driver = FakeDriver::new(closed);
        let locator = AvalancheCanadaLocator::default();
        driver.page(
            locator.url("sea-to-sky", date(2020, 2, 3)),
            vec![
                (locator.band_xpath(ElevationBand::Alpine), vec!["1 - Low"]),
                (locator.band_xpath(ElevationBand::Treeline), vec!["1 - Low"]),
                (locator.band_xpath(ElevationBand::BelowTreeline), vec!["1 - Low"]),
                (locator.outlook_xpath(), vec!["1 - Low", "1 - Low", "1 - Low"]),
            ],
        );

        let res = scraper().scrape(driver, &[date(2020, 2, 3)]).await;

        assert!(matches!(res, Err(ScrapeError::IncompleteOutlook { found: 3, .. })));
    }
}
