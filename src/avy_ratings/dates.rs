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

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Months in which forecasts are published, in season order.
pub const FORECAST_MONTHS: [u32; 6] = [11, 12, 1, 2, 3, 4];

/// Every date from `start` to `end`, inclusive. Empty if `start` is after `end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn is_forecast_month(date: NaiveDate) -> bool {
    FORECAST_MONTHS.contains(&date.month())
}

/// Dates in the range that fall in a forecast month, see [`FORECAST_MONTHS`].
pub fn forecast_season_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    date_range(start, end).into_iter().filter(|d| is_forecast_month(*d)).collect()
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

/// Forecast season running from November 1 of `start_year` through April 30 of the next year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    pub start_year: i32,
}

impl Season {
    /// Season a date belongs to, `None` for May through October.
    pub fn of(date: NaiveDate) -> Option<Self> {
        match date.month() {
            11 | 12 => Some(Season {
                start_year: date.year(),
            }),
            1..=4 => Some(Season {
                start_year: date.year() - 1,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_year, self.start_year + 1)
    }
}

#[cfg(test)]
mod test {
    use super::{date_range, forecast_season_dates, Season};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_inclusive() {
        let dates = date_range(date(2019, 12, 30), date(2020, 1, 2));
        assert_eq!(
            vec![date(2019, 12, 30), date(2019, 12, 31), date(2020, 1, 1), date(2020, 1, 2)],
            dates
        );
    }

    #[test]
    fn test_date_range_single_and_reversed() {
        assert_eq!(vec![date(2020, 2, 29)], date_range(date(2020, 2, 29), date(2020, 2, 29)));
        assert!(date_range(date(2020, 3, 1), date(2020, 2, 1)).is_empty());
    }

    #[test]
    fn test_forecast_season_dates_skips_summer() {
        let dates = forecast_season_dates(date(2020, 4, 29), date(2020, 11, 2));
        assert_eq!(vec![date(2020, 4, 29), date(2020, 4, 30), date(2020, 11, 1), date(2020, 11, 2)], dates);
    }

    #[test]
    fn test_season_of() {
        assert_eq!(Some(Season { start_year: 2019 }), Season::of(date(2019, 11, 1)));
        assert_eq!(Some(Season { start_year: 2019 }), Season::of(date(2020, 4, 30)));
        assert_eq!(None, Season::of(date(2020, 5, 1)));
        assert_eq!("2019 - 2020", Season { start_year: 2019 }.to_string());
    }
}
