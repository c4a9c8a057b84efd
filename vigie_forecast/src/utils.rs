//! Utility functions for the vigie_forecast crate

use chrono::{Days, NaiveDate};

/// Dates of the `horizon` days following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u64)
        .map_while(|i| last_date.checked_add_days(Days::new(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_dates_are_daily() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let dates = future_dates(last, 3);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
        assert!(future_dates(last, 0).is_empty());
    }
}
