use chrono::{NaiveDate, Weekday};
use monthly_outlook::expiry::{expiry_for, is_monthly_expiry, last_weekday_of_month};
use monthly_outlook::model::YearMonth;
use monthly_outlook::monthly::MonthAnchor;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn last_thursday_per_month() {
    assert_eq!(last_weekday_of_month(2024, 2, Weekday::Thu), Some(d(2024, 2, 29)));
    assert_eq!(last_weekday_of_month(2024, 3, Weekday::Thu), Some(d(2024, 3, 28)));
    assert_eq!(last_weekday_of_month(2023, 12, Weekday::Thu), Some(d(2023, 12, 28)));
    assert_eq!(last_weekday_of_month(2025, 4, Weekday::Tue), Some(d(2025, 4, 29)));
}

#[test]
fn expiry_detection() {
    assert!(is_monthly_expiry(d(2024, 3, 28), Weekday::Thu));
    assert!(!is_monthly_expiry(d(2024, 3, 21), Weekday::Thu));
    assert!(!is_monthly_expiry(d(2024, 3, 29), Weekday::Thu));
}

#[test]
fn expiry_for_rolls_after_expiry() {
    assert_eq!(expiry_for(d(2024, 3, 28), Weekday::Thu), Some(d(2024, 3, 28)));
    assert_eq!(expiry_for(d(2024, 3, 29), Weekday::Thu), Some(d(2024, 4, 25)));
    assert_eq!(expiry_for(d(2023, 12, 29), Weekday::Thu), Some(d(2024, 1, 25)));

    let anchor = MonthAnchor::MonthlyExpiry {
        weekday: Weekday::Thu,
    };
    assert_eq!(anchor.bucket(d(2023, 12, 29)), YearMonth::new(2024, 1));
    assert_eq!(
        MonthAnchor::CalendarMonth.bucket(d(2023, 12, 29)),
        YearMonth::new(2023, 12)
    );
}
