use chrono::NaiveDate;
use monthly_outlook::model::DateRange;
use monthly_outlook::nse::history_windows;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn quarter_splits_into_forty_day_windows() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 3, 31)).unwrap();
    let windows = history_windows(&range, 40);
    assert_eq!(
        windows,
        vec![
            DateRange::new(d(2024, 1, 1), d(2024, 2, 9)).unwrap(),
            DateRange::new(d(2024, 2, 10), d(2024, 3, 20)).unwrap(),
            DateRange::new(d(2024, 3, 21), d(2024, 3, 31)).unwrap(),
        ]
    );
}

#[test]
fn windows_cover_range_exactly() {
    let range = DateRange::trailing_months(d(2025, 6, 30), 24);
    for chunk in [1, 7, 40, 365, 10_000] {
        let windows = history_windows(&range, chunk);
        assert_eq!(windows.first().unwrap().start, range.start);
        assert_eq!(windows.last().unwrap().end, range.end);
        assert!(windows
            .windows(2)
            .all(|w| w[0].end.succ_opt() == Some(w[1].start)));
        assert!(windows.iter().all(|w| w.days() <= i64::from(chunk)));
    }
}

#[test]
fn single_day_range() {
    let range = DateRange::new(d(2024, 5, 2), d(2024, 5, 2)).unwrap();
    assert_eq!(history_windows(&range, 40), vec![range]);
}
