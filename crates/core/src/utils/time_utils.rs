use chrono::{NaiveDate, Utc};

/// Today's calendar date in UTC.
///
/// The engine works with calendar dates only; timestamps never carry a
/// time-of-day component into replay or valuation logic.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// All calendar days from `start` through `end`, inclusive.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

/// The "YYYY-MM" bucket key for a date.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
