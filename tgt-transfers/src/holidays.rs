use chrono::{Datelike, NaiveDate};

/// Fixed-date national holidays (month, day). Movable feasts such as
/// Orthodox Easter are not in this list; callers pass them in explicitly.
const FIXED_HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 6),
    (1, 7),
    (5, 1),
    (5, 2),
    (5, 21),
    (5, 22),
    (7, 13),
    (7, 14),
];

pub fn is_public_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS
        .iter()
        .any(|&(month, day)| date.month() == month && date.day() == day)
}
