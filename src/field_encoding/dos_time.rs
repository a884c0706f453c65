// © 2019 3D Robotics. License: Apache-2.0
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Encode the legacy DOS date field (local-interpreted-as-UTC, no zone
/// conversion is performed — see DESIGN.md open question #3).
pub fn dos_date(t: DateTime<Utc>) -> u16 {
    let year = t.year().saturating_sub(1980).max(0) as u16;
    let month = t.month() as u16;
    let day = t.day() as u16;
    day | (month << 5) | (year << 9)
}

/// Encode the legacy DOS time field (2-second resolution).
pub fn dos_time(t: DateTime<Utc>) -> u16 {
    let second = (t.second() / 2) as u16;
    let minute = t.minute() as u16;
    let hour = t.hour() as u16;
    second | (minute << 5) | (hour << 11)
}

#[test]
fn test_dos_date_time() {
    let t = "2006-10-11T15:40:56Z".parse::<DateTime<Utc>>().unwrap();
    assert_eq!(dos_time(t), 0x7d1c);
    assert_eq!(dos_date(t), 0x354b);
}
