use std::time::Duration;

use chrono::TimeZone;
use chrono::Utc;

use super::*;

#[test]
fn test_from_str_format() {
    let format = FromStrFormat::<i32>::new();
    assert_eq!(format.format(&42), "42");
    assert_eq!(format.parse("-7").unwrap(), -7);
    assert!(format.parse("seven").is_err());

    let format = FromStrFormat::<bool>::new();
    assert!(format.parse("true").unwrap());
    assert!(format.parse("yes").is_err());
}

#[test]
fn test_duration_parse() {
    let format = DurationFormat;
    assert_eq!(format.parse("1h30m").unwrap(), Duration::from_secs(5400));
    assert_eq!(format.parse("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(format.parse("2d").unwrap(), Duration::from_secs(2 * 86_400));
    assert_eq!(format.parse("1s500ms").unwrap(), Duration::from_millis(1500));
    assert_eq!(format.parse("15us").unwrap(), Duration::from_micros(15));
    assert_eq!(format.parse("0").unwrap(), Duration::ZERO);
    assert_eq!(format.parse(" 10s ").unwrap(), Duration::from_secs(10));
}

#[test]
fn test_duration_parse_errors() {
    let format = DurationFormat;
    assert!(format.parse("").is_err());
    assert!(format.parse("10").is_err());
    assert!(format.parse("h").is_err());
    assert!(format.parse("5w").is_err());
    assert!(format.parse("1.5s").is_err());
}

#[test]
fn test_duration_format() {
    let format = DurationFormat;
    assert_eq!(format.format(&Duration::ZERO), "0s");
    assert_eq!(format.format(&Duration::from_secs(5400)), "1h30m");
    assert_eq!(format.format(&Duration::from_millis(250)), "250ms");
    assert_eq!(format.format(&Duration::from_millis(1500)), "1s500ms");
    assert_eq!(format.format(&Duration::from_secs(90_061)), "1d1h1m1s");

    let odd = Duration::new(3_723, 4_005_006);
    assert_eq!(format.parse(&format.format(&odd)).unwrap(), odd);
}

#[test]
fn test_instant_format() {
    let format = InstantFormat::new("%d%m%Y %H:%M:%S%.3f");
    let instant = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 30).unwrap();
    assert_eq!(format.format(&instant), "09032024 14:05:30.000");
    assert_eq!(format.parse("09032024 14:05:30.000").unwrap(), instant);

    let err = format.parse("2024-03-09").unwrap_err();
    assert!(err.to_string().contains("%d%m%Y"));
}

#[test]
fn test_instant_format_custom_pattern() {
    let format = InstantFormat::new("%Y-%m-%dT%H:%M:%S");
    assert_eq!(format.pattern(), "%Y-%m-%dT%H:%M:%S");
    let instant = format.parse("2020-01-02T03:04:05").unwrap();
    assert_eq!(instant, Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap());
}
