//! Utilities for decoding the 5-character groups that make up a message body.
use crate::bulletin::MessageType;
use metfor::{Celsius, HectoPascal};
use optional::{none, some, Optioned};

/// A slash in a numeric field marks it as not observed.
///
/// Some feeds transmit a backslash instead, so both count.
pub(crate) fn has_missing_marker(field: &str) -> bool {
    field.contains(|c| c == '/' || c == '\\')
}

/// Decode a `TTTDd` temperature/dew point group.
///
/// `TTT` is the temperature in tenths of a degree Celsius, with the sign
/// folded into parity: an odd `TTT` is below zero. `Dd` is the dew point
/// depression, in tenths of a degree up to 55 and in whole degrees minus
/// fifty above that. Returns `(temperature, dew_point)`.
pub(crate) fn temp_group(group: &str) -> (Optioned<Celsius>, Optioned<Celsius>) {
    let ttt = group.get(..3).unwrap_or("");
    let temperature: Optioned<Celsius> = if has_missing_marker(ttt) {
        none()
    } else {
        match ttt.parse::<i32>() {
            Ok(raw) => {
                let mut tmpc = f64::from(raw) / 10.0;
                if raw % 2 != 0 {
                    tmpc = -tmpc;
                }
                some(Celsius(tmpc))
            }
            Err(_) => none(),
        }
    };

    let dd = group.get(3..).unwrap_or("");
    let depression: Optioned<f64> = if has_missing_marker(dd) {
        none()
    } else {
        match dd.parse::<i32>() {
            Ok(raw) => {
                let raw = f64::from(raw);
                if raw <= 55.0 {
                    some(raw * 0.1)
                } else {
                    some(raw - 50.0)
                }
            }
            Err(_) => none(),
        }
    };

    let dew_point: Optioned<Celsius> = match (temperature.into_option(), depression.into_option())
    {
        (Some(Celsius(tmpc)), Some(depression)) => some(Celsius(tmpc - depression)),
        _ => none(),
    };

    (temperature, dew_point)
}

/// Decode a `dddff` wind group into `(direction, speed)`.
///
/// `ddd` is the direction in degrees true. Directions are reported to the
/// nearest 5 degrees, and the units digit carries the hundreds of the speed:
/// `wspd = ff + (ddd mod 5) * 100`. Any missing marker blanks both values.
pub(crate) fn wind_group(group: &str) -> (Optioned<f64>, Optioned<f64>) {
    if has_missing_marker(group) {
        return (none(), none());
    }

    let dir = group.get(..3).and_then(|s| s.parse::<i64>().ok());
    let spd = group.get(3..).and_then(|s| s.parse::<i64>().ok());

    match (dir, spd) {
        (Some(ddd), Some(ff)) => {
            let wdir = ddd as f64;
            let wspd = (ff + (ddd % 5) * 100) as f64;
            (some(wdir), some(wspd))
        }
        _ => (none(), none()),
    }
}

/// The decoded `YYGGa` date group that leads every message body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DateGroup {
    /// Day of the month.
    pub day: u32,
    /// UTC hour of the observation.
    pub hour: u32,
    /// Wind speeds are in knots when `YY` is offset by 50, m/s otherwise.
    pub wind_in_knots: bool,
    /// Last pressure level containing wind data. For the significant level
    /// message types this digit is an equipment code instead and the scaled
    /// value is not meaningful.
    pub top_wind_level: Optioned<HectoPascal>,
}

/// Decode a `YYGGa` date group.
///
/// Returns `None` when the day or hour digits are unreadable; a missing or
/// unreadable final digit only blanks `top_wind_level`. The final digit
/// scales by 100 hPa for TTAA and by 10 hPa for everything else.
pub(crate) fn date_group(group: &str, msg_type: MessageType) -> Option<DateGroup> {
    let yy: u32 = group.get(..2)?.parse().ok()?;
    let (day, wind_in_knots) = if yy > 50 { (yy - 50, true) } else { (yy, false) };
    let hour: u32 = group.get(2..4)?.parse().ok()?;

    let scale = if msg_type == MessageType::TTAA { 100.0 } else { 10.0 };
    let top_wind_level: Optioned<HectoPascal> = match group.chars().last() {
        Some(c) if c != '/' && c != '\\' => match c.to_digit(10) {
            Some(a) => some(HectoPascal(f64::from(a) * scale)),
            None => none(),
        },
        _ => none(),
    };

    Some(DateGroup {
        day,
        hour,
        wind_in_knots,
        top_wind_level,
    })
}

#[test]
fn test_temp_group_parity_sign() {
    // Even TTT is at or above zero, odd TTT is below.
    let (t, td) = temp_group("15020");
    assert_eq!(t, some(Celsius(15.0)));
    assert_eq!(td, some(Celsius(15.0 - 2.0)));

    let (t, _) = temp_group("15120");
    assert_eq!(t, some(Celsius(-15.1)));

    let (t, _) = temp_group("00220");
    assert_eq!(t, some(Celsius(0.2)));

    let (t, _) = temp_group("00320");
    assert_eq!(t, some(Celsius(-0.3)));
}

#[test]
fn test_temp_group_depression_scale() {
    // Tenths of a degree through 55, whole degrees minus fifty above.
    let (t, td) = temp_group("10055");
    assert_eq!(t, some(Celsius(10.0)));
    assert_eq!(td, some(Celsius(10.0 - 5.5)));

    let (_, td) = temp_group("10056");
    assert_eq!(td, some(Celsius(10.0 - 6.0)));

    let (_, td) = temp_group("10099");
    assert_eq!(td, some(Celsius(10.0 - 49.0)));
}

#[test]
fn test_temp_group_missing_fields() {
    let (t, td) = temp_group("///20");
    assert!(t.is_none());
    assert!(td.is_none());

    let (t, td) = temp_group("150//");
    assert_eq!(t, some(Celsius(15.0)));
    assert!(td.is_none());

    let (t, td) = temp_group(r"15\20");
    assert!(t.is_none());
    assert!(td.is_none());
}

#[test]
fn test_wind_group_speed_folding() {
    let (wdir, wspd) = wind_group("24015");
    assert_eq!(wdir, some(240.0));
    assert_eq!(wspd, some(15.0));

    // The units digit of the direction folds hundreds of knots into the
    // speed.
    let (wdir, wspd) = wind_group("24115");
    assert_eq!(wdir, some(241.0));
    assert_eq!(wspd, some(115.0));

    let (wdir, wspd) = wind_group("24315");
    assert_eq!(wdir, some(243.0));
    assert_eq!(wspd, some(315.0));
}

#[test]
fn test_wind_group_jointly_missing() {
    let (wdir, wspd) = wind_group("240//");
    assert!(wdir.is_none());
    assert!(wspd.is_none());

    let (wdir, wspd) = wind_group("/////");
    assert!(wdir.is_none());
    assert!(wspd.is_none());
}

#[test]
fn test_date_group() {
    // Day offset by 50 means winds are in knots.
    let dg = date_group("70121", MessageType::TTAA).unwrap();
    assert_eq!(dg.day, 20);
    assert_eq!(dg.hour, 12);
    assert!(dg.wind_in_knots);
    assert_eq!(dg.top_wind_level, some(HectoPascal(100.0)));

    let dg = date_group("04003", MessageType::TTBB).unwrap();
    assert_eq!(dg.day, 4);
    assert_eq!(dg.hour, 0);
    assert!(!dg.wind_in_knots);
    assert_eq!(dg.top_wind_level, some(HectoPascal(30.0)));

    let dg = date_group("7012/", MessageType::TTAA).unwrap();
    assert!(dg.top_wind_level.is_none());

    assert!(date_group("7/121", MessageType::TTAA).is_none());
}
