//! Decoder for the significant wind messages, PPBB below 100 hPa and PPDD
//! above it.
//!
//! The default mode is altitude groups: a `9xyyy` group names up to three
//! heights (`x` ten thousands of feet, `y` digits thousands, `/` an empty
//! slot) and is followed by one wind group per populated slot. The `21212`
//! marker switches the rest of the body to `(level, wind)` pairs on
//! pressure surfaces.
use super::{Level, STOP_GROUPS, WINDS_ALOFT_GROUP};
use crate::bulletin::{MessageType, RawMessage};
use crate::groups;
use metfor::{HectoPascal, Meters};
use optional::some;

const FEET_PER_METER: f64 = 3.281;

pub(crate) fn decode(msg: &RawMessage) -> Vec<Level> {
    let body = &msg.body;
    let mut levels = Vec::new();
    let mut pressure_levels = false;
    let mut last_altitude_group: Option<&str> = None;

    // body[0] is the date group and body[1] the station number.
    let mut idx = 2;
    while idx < body.len() {
        let group = body[idx].as_str();
        if STOP_GROUPS.contains(&group) {
            break;
        }
        if group == WINDS_ALOFT_GROUP {
            pressure_levels = true;
            idx += 1;
            continue;
        }

        if pressure_levels {
            let raw: i64 = match group.get(2..).and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => break,
            };
            let lvl = if msg.msg_type == MessageType::PPDD {
                raw as f64 / 10.0
            } else {
                raw as f64
            };
            let payload = match body.get(idx + 1) {
                Some(p) => p,
                None => break,
            };

            let (wdir, wspd) = groups::wind_group(payload);
            let mut level = Level::default();
            level.pressure = some(HectoPascal(lvl));
            level.wind_dir = wdir;
            level.wind_spd = wspd;
            levels.push(level);

            last_altitude_group = Some(group);
            idx += 2;
            continue;
        }

        // Altitude mode. Groups open with a 9; reports above 100 kft wrap
        // the ten thousands into the first two digits instead.
        let mut wrapped = false;
        if !group.starts_with('9') {
            let prev = match last_altitude_group {
                Some(p) => p,
                None => break,
            };
            let prev2 = prev.get(..2).unwrap_or("");
            let cur2 = group.get(..2).unwrap_or("");
            if (cur2 == "10" || cur2 == "11") && (prev2 == "99" || prev2 == "10") {
                wrapped = true;
            } else {
                break;
            }
        }

        let height_mod: i64 = if wrapped {
            match group.get(..2).and_then(|s| s.parse::<i64>().ok()) {
                Some(v) => v * 10_000,
                None => break,
            }
        } else {
            match group.chars().nth(1).and_then(|c| c.to_digit(10)) {
                Some(d) => i64::from(d) * 10_000,
                None => break,
            }
        };

        let mut inc = 1;
        for (slot, c) in group.chars().skip(2).take(3).enumerate() {
            let feet = match c.to_digit(10) {
                Some(d) => i64::from(d) * 1000 + height_mod,
                // An empty (/) slot; its wind position stays reserved.
                None => continue,
            };
            let loc = idx + 1 + slot;
            if loc >= body.len() {
                continue;
            }

            let (wdir, wspd) = groups::wind_group(&body[loc]);
            let mut level = Level::default();
            level.height = some(Meters(feet as f64 / FEET_PER_METER));
            level.wind_dir = wdir;
            level.wind_spd = wspd;
            levels.push(level);
            inc += 1;
        }

        idx += inc;
        last_altitude_group = Some(group);
    }

    levels
}

#[cfg(test)]
mod test {
    use super::*;

    fn raw_message(msg_type: MessageType, body: &[&str]) -> RawMessage {
        RawMessage {
            msg_type,
            header: vec![
                "USUS41".to_string(),
                "KWBC".to_string(),
                "041200".to_string(),
            ],
            body: body.iter().map(|s| s.to_string()).collect(),
            time_str: "041200".to_string(),
            station_id: body[1].to_string(),
            transmission_code: None,
        }
    }

    #[test]
    fn test_altitude_group_with_three_slots() {
        let msg = raw_message(
            MessageType::PPBB,
            &[
                "54120", "72357", "90124", "24015", "26020", "28025", "51515",
            ],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].height, some(Meters(1000.0 / FEET_PER_METER)));
        assert_eq!(levels[0].wind_dir, some(240.0));
        assert_eq!(levels[0].wind_spd, some(15.0));
        assert_eq!(levels[1].height, some(Meters(2000.0 / FEET_PER_METER)));
        assert_eq!(levels[2].height, some(Meters(4000.0 / FEET_PER_METER)));
        assert!(levels.iter().all(|l| l.pressure.is_none()));
    }

    #[test]
    fn test_empty_slots_emit_nothing() {
        let msg = raw_message(
            MessageType::PPBB,
            &["54120", "72357", "901//", "24015", "51515"],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].height, some(Meters(1000.0 / FEET_PER_METER)));
        assert_eq!(levels[0].wind_dir, some(240.0));
    }

    #[test]
    fn test_surface_slot_height_is_zero() {
        let msg = raw_message(
            MessageType::PPBB,
            &["54120", "72357", "90012", "24015", "26020", "28025"],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].height, some(Meters(0.0)));
        assert_eq!(levels[1].height, some(Meters(1000.0 / FEET_PER_METER)));
        assert_eq!(levels[2].height, some(Meters(2000.0 / FEET_PER_METER)));
    }

    #[test]
    fn test_wrap_above_100_kft() {
        let msg = raw_message(
            MessageType::PPBB,
            &[
                "54120", "72357", //
                "99120", "24015", "26020", "28025", //
                "10023", "30035", "31040", "32045",
            ],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 6);
        assert_eq!(levels[0].height, some(Meters(91_000.0 / FEET_PER_METER)));
        assert_eq!(levels[1].height, some(Meters(92_000.0 / FEET_PER_METER)));
        assert_eq!(levels[2].height, some(Meters(90_000.0 / FEET_PER_METER)));
        // 10 leads the continuation group, so its slots sit above 100 kft.
        assert_eq!(levels[3].height, some(Meters(100_000.0 / FEET_PER_METER)));
        assert_eq!(levels[4].height, some(Meters(102_000.0 / FEET_PER_METER)));
        assert_eq!(levels[5].height, some(Meters(103_000.0 / FEET_PER_METER)));
    }

    #[test]
    fn test_non_altitude_group_ends_altitude_mode() {
        let msg = raw_message(
            MessageType::PPBB,
            &[
                "54120", "72357", "90124", "24015", "26020", "28025", "40015", "26020",
            ],
        );
        let levels = decode(&msg);

        // 40015 does not open with a 9 and is no 100 kft continuation.
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn test_pressure_level_winds_after_21212() {
        let msg = raw_message(
            MessageType::PPBB,
            &[
                "54120", "72357", "90124", "24015", "26020", "28025", "21212", "85850", "24015",
                "70700", "26020", "41414", "50500", "27030",
            ],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 5);
        assert_eq!(levels[3].pressure, some(HectoPascal(850.0)));
        assert_eq!(levels[3].wind_dir, some(240.0));
        assert!(levels[3].height.is_none());
        assert_eq!(levels[4].pressure, some(HectoPascal(700.0)));
    }

    #[test]
    fn test_ppdd_pressure_levels_are_tenths() {
        let msg = raw_message(
            MessageType::PPDD,
            &["54120", "72357", "21212", "11085", "30545"],
        );
        let levels = decode(&msg);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(8.5)));
        assert_eq!(levels[0].wind_dir, some(305.0));
        assert_eq!(levels[0].wind_spd, some(45.0));
    }
}
