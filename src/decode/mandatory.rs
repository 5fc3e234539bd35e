//! Decoder for the mandatory level messages, TTAA below 100 hPa and TTCC
//! above it.
//!
//! The body is a run of `PPhhh` level groups, each followed by up to two
//! more groups: a temperature/dew point group, and a wind group when the
//! level is at or below the last wind-reporting level named by the date
//! group. Tropopause (88) and max wind (77/66) groups have their own
//! follow-up shapes.
use super::{Level, PASS_GROUPS, STOP_GROUPS};
use crate::bulletin::{MessageType, RawMessage};
use crate::groups;
use crate::station::StationTable;
use metfor::{HectoPascal, Meters};
use optional::{none, some, Optioned};

pub(crate) fn decode(msg: &RawMessage, stations: &StationTable) -> Vec<Level> {
    let mut levels = Vec::new();

    let date = match msg
        .body
        .first()
        .and_then(|g| groups::date_group(g, msg.msg_type))
    {
        Some(dg) => dg,
        None => return levels,
    };

    // Without the top wind level the follow-up groups cannot be stepped
    // over reliably.
    let lvl_top = match date.top_wind_level.into_option() {
        Some(top) => top,
        None => return levels,
    };

    // body[0] is the date group and body[1] the station number.
    let mut idx = 2;
    while idx < msg.body.len() {
        let group = msg.body[idx].as_str();
        if STOP_GROUPS.contains(&group) {
            break;
        }
        if PASS_GROUPS.contains(&group) {
            idx += 1;
            continue;
        }

        let (level, next) = decode_level(msg, idx, lvl_top, stations);
        if !level.is_empty() {
            levels.push(level);
        }
        idx = next + 1;
    }

    levels
}

/// How the pressure of a level is derived from its `PPhhh` group.
enum PressureRule {
    /// A standard mandatory level with a fixed pressure.
    Fixed(f64),
    /// The surface group: the height digits are the pressure, folded above
    /// 1000 hPa when below 300.
    Surface,
    /// The height digits are the pressure as reported.
    Raw,
    /// The height digits are tenths of hPa.
    RawTenths,
    /// An unrecognized level code.
    Unknown,
}

/// How the height of a level is derived from its three height digits.
enum HeightRule {
    /// `h * scale + offset`.
    Scaled { scale: f64, offset: f64 },
    /// One of two `(scale, offset)` pairs picked by comparing `h` against a
    /// threshold; heights fold over where the raw digits would be ambiguous.
    Branch {
        threshold: i64,
        below: (f64, f64),
        at_or_above: (f64, f64),
    },
    /// The station elevation from the station table.
    StationElevation,
    /// No height is reported for this group.
    Absent,
}

/// The decode plan for one level code.
struct LevelTemplate {
    pressure: PressureRule,
    height: HeightRule,
    /// Consume a temperature/dew point group after the level group.
    read_temps: bool,
    /// The wind group directly follows the level group (max wind).
    force_wind: bool,
    tropopause: bool,
    /// A trailing group starting with 4 is wind shear and is stepped over.
    shear_check: bool,
}

impl LevelTemplate {
    fn standard(lvl: f64, height: HeightRule) -> LevelTemplate {
        LevelTemplate {
            pressure: PressureRule::Fixed(lvl),
            height,
            read_temps: true,
            force_wind: false,
            tropopause: false,
            shear_check: false,
        }
    }

    fn tropopause(pressure: PressureRule) -> LevelTemplate {
        LevelTemplate {
            pressure,
            height: HeightRule::Absent,
            read_temps: true,
            force_wind: false,
            tropopause: true,
            shear_check: false,
        }
    }

    fn max_wind(pressure: PressureRule) -> LevelTemplate {
        LevelTemplate {
            pressure,
            height: HeightRule::Absent,
            read_temps: false,
            force_wind: true,
            tropopause: false,
            shear_check: true,
        }
    }

    fn unknown() -> LevelTemplate {
        LevelTemplate {
            pressure: PressureRule::Unknown,
            height: HeightRule::Absent,
            read_temps: true,
            force_wind: false,
            tropopause: false,
            shear_check: false,
        }
    }
}

/// Derive the decode plan for a level code.
fn template(msg_type: MessageType, code: Option<i64>) -> LevelTemplate {
    use self::HeightRule::{Branch, Scaled, StationElevation};
    use self::PressureRule::{Raw, RawTenths, Surface};

    let code = match code {
        Some(c) => c,
        None => return LevelTemplate::unknown(),
    };

    let raw_pressure = if msg_type == MessageType::TTCC {
        RawTenths
    } else {
        Raw
    };

    match (msg_type, code) {
        (_, 88) => LevelTemplate::tropopause(raw_pressure),
        (_, 77) | (_, 66) => LevelTemplate::max_wind(raw_pressure),
        (MessageType::TTAA, 99) => LevelTemplate {
            pressure: Surface,
            height: StationElevation,
            read_temps: true,
            force_wind: false,
            tropopause: false,
            shear_check: false,
        },
        (MessageType::TTAA, 0) => LevelTemplate::standard(
            1000.0,
            Scaled {
                scale: 1.0,
                offset: 0.0,
            },
        ),
        (MessageType::TTAA, 92) => LevelTemplate::standard(
            925.0,
            Scaled {
                scale: 1.0,
                offset: 0.0,
            },
        ),
        (MessageType::TTAA, 85) => LevelTemplate::standard(
            850.0,
            Scaled {
                scale: 1.0,
                offset: 1000.0,
            },
        ),
        (MessageType::TTAA, 70) => LevelTemplate::standard(
            700.0,
            Branch {
                threshold: 500,
                below: (1.0, 3000.0),
                at_or_above: (1.0, 2000.0),
            },
        ),
        (MessageType::TTAA, 50) => LevelTemplate::standard(
            500.0,
            Scaled {
                scale: 10.0,
                offset: 0.0,
            },
        ),
        (MessageType::TTAA, 40) => LevelTemplate::standard(
            400.0,
            Scaled {
                scale: 10.0,
                offset: 0.0,
            },
        ),
        (MessageType::TTAA, 30) => LevelTemplate::standard(
            300.0,
            Branch {
                threshold: 300,
                below: (10.0, 10_000.0),
                at_or_above: (10.0, 0.0),
            },
        ),
        (MessageType::TTAA, 25) => LevelTemplate::standard(
            250.0,
            Branch {
                threshold: 600,
                below: (10.0, 10_000.0),
                at_or_above: (10.0, 0.0),
            },
        ),
        (MessageType::TTAA, 20) | (MessageType::TTAA, 15) | (MessageType::TTAA, 10) => {
            LevelTemplate::standard(
                code as f64 * 10.0,
                Scaled {
                    scale: 10.0,
                    offset: 10_000.0,
                },
            )
        }
        (MessageType::TTCC, 70) => LevelTemplate::standard(
            70.0,
            Scaled {
                scale: 10.0,
                offset: 10_000.0,
            },
        ),
        (MessageType::TTCC, 50) => LevelTemplate::standard(
            50.0,
            Branch {
                threshold: 801,
                below: (10.0, 20_000.0),
                at_or_above: (10.0, 10_000.0),
            },
        ),
        (MessageType::TTCC, 30) | (MessageType::TTCC, 20) => LevelTemplate::standard(
            code as f64,
            Scaled {
                scale: 10.0,
                offset: 20_000.0,
            },
        ),
        (MessageType::TTCC, 10)
        | (MessageType::TTCC, 7)
        | (MessageType::TTCC, 5)
        | (MessageType::TTCC, 3) => LevelTemplate::standard(
            code as f64,
            Scaled {
                scale: 10.0,
                offset: 30_000.0,
            },
        ),
        (MessageType::TTCC, 2) | (MessageType::TTCC, 1) => LevelTemplate::standard(
            code as f64,
            Scaled {
                scale: 10.0,
                offset: 40_000.0,
            },
        ),
        _ => LevelTemplate::unknown(),
    }
}

fn apply_pressure(rule: &PressureRule, hhh: Option<i64>) -> Optioned<HectoPascal> {
    match rule {
        PressureRule::Fixed(v) => some(HectoPascal(*v)),
        PressureRule::Surface => match hhh {
            Some(h) if h < 300 => some(HectoPascal((h + 1000) as f64)),
            Some(h) => some(HectoPascal(h as f64)),
            None => none(),
        },
        PressureRule::Raw => match hhh {
            Some(h) => some(HectoPascal(h as f64)),
            None => none(),
        },
        PressureRule::RawTenths => match hhh {
            Some(h) => some(HectoPascal(h as f64 / 10.0)),
            None => none(),
        },
        PressureRule::Unknown => none(),
    }
}

fn apply_height(
    rule: &HeightRule,
    h: i64,
    msg: &RawMessage,
    stations: &StationTable,
) -> Optioned<Meters> {
    match rule {
        HeightRule::Scaled { scale, offset } => some(Meters(h as f64 * scale + offset)),
        HeightRule::Branch {
            threshold,
            below,
            at_or_above,
        } => {
            let (scale, offset) = if h < *threshold { *below } else { *at_or_above };
            some(Meters(h as f64 * scale + offset))
        }
        HeightRule::StationElevation => some(stations.elevation(&msg.station_id)),
        HeightRule::Absent => none(),
    }
}

/// Decode the level group at `idx` and its follow-up groups.
///
/// Returns the record and the index of the last consumed group; the caller
/// resumes one past it.
fn decode_level(
    msg: &RawMessage,
    idx: usize,
    lvl_top: HectoPascal,
    stations: &StationTable,
) -> (Level, usize) {
    let body = &msg.body;
    let code = body[idx].as_str();

    let pp: Option<i64> = match code.get(..2) {
        Some(s) if !groups::has_missing_marker(s) => s.parse().ok(),
        _ => None,
    };
    let hhh: Option<i64> = match code.get(2..) {
        Some(s) if !groups::has_missing_marker(s) => s.parse().ok(),
        _ => None,
    };

    let tmpl = template(msg.msg_type, pp);

    let mut level = Level::default();
    level.tropopause = tmpl.tropopause;
    level.pressure = apply_pressure(&tmpl.pressure, hhh);
    // Slashed height digits blank the height under every rule, the surface
    // elevation included.
    level.height = match hhh {
        Some(h) => apply_height(&tmpl.height, h, msg, stations),
        None => none(),
    };

    // A tropopause or max wind group without its pressure digits carries
    // nothing; leave the cursor on the next group.
    if level.is_empty() && (tmpl.tropopause || tmpl.force_wind) {
        return (level, idx);
    }

    let mut inc = 0;

    // Temperature/dew point group.
    let mut temp_slot: Option<&str> = None;
    if tmpl.read_temps {
        let loc = idx + 1;
        if loc >= body.len() {
            return (level, loc);
        }
        let token = body[loc].as_str();
        let (t, td) = groups::temp_group(token);
        level.temperature = t;
        level.dew_point = td;
        temp_slot = Some(token);
        inc += 1;
    }

    // Wind group. Winds are reported up the ascent through the level named
    // by the date group, and always for tropopause and max wind groups.
    let wind_reported = match level.pressure.into_option() {
        Some(pressure) => pressure >= lvl_top,
        None => false,
    };
    if wind_reported || tmpl.force_wind || tmpl.tropopause {
        let loc = idx + if tmpl.force_wind { 1 } else { 2 };
        if loc >= body.len() {
            return (level, loc);
        }
        let (wdir, wspd) = groups::wind_group(&body[loc]);
        level.wind_dir = wdir;
        level.wind_spd = wspd;
        inc += 1;
    } else if level.pressure.is_some() && level.height.is_some() {
        // No wind group is transmitted above the top wind level. NSHARP's
        // decoder read the temperature slot as a wind group here and still
        // advanced an extra token; keep that alignment.
        if let Some(token) = temp_slot {
            let (wdir, wspd) = groups::wind_group(token);
            level.wind_dir = wdir;
            level.wind_spd = wspd;
            inc += 1;
        }
    }

    // Max wind groups may be trailed by a wind shear group.
    if tmpl.shear_check && idx + 2 < body.len() && body[idx + 2].starts_with('4') {
        inc += 1;
    }

    (level, idx + inc)
}

#[cfg(test)]
mod test {
    use super::*;
    use metfor::Celsius;

    fn station_table() -> StationTable {
        StationTable::parse(
            "KOUN     72357   NORMAN                           OK US  35.18   -97.44   357    0",
        )
    }

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
    fn test_surface_and_1000_hpa() {
        let msg = raw_message(
            MessageType::TTAA,
            &[
                "54121", "72357", "99023", "15020", "24015", "00164", "12020", "25520", "51515",
                "10164", "00005",
            ],
        );
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 2);

        // Surface pressures below 300 fold above 1000 hPa, and the height is
        // the station elevation.
        assert_eq!(levels[0].pressure, some(HectoPascal(1023.0)));
        assert_eq!(levels[0].height, some(Meters(357.0)));
        assert_eq!(levels[0].temperature, some(Celsius(15.0)));
        assert_eq!(levels[0].dew_point, some(Celsius(13.0)));
        assert_eq!(levels[0].wind_dir, some(240.0));
        assert_eq!(levels[0].wind_spd, some(15.0));
        assert!(!levels[0].tropopause);

        assert_eq!(levels[1].pressure, some(HectoPascal(1000.0)));
        assert_eq!(levels[1].height, some(Meters(164.0)));
        assert_eq!(levels[1].wind_dir, some(255.0));
        assert_eq!(levels[1].wind_spd, some(20.0));
    }

    #[test]
    fn test_ttaa_height_folding() {
        let msg = raw_message(
            MessageType::TTAA,
            &[
                "54121", "72357", //
                "92850", "14020", "25015", //
                "85502", "12021", "25520", //
                "70010", "05022", "26025", //
                "50570", "11058", "26530", //
                "40740", "23158", "27035", //
                "30940", "39159", "27540", //
                "25060", "47160", "28045", //
                "20200", "55161", "28550", //
                "15390", "59162", "29055", //
                "10640", "61563", "29560",
            ],
        );
        let levels = decode(&msg, &station_table());

        let expected = [
            (925.0, 850.0),
            (850.0, 1502.0),
            (700.0, 3010.0),
            (500.0, 5700.0),
            (400.0, 7400.0),
            (300.0, 9400.0),
            (250.0, 10600.0),
            (200.0, 12000.0),
            (150.0, 13900.0),
            (100.0, 16400.0),
        ];
        assert_eq!(levels.len(), expected.len());
        for (level, (lvl, hght)) in levels.iter().zip(expected.iter()) {
            assert_eq!(level.pressure, some(HectoPascal(*lvl)));
            assert_eq!(level.height, some(Meters(*hght)));
            assert!(level.wind_dir.is_some());
        }

        // 700 hPa heights at or above 500 fold down instead of up.
        let msg = raw_message(MessageType::TTAA, &["54121", "72357", "70910", "05022", "26025"]);
        let levels = decode(&msg, &station_table());
        assert_eq!(levels[0].height, some(Meters(2910.0)));
    }

    #[test]
    fn test_ttcc_height_folding() {
        let msg = raw_message(
            MessageType::TTCC,
            &[
                "54121", "72357", //
                "70858", "61560", "29560", //
                "50075", "59561", "30065", //
                "30394", "57562", "30570", //
                "20644", "55563", "31075", //
                "10136", "53564", "31580", //
                "05700", "51565", "32085", //
                "02290", "49566", "32590",
            ],
        );
        let levels = decode(&msg, &station_table());

        let expected = [
            (70.0, 18_580.0),
            (50.0, 20_750.0),
            (30.0, 23_940.0),
            (20.0, 26_440.0),
            (10.0, 31_360.0),
            (5.0, 37_000.0),
            (2.0, 42_900.0),
        ];
        assert_eq!(levels.len(), expected.len());
        for (level, (lvl, hght)) in levels.iter().zip(expected.iter()) {
            assert_eq!(level.pressure, some(HectoPascal(*lvl)));
            assert_eq!(level.height, some(Meters(*hght)));
        }

        // 50 hPa heights above 800 fold onto the lower decade.
        let msg = raw_message(MessageType::TTCC, &["54121", "72357", "50858", "59561", "30065"]);
        let levels = decode(&msg, &station_table());
        assert_eq!(levels[0].height, some(Meters(18_580.0)));
    }

    #[test]
    fn test_tropopause_and_max_wind() {
        let msg = raw_message(
            MessageType::TTAA,
            &[
                "54121", "72357", "88155", "56557", "24080", "77150", "24580", "40020", "88220",
                "50558", "23021",
            ],
        );
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 3);

        assert_eq!(levels[0].pressure, some(HectoPascal(155.0)));
        assert!(levels[0].height.is_none());
        assert!(levels[0].tropopause);
        assert_eq!(levels[0].temperature, some(Celsius(-56.5)));
        assert_eq!(levels[0].wind_dir, some(240.0));
        assert_eq!(levels[0].wind_spd, some(80.0));

        // The max wind group carries no temperatures, and the 40020 shear
        // group after its wind is stepped over.
        assert_eq!(levels[1].pressure, some(HectoPascal(150.0)));
        assert!(levels[1].temperature.is_none());
        assert_eq!(levels[1].wind_dir, some(245.0));
        assert_eq!(levels[1].wind_spd, some(80.0));
        assert!(!levels[1].tropopause);

        // Decoding resumed on the group after the shear group.
        assert_eq!(levels[2].pressure, some(HectoPascal(220.0)));
        assert!(levels[2].tropopause);
    }

    #[test]
    fn test_ttcc_tropopause_pressure_in_tenths() {
        let msg = raw_message(MessageType::TTCC, &["54121", "72357", "88123", "56557", "24080"]);
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(12.3)));
        assert!(levels[0].tropopause);
    }

    #[test]
    fn test_stop_and_pass_groups() {
        let msg = raw_message(
            MessageType::TTAA,
            &[
                "54121", "72357", "88999", "77999", "85502", "12021", "25520", "51515", "00164",
                "12020", "25520",
            ],
        );
        let levels = decode(&msg, &station_table());

        // The two pass groups are skipped, the stop group ends the decode.
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(850.0)));
    }

    #[test]
    fn test_winds_above_top_level_come_from_the_temperature_slot() {
        // Top wind level is 700 hPa; 500 hPa is above it so no wind group is
        // transmitted for it.
        let msg = raw_message(
            MessageType::TTAA,
            &[
                "54127", "72357", //
                "99023", "15020", "24015", //
                "85502", "12020", "25010", //
                "50570", "12058", //
                "40740", "10159", //
                "51515",
            ],
        );
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 4);
        assert_eq!(levels[2].pressure, some(HectoPascal(500.0)));
        // The wind repeats the temperature slot decoded as dddff.
        assert_eq!(levels[2].temperature, some(Celsius(12.0)));
        assert_eq!(levels[2].dew_point, some(Celsius(4.0)));
        assert_eq!(levels[2].wind_dir, some(120.0));
        assert_eq!(levels[2].wind_spd, some(58.0));

        // The extra advance swallowed the 40740 group, so the next level
        // decoded is 10159 and the stop group became its temperature slot.
        assert_eq!(levels[3].pressure, some(HectoPascal(100.0)));
        assert_eq!(levels[3].height, some(Meters(11_590.0)));
        assert_eq!(levels[3].temperature, some(Celsius(-51.5)));
    }

    #[test]
    fn test_unknown_level_code_consumes_its_temperature_slot() {
        let msg = raw_message(
            MessageType::TTAA,
            &["54121", "72357", "60123", "15020", "85502", "12021", "25520"],
        );
        let levels = decode(&msg, &station_table());

        // The unknown 60 group and its follow-up are stepped over and the
        // record is dropped; decoding picks back up at 850 hPa.
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(850.0)));
        assert_eq!(levels[0].height, some(Meters(1502.0)));
    }

    #[test]
    fn test_truncated_message() {
        let msg = raw_message(MessageType::TTAA, &["54121", "72357", "85502"]);
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(850.0)));
        assert_eq!(levels[0].height, some(Meters(1502.0)));
        assert!(levels[0].temperature.is_none());
        assert!(levels[0].wind_dir.is_none());
    }

    #[test]
    fn test_missing_top_wind_level_ends_the_decode() {
        let msg = raw_message(
            MessageType::TTAA,
            &["5412/", "72357", "85502", "12021", "25520"],
        );
        assert!(decode(&msg, &station_table()).is_empty());
    }

    #[test]
    fn test_slashed_height_digits() {
        // A slashed surface height blanks both the pressure and the
        // elevation; nothing useful remains so the record is dropped, but
        // its temperature slot is still consumed.
        let msg = raw_message(
            MessageType::TTAA,
            &["54121", "72357", "99///", "15020", "85502", "12021", "25520"],
        );
        let levels = decode(&msg, &station_table());

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(850.0)));

        // A standard level with slashed height keeps its fixed pressure.
        let msg = raw_message(
            MessageType::TTAA,
            &["54121", "72357", "85///", "12021", "25520"],
        );
        let levels = decode(&msg, &station_table());
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pressure, some(HectoPascal(850.0)));
        assert!(levels[0].height.is_none());
        assert_eq!(levels[0].wind_dir, some(255.0));
    }
}
