//! Decoder for the significant temperature level messages, TTBB below
//! 100 hPa and TTDD above it.
//!
//! The body is a run of pairs: an `nnPPP` level group (indicator pair plus
//! pressure digits) followed by a temperature/dew point group. The `21212`
//! marker switches the rest of the body to winds on pressure levels, where
//! the second group of each pair is a wind group instead.
use super::{Level, STOP_GROUPS, WINDS_ALOFT_GROUP};
use crate::bulletin::{MessageType, RawMessage};
use crate::groups;
use metfor::HectoPascal;
use optional::some;

pub(crate) fn decode(msg: &RawMessage) -> Vec<Level> {
    let body = &msg.body;
    let mut levels = Vec::new();
    let mut additional_winds = false;

    // body[0] is the date group and body[1] the station number.
    let mut idx = 2;
    while idx < body.len() {
        let group = body[idx].as_str();
        if STOP_GROUPS.contains(&group) {
            break;
        }
        if group == WINDS_ALOFT_GROUP {
            additional_winds = true;
            idx += 1;
            continue;
        }

        match decode_pair(msg, idx, additional_winds) {
            Some(level) => {
                if !level.is_empty() {
                    levels.push(level);
                }
            }
            // The level group has no payload to pair with.
            None => break,
        }
        idx += 2;
    }

    levels
}

/// Decode the `(level, payload)` pair at `idx`.
///
/// Returns an empty record for slashed or NIL levels so the caller steps
/// over the pair, and `None` when the body ends before the payload.
fn decode_pair(msg: &RawMessage, idx: usize, additional_winds: bool) -> Option<Level> {
    let body = &msg.body;
    let group = body[idx].as_str();
    let mut level = Level::default();

    if groups::has_missing_marker(group.get(2..).unwrap_or("")) || group == "NIL" {
        return Some(level);
    }

    let raw: i64 = match group.get(2..).and_then(|s| s.parse().ok()) {
        Some(v) => v,
        None => return Some(level),
    };

    let mut lvl = if msg.msg_type == MessageType::TTDD {
        raw as f64 / 10.0
    } else {
        raw as f64
    };

    // The 00 indicator pair marks the surface; the rest run 11, 22, .. 99
    // and wrap. Surface pressures below 300 fold above 1000 hPa, and for
    // TTBB so does any level below 100.
    if group.get(..2) == Some("00") {
        if lvl < 300.0 {
            lvl += 1000.0;
        }
    } else if msg.msg_type == MessageType::TTBB && lvl < 100.0 {
        lvl += 1000.0;
    }

    let payload = body.get(idx + 1)?;

    level.pressure = some(HectoPascal(lvl));
    if additional_winds {
        let (wdir, wspd) = groups::wind_group(payload);
        level.wind_dir = wdir;
        level.wind_spd = wspd;
    } else {
        let (t, td) = groups::temp_group(payload);
        level.temperature = t;
        level.dew_point = td;
    }

    Some(level)
}
