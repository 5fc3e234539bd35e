//! Decoders turning message body tokens into level records.

mod mandatory;
mod sig_temp;
mod sig_wind;

use crate::bulletin::{MessageType, RawMessage};
use crate::station::StationTable;
use metfor::{Celsius, HectoPascal, Meters, Quantity};
use optional::{none, Optioned};

/// The missing value sentinel used at the external interface.
pub const MISSING: f64 = -9999.0;

/// Groups that are hard stops; nothing after them is decoded.
pub(crate) const STOP_GROUPS: [&str; 3] = ["51515", "41414", "31313"];

/// Groups that carry no level data and are skipped.
pub(crate) const PASS_GROUPS: [&str; 2] = ["88999", "77999"];

/// The marker that switches TTBB/TTDD and PPBB/PPDD bodies into their
/// winds-on-pressure-levels mode.
pub(crate) const WINDS_ALOFT_GROUP: &str = "21212";

/// One decoded level of an ascent.
///
/// Which fields are populated depends on the message type: mandatory levels
/// carry everything, significant temperature levels have no height or wind,
/// and significant wind levels have no temperature. Heights for significant
/// temperature levels are interpolated downstream, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// Pressure of the level (hPa).
    pub pressure: Optioned<HectoPascal>,
    /// Geopotential height of the level (m), or the station elevation for a
    /// surface group.
    pub height: Optioned<Meters>,
    /// Temperature (C).
    pub temperature: Optioned<Celsius>,
    /// Dew point (C).
    pub dew_point: Optioned<Celsius>,
    /// Wind direction in degrees true.
    pub wind_dir: Optioned<f64>,
    /// Wind speed, in the unit selected by the date group (see
    /// [`RawMessage::reports_winds_in_knots`]).
    pub wind_spd: Optioned<f64>,
    /// Set on the tropopause group of a mandatory level message.
    pub tropopause: bool,
}

impl Level {
    /// True when neither a pressure nor a height was decoded. Such records
    /// carry nothing that can be placed in a profile and are dropped.
    pub fn is_empty(&self) -> bool {
        self.pressure.is_none() && self.height.is_none()
    }

    /// Project the record onto the flat `-9999.0` sentinel convention.
    pub fn to_sentinel(&self) -> SentinelLevel {
        fn or_missing<T: Quantity>(value: Option<T>) -> f64 {
            value.map(Quantity::unpack).unwrap_or(MISSING)
        }

        SentinelLevel {
            lvl: or_missing(self.pressure.into_option()),
            hght: or_missing(self.height.into_option()),
            tmpc: or_missing(self.temperature.into_option()),
            dwpc: or_missing(self.dew_point.into_option()),
            wdir: self.wind_dir.into_option().unwrap_or(MISSING),
            wspd: self.wind_spd.into_option().unwrap_or(MISSING),
            trop: if self.tropopause { 1 } else { 0 },
        }
    }
}

impl Default for Level {
    fn default() -> Level {
        Level {
            pressure: none(),
            height: none(),
            temperature: none(),
            dew_point: none(),
            wind_dir: none(),
            wind_spd: none(),
            tropopause: false,
        }
    }
}

/// A level record in the flat wire representation, every missing numeric
/// field holding [`MISSING`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct SentinelLevel {
    pub lvl: f64,
    pub hght: f64,
    pub tmpc: f64,
    pub dwpc: f64,
    pub wdir: f64,
    pub wspd: f64,
    pub trop: i32,
}

/// Decode one message into its level records.
///
/// The station table supplies the surface elevation for TTAA surface groups.
/// PPAA/PPCC (winds at mandatory pressure levels) are recognized on the feed
/// but carry nothing the profile decoders consume, so they decode to an
/// empty list.
pub fn decode_message(msg: &RawMessage, stations: &StationTable) -> Vec<Level> {
    match msg.msg_type {
        MessageType::TTAA | MessageType::TTCC => mandatory::decode(msg, stations),
        MessageType::TTBB | MessageType::TTDD => sig_temp::decode(msg),
        MessageType::PPBB | MessageType::PPDD => sig_wind::decode(msg),
        MessageType::PPAA | MessageType::PPCC => Vec::new(),
    }
}
