//! A single coded message lifted out of a transmission, not yet decoded.
use crate::error::BulletinFormatError;
use crate::groups;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// The WMO upper air message types carried on the feed.
///
/// `TT*` messages carry temperature/height data and `PP*` messages carry
/// winds; the `A`/`B` suffixes are mandatory and significant levels below
/// 100 hPa, `C`/`D` the same above 100 hPa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum MessageType {
    TTAA,
    TTBB,
    TTCC,
    TTDD,
    PPAA,
    PPBB,
    PPCC,
    PPDD,
}

impl MessageType {
    /// All known types, in the order the bulletin parser scans for them.
    pub const ALL: [MessageType; 8] = [
        MessageType::TTAA,
        MessageType::TTBB,
        MessageType::PPBB,
        MessageType::PPDD,
        MessageType::TTCC,
        MessageType::TTDD,
        MessageType::PPAA,
        MessageType::PPCC,
    ];

    /// The four character code as transmitted.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::TTAA => "TTAA",
            MessageType::TTBB => "TTBB",
            MessageType::TTCC => "TTCC",
            MessageType::TTDD => "TTDD",
            MessageType::PPAA => "PPAA",
            MessageType::PPBB => "PPBB",
            MessageType::PPCC => "PPCC",
            MessageType::PPDD => "PPDD",
        }
    }
}

impl FromStr for MessageType {
    type Err = BulletinFormatError;

    fn from_str(s: &str) -> Result<MessageType, BulletinFormatError> {
        MessageType::ALL
            .iter()
            .cloned()
            .find(|t| t.as_str() == s)
            .ok_or_else(BulletinFormatError::new)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coded message and the header context of its transmission.
///
/// The body token stream starts with the `YYGGa` date group, then the WMO
/// station number, then the level groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// The message type token that led the message.
    pub msg_type: MessageType,
    /// The abbreviated header tokens of the carrying transmission.
    pub header: Vec<String>,
    /// The body groups, date group first.
    pub body: Vec<String>,
    /// Observation time from the header, `DDHHmm`. The aggregator may fold
    /// this onto the synoptic hour on insert.
    pub time_str: String,
    /// WMO station number, taken from the second body group.
    pub station_id: String,
    /// Retransmission code from the header (`RRA`, `CCA`, ...), when present.
    pub transmission_code: Option<String>,
}

impl RawMessage {
    /// Build a message from the transmission header and its body tokens.
    ///
    /// The first token must be a known message type and the header must
    /// carry at least `(station bits, origin, time)`; anything else returns
    /// `None` and the caller skips the message.
    pub(crate) fn from_tokens(header: &[String], tokens: Vec<String>) -> Option<RawMessage> {
        let msg_type = tokens.first()?.parse::<MessageType>().ok()?;
        let body: Vec<String> = tokens.into_iter().skip(1).collect();
        let station_id = body.get(1)?.clone();
        let time_str = header.get(2)?.clone();
        let transmission_code = header.get(3).cloned();

        Some(RawMessage {
            msg_type,
            header: header.to_vec(),
            body,
            time_str,
            station_id,
            transmission_code,
        })
    }

    /// Resolve the `DDHHmm` observation time against a year and month.
    ///
    /// The wire format carries no year or month; the caller supplies them
    /// from the file name or the feed schedule. Returns `None` when the time
    /// string or the resulting date is invalid.
    pub fn valid_time(&self, year: i32, month: u32) -> Option<NaiveDateTime> {
        let day: u32 = self.time_str.get(..2)?.parse().ok()?;
        let hour: u32 = self.time_str.get(2..4)?.parse().ok()?;
        let minute: u32 = match self.time_str.get(4..6) {
            Some(mm) => mm.parse().ok()?,
            None => 0,
        };

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
    }

    /// Whether the date group reports wind speeds in knots rather than m/s.
    ///
    /// `None` when the date group is unreadable.
    pub fn reports_winds_in_knots(&self) -> Option<bool> {
        let dg = groups::date_group(self.body.first()?, self.msg_type)?;
        Some(dg.wind_in_knots)
    }
}
