#![warn(missing_docs)]
//! Library to parse and decode WMO upper air sounding bulletins.
//!
//! The input is the raw text of a meteorological data feed file: one or more
//! transmissions framed by control characters, each carrying an abbreviated
//! header and one or more TEMP/PILOT messages (TTAA, TTBB, PPBB, ...) in
//! traditional alphanumeric code. The output is decoded level records
//! organized by observation time, WMO station number, and message type, with
//! retransmissions reconciled and off-hour corrections grouped onto the
//! synoptic hour.
//!
//! ```no_run
//! use sounding_wmo::{decode_bulletin, StationTable};
//! use std::path::Path;
//!
//! let stations = StationTable::load(Path::new("snstns.tbl")).unwrap();
//! let text = std::fs::read_to_string("20220104.uair").unwrap();
//! for (time, by_station) in decode_bulletin(&text, &stations) {
//!     for (station, by_type) in by_station {
//!         for (msg_type, levels) in by_type {
//!             println!("{} {} {}: {} levels", time, station, msg_type, levels.len());
//!         }
//!     }
//! }
//! ```

//
// API
//

pub use crate::bulletin::{
    decode_bulletin, Bulletin, BulletinFile, DecodedRecords, MessageRecords, MessageType,
    RawMessage,
};
pub use crate::decode::{decode_message, Level, SentinelLevel, MISSING};
pub use crate::error::*;
pub use crate::station::{Station, StationTable};

//
// Internal use only
//

mod bulletin;
mod decode;
mod error;
mod groups;
mod station;
