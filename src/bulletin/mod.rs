//! Module for breaking a raw feed file into transmissions and messages, and
//! slotting the messages by observation time, station, and message type.

mod message;

pub use self::message::{MessageType, RawMessage};

use crate::decode::{decode_message, Level};
use crate::error::BulletinFormatError;
use crate::station::StationTable;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::path::Path;

/// Reconciled raw messages organized `time -> station -> message type`.
pub type MessageRecords = BTreeMap<String, BTreeMap<String, BTreeMap<MessageType, RawMessage>>>;

/// Decoded level records organized `time -> station -> message type`.
pub type DecodedRecords = BTreeMap<String, BTreeMap<String, BTreeMap<MessageType, Vec<Level>>>>;

/// Decode bulletin text into level records.
///
/// Purely functional: parses, reconciles retransmissions, and decodes every
/// surviving message against the supplied station table.
pub fn decode_bulletin(text: &str, stations: &StationTable) -> DecodedRecords {
    Bulletin::parse(text).decode(stations)
}

/// Hold an entire bulletin file in memory.
pub struct BulletinFile {
    file_text: String,
}

impl BulletinFile {
    /// Load a file into memory.
    pub fn load(path: &Path) -> Result<BulletinFile, std::io::Error> {
        use std::fs::File;
        use std::io::prelude::Read;
        use std::io::BufReader;

        let mut file = BufReader::new(File::open(path)?);
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Ok(BulletinFile {
            file_text: contents,
        })
    }

    /// The raw file text.
    pub fn text(&self) -> &str {
        &self.file_text
    }

    /// Parse the transmissions in this file into reconciled message slots.
    pub fn parse(&self) -> Bulletin {
        Bulletin::parse(&self.file_text)
    }

    /// Ensure the file carries at least one decodable message.
    pub fn validate_format(&self) -> Result<(), BulletinFormatError> {
        if self.parse().is_empty() {
            Err(BulletinFormatError::new())
        } else {
            Ok(())
        }
    }
}

/// The parsed, reconciled contents of one bulletin file.
pub struct Bulletin {
    records: MessageRecords,
}

impl Bulletin {
    /// Parse raw feed text.
    ///
    /// Transmissions that cannot be split, messages of unrecognized type,
    /// and NIL placeholders are dropped; everything decodable is slotted.
    pub fn parse(text: &str) -> Bulletin {
        let mut bulletin = Bulletin {
            records: BTreeMap::new(),
        };

        for transmission in split_transmissions(text) {
            let (header, messages) = match format_messages(&transmission) {
                Some(split) => split,
                None => {
                    debug!("dropping transmission with no usable header");
                    continue;
                }
            };

            for tokens in messages {
                if is_nil_message(&tokens) {
                    trace!("dropping NIL message");
                    continue;
                }
                match RawMessage::from_tokens(&header, tokens) {
                    Some(msg) => bulletin.insert(msg),
                    None => debug!("skipping message with unrecognized type"),
                }
            }
        }

        bulletin
    }

    /// The reconciled message slots.
    pub fn records(&self) -> &MessageRecords {
        &self.records
    }

    /// True when no message was slotted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode every slotted message into level records.
    pub fn decode(&self, stations: &StationTable) -> DecodedRecords {
        let mut out = DecodedRecords::new();

        for (time, by_station) in &self.records {
            for (station, by_type) in by_station {
                for (msg_type, msg) in by_type {
                    out.entry(time.clone())
                        .or_default()
                        .entry(station.clone())
                        .or_default()
                        .insert(*msg_type, decode_message(msg, stations));
                }
            }
        }

        out
    }

    fn insert(&mut self, mut msg: RawMessage) {
        let time_key = self.synoptic_time_key(&msg.time_str);
        msg.time_str = time_key.clone();

        let slot = self
            .records
            .entry(time_key)
            .or_default()
            .entry(msg.station_id.clone())
            .or_default();

        // Retransmission reconciliation: with two coded broadcasts the
        // string ordering of the codes decides, with neither coded the
        // longer body wins, and a coded broadcast beats an uncoded one.
        let keep_old = match slot.get(&msg.msg_type) {
            Some(old) => match (&old.transmission_code, &msg.transmission_code) {
                (None, None) => old.body.len() > msg.body.len(),
                (Some(old_code), Some(new_code)) => old_code > new_code,
                (Some(_), None) => true,
                (None, Some(_)) => false,
            },
            None => false,
        };

        if !keep_old {
            slot.insert(msg.msg_type, msg);
        }
    }

    /// Pick the record key for an observation time.
    ///
    /// Corrected broadcasts list times a few minutes past the hour. A time
    /// within 10 minutes of an existing key for the same day and hour is
    /// grouped under whichever of the two is the whole hour.
    fn synoptic_time_key(&self, time_str: &str) -> String {
        let mut key = time_str.to_string();
        let prefix = match time_str.get(..4) {
            Some(p) => p,
            None => return key,
        };

        for existing in self.records.keys() {
            if !existing.starts_with(prefix) {
                continue;
            }

            let (synop, other) = if minute_digits(existing) == "00" {
                (existing.as_str(), time_str)
            } else {
                (time_str, existing.as_str())
            };

            let synop_min = minute_digits(synop).parse::<i32>();
            let other_min = minute_digits(other).parse::<i32>();
            if let (Ok(synop_min), Ok(other_min)) = (synop_min, other_min) {
                if (synop_min - other_min).abs() <= 10 {
                    key = synop.to_string();
                }
            }
        }

        key
    }
}

fn minute_digits(time_str: &str) -> &str {
    time_str
        .get(time_str.len().saturating_sub(2)..)
        .unwrap_or("")
}

const ETX: char = '\u{03}';
const SOH: char = '\u{01}';

/// Segments the feed treats as padding between markers.
fn is_ignorable(segment: &str) -> bool {
    matches!(segment, "" | "\n" | "\n\n" | "\n\n\n")
}

/// Split raw text into transmissions, each a list of `=`-terminated message
/// segments. CR and SOH are stripped, ETX separates transmissions.
fn split_transmissions(text: &str) -> Vec<Vec<String>> {
    let cleaned: String = text.chars().filter(|&c| c != '\r' && c != SOH).collect();

    cleaned
        .split(ETX)
        .filter(|t| !is_ignorable(t))
        .map(|t| {
            t.split('=')
                .filter(|m| !is_ignorable(m))
                .map(str::to_string)
                .collect::<Vec<String>>()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a transmission into its header tokens and per-message body tokens.
///
/// The first segment opens with the sequence number line, then the
/// abbreviated header line, then the first message. Within each segment
/// everything ahead of the first token naming a message type is discarded,
/// and standalone NIL/NILL/XMTD markers are stripped.
fn format_messages(segments: &[String]) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut header: Option<Vec<String>> = None;
    let mut messages = Vec::new();

    for (midx, segment) in segments.iter().enumerate() {
        let lines: Vec<&str> = segment.split('\n').filter(|l| !is_ignorable(l)).collect();

        let mut parts: Vec<String> = if lines.len() == 1 {
            lines[0].split(' ').map(str::to_string).collect()
        } else {
            lines.iter().map(|l| l.to_string()).collect()
        };

        if midx == 0 {
            if parts.len() < 2 {
                return None;
            }
            header = Some(parts[1].split(' ').map(str::to_string).collect());
            parts = parts.split_off(2);
        }

        let start = parts
            .iter()
            .position(|p| MessageType::ALL.iter().any(|t| p.contains(t.as_str())))
            .unwrap_or(0);

        let mut tokens: Vec<String> = Vec::new();
        for part in &parts[start..] {
            for tok in part.split(' ') {
                if !is_ignorable(tok) {
                    tokens.push(tok.to_string());
                }
            }
        }

        let start = tokens
            .iter()
            .position(|t| MessageType::ALL.iter().any(|ty| t.contains(ty.as_str())))
            .unwrap_or(0);
        let mut tokens = tokens.split_off(start);

        tokens.retain(|t| {
            let upper = t.to_uppercase();
            upper != "NIL" && upper != "NILL" && upper != "XMTD"
        });

        if !tokens.is_empty() {
            messages.push(tokens);
        }
    }

    header.map(|h| (h, messages))
}

const NIL_MARKERS: [&str; 8] = [
    "/////",
    "MISDA",
    "SUSPENDED",
    "NIL",
    "NILL",
    "NNNN",
    "XMTD",
    "@",
];

/// A message that is only a placeholder for a missed ascent.
fn is_nil_message(tokens: &[String]) -> bool {
    if tokens.len() <= 2 {
        return true;
    }
    let first = tokens[0].to_uppercase();
    let second = tokens[1].to_uppercase();
    NIL_MARKERS.contains(&first.as_str()) || NIL_MARKERS.contains(&second.as_str())
}
