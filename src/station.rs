//! The station metadata table, keyed on WMO id.
//!
//! The table is a fixed-width columnar text file with `!` comment lines, in
//! the layout used by the sounding station tables that ship with GEMPAK and
//! NSHARP:
//!
//! ```text
//! !STID    STNM    NAME                             ST CO  LAT     LON      ELEV   PRI
//! KOUN     72357   NORMAN                           OK US  35.18   -97.44   357    0
//! ```
//!
//! Every column is kept as a string; the elevation is parsed to meters on
//! demand.
use log::warn;
use metfor::Meters;
use optional::{none, some, Optioned};
use std::collections::HashMap;
use std::path::Path;

// Byte offsets of each column. Lines shorter than a column's end are
// tolerated, the field is whatever is left.
const COL_SITE_ID: (usize, usize) = (0, 9);
const COL_WMO_ID: (usize, usize) = (9, 17);
const COL_NAME: (usize, usize) = (17, 50);
const COL_STATE: (usize, usize) = (50, 53);
const COL_COUNTRY: (usize, usize) = (53, 57);
const COL_LAT: (usize, usize) = (57, 65);
const COL_LON: (usize, usize) = (65, 74);
const COL_ELEV: (usize, usize) = (74, 81);
const COL_FLAG: (usize, usize) = (81, 90);

/// One row of the station table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Alphanumeric site designation, e.g. `KOUN`.
    pub site_id: String,
    /// WMO station number as a string of digits, e.g. `72357`.
    pub wmo_id: String,
    /// Site name.
    pub name: String,
    /// State or province.
    pub state: String,
    /// Country code.
    pub country: String,
    /// Latitude column, unparsed.
    pub latitude: String,
    /// Longitude column, unparsed.
    pub longitude: String,
    /// Elevation column, unparsed. Use [`Station::elevation_m`].
    pub elevation: String,
    /// Priority/flag column.
    pub flag: String,
}

impl Station {
    /// The station elevation in meters, if the column parses.
    pub fn elevation_m(&self) -> Optioned<Meters> {
        match self.elevation.trim().parse::<f64>() {
            Ok(elev) => some(Meters(elev)),
            Err(_) => none(),
        }
    }
}

enum IndexEntry {
    Unique(usize),
    Duplicated,
}

/// The full station table, loaded once and shared read-only by decoders.
pub struct StationTable {
    stations: Vec<Station>,
    by_wmo_id: HashMap<String, IndexEntry>,
}

impl StationTable {
    /// Load a station table file into memory.
    pub fn load(path: &Path) -> Result<StationTable, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(StationTable::parse(&contents))
    }

    /// Parse station table text.
    ///
    /// Lines starting with `!` are comments. Rows without a WMO id are
    /// skipped; they cannot be looked up.
    pub fn parse(text: &str) -> StationTable {
        let mut stations = Vec::new();
        let mut by_wmo_id = HashMap::new();

        for line in text.lines() {
            if line.trim().is_empty() || line.trim_start().starts_with('!') {
                continue;
            }

            let station = Station {
                site_id: column(line, COL_SITE_ID),
                wmo_id: column(line, COL_WMO_ID),
                name: column(line, COL_NAME),
                state: column(line, COL_STATE),
                country: column(line, COL_COUNTRY),
                latitude: column(line, COL_LAT),
                longitude: column(line, COL_LON),
                elevation: column(line, COL_ELEV),
                flag: column(line, COL_FLAG),
            };

            if station.wmo_id.is_empty() {
                continue;
            }

            let idx = stations.len();
            by_wmo_id
                .entry(station.wmo_id.clone())
                .and_modify(|e| *e = IndexEntry::Duplicated)
                .or_insert(IndexEntry::Unique(idx));
            stations.push(station);
        }

        StationTable {
            stations,
            by_wmo_id,
        }
    }

    /// Look up a station by WMO id. Returns the row only when the id is
    /// unique in the table.
    pub fn get(&self, wmo_id: &str) -> Option<&Station> {
        match self.by_wmo_id.get(wmo_id) {
            Some(IndexEntry::Unique(idx)) => self.stations.get(*idx),
            _ => None,
        }
    }

    /// The elevation of the station with the given WMO id.
    ///
    /// A missing station, a WMO id with more than one table row, and an
    /// unreadable elevation column all log a warning and return zero so that
    /// decoding can continue.
    pub fn elevation(&self, wmo_id: &str) -> Meters {
        match self.by_wmo_id.get(wmo_id) {
            Some(IndexEntry::Unique(idx)) => {
                let station = &self.stations[*idx];
                match station.elevation_m().into_option() {
                    Some(elevation) => elevation,
                    None => {
                        warn!(
                            "unreadable elevation {:?} for station {}",
                            station.elevation, wmo_id
                        );
                        Meters(0.0)
                    }
                }
            }
            Some(IndexEntry::Duplicated) => {
                warn!("more than one station table row for {}", wmo_id);
                Meters(0.0)
            }
            None => {
                warn!("unable to find station {}", wmo_id);
                Meters(0.0)
            }
        }
    }

    /// The number of rows in the table.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

fn column(line: &str, (start, end): (usize, usize)) -> String {
    let end = end.min(line.len());
    if start >= end {
        return String::new();
    }
    line.get(start..end).unwrap_or("").trim().to_string()
}
