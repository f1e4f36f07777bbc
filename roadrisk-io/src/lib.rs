//! roadrisk-io: File I/O for roadrisk.
//!
//! This crate reads accident records from JSON or CSV, reads hotspot sets
//! back from JSON, and writes any serializable result as pretty JSON.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{
    parse_accidents_csv, parse_accidents_json, parse_hotspots_json, read_accidents,
    read_hotspots, read_json, DataFormat, LoadedHotspots, ParsedAccidents,
};
pub use writer::write_json;
