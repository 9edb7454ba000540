//! Decoders for the BL-NET/D-LOGG binary protocol and the CMI JSON API
//!
//! All decoders are pure: bytes or JSON in, [`blnet_core::SensorRecord`] or
//! an error out. A record is produced completely or not at all.

pub mod binary;
pub mod cmi;
pub mod header;
pub mod layout;

pub use binary::{decode_frame, decode_input, decode_speed_level};
pub use cmi::{decode_document, parse_document, CmiDocument, CmiHeader};
pub use header::{parse_header, HeaderFrame};
pub use layout::{layout_for, FrameLayout};
