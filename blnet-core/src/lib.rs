//! Core types and utilities for the BL-NET/D-LOGG and CMI protocols
//!
//! This crate provides the data model, error handling, bit helpers and the
//! static lookup tables shared by the binary and the JSON decoders.

pub mod bits;
pub mod command;
pub mod device;
pub mod error;
pub mod hexdump;
pub mod record;
pub mod status;
pub mod units;

pub use command::{Command, CmiRequest};
pub use device::{DeviceHeader, DeviceInfo, DeviceType, LoggerMode};
pub use error::{BlnetError, BlnetResult};
pub use record::{Measurement, SensorRecord, SensorRecordBuilder};
pub use status::CmiStatus;
