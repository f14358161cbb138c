//! bleep - sample table build tool for the Bleep Drum
//!
//! Converts WAV files into the 8-bit `PROGMEM` lookup tables the firmware
//! plays back, and keeps `platformio.ini` and the `samples.h` dispatch header
//! in sync with the environments those tables belong to.

pub mod budget;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod pio;
pub mod quantize;
pub mod registry;
pub mod table;
pub mod wav;

pub use error::{Error, Result};
