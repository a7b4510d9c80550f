//! Glyphrun front end
//!
//! Configuration, logging, image decoding and output for the `glyphrun`
//! command.

pub mod colored_logger;
pub mod config;
pub mod decode;
pub mod output;
