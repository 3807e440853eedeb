//! Library surface of the `evlayout` binary: logging setup, reader option
//! loading and output writers.

pub mod config;
pub mod logging;
pub mod output;
