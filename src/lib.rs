#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod driver;
pub mod emit;
pub mod error;
pub mod graph;
pub mod util;
