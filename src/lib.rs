//! Library crate for nmap-wrap-rs: scan options in, nmap invocation and report out.
pub mod app;
pub mod cli;
pub mod command;
pub mod console;
pub mod error;
pub mod logging;
pub mod ports;
pub mod report;
pub mod runner;
pub mod targets;
pub mod toolcheck;
pub mod types;
