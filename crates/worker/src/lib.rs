//! Command-line harness for the media job client.

pub mod cli;
