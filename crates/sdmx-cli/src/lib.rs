//! CLI library components for the SDMX census toolkit.

pub mod logging;
