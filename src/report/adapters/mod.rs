//! Adapter implementations for report sources and sinks.

pub mod csv_writer;
pub mod memory;
pub mod postgres;
