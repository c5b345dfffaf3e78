//! Concrete adapter implementations for ports.

pub mod cached_data_port;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_cache;
pub mod typst_report;
pub mod yahoo_adapter;
