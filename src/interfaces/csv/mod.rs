//! CSV adapters for batch submission input and the outcome report.

pub mod report_writer;
pub mod transaction_reader;
