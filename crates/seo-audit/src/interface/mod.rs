//! Report rendering for terminals and machine consumers

pub mod formatter;

pub use formatter::{FormatterFactory, JsonFormatter, OutputFormat, ReportFormatter, TextFormatter};
