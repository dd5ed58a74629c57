pub mod analyzer;
pub mod logger;
pub mod printer;
pub mod reader;
pub mod watchdog;

pub use logger::LogSink;
