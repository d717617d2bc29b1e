pub mod file;
pub mod kafka;
pub mod loki;

pub use file::FileSink;
pub use kafka::KafkaSink;
pub use loki::LokiSink;
