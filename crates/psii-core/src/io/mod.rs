pub mod image_io;
pub mod manifest;
pub mod sink;
pub mod table;

pub use manifest::{FramePairProvider, Manifest};
pub use sink::{Artifact, FsSink, MemorySink, OutputSink};
