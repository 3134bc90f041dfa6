mod segment_loader;
pub use segment_loader::SegmentLoader;
