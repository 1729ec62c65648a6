//! Utility helpers: explicitly released buffers, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod profiling;

pub use allocator::PersistentBuffer;
pub use profiling::PublishProfile;
