pub mod compression;
pub mod delimited;
pub mod json;
pub mod json_array;

/// Default buffer size for file readers and writers (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default number of elements written between explicit flushes of a JSON array.
pub const DEFAULT_FLUSH_INTERVAL: usize = 1000;
