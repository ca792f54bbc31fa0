// Cache module for the local image directory.
// Derives file names, indexes cached timestamps and writes images atomically.

pub mod lock;
pub mod paths;
pub mod store;

pub use lock::RunLock;
pub use store::{file_names, known_timestamps, list_images, scan_known_timestamps, write_bytes};
