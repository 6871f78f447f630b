// Constants for the script driver

/// Default byte budget for the snapshot history (256 MiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;

/// Interval between steps in auto-play mode, in milliseconds
pub const PLAY_INTERVAL_MS: u64 = 700;
