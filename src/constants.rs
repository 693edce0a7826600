// Port configuration
pub const DEFAULT_PORT: u16 = 3001;

// Clustering
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 12.0; // ~12% of panorama width
pub const MAX_CLUSTERED_MARKERS: usize = 10; // O(n^2) pass, keep input small

// History
pub const DEFAULT_MAX_HISTORY_ENTRIES: usize = 100;
pub const HISTORY_CACHE_VERSION: u32 = 1;
pub const HISTORY_CACHE_FILE: &str = "history_v1.bin";

// SSE
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
pub const SSE_HEARTBEAT_SECS: u64 = 30;
pub const SSE_KEEPALIVE_SECS: u64 = 15;
