/// Default grid height when `GRID_ROWS` is not configured
pub const DEFAULT_GRID_ROWS: u32 = 100;

/// Default grid width when `GRID_COLS` is not configured
pub const DEFAULT_GRID_COLS: u32 = 100;

/// Upper bound on rows * cols, so the slot table stays small
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// Events each subscriber may fall behind before it is resynced with a snapshot
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Largest accepted `SUBSCRIBER_BUFFER`; past this a snapshot resync is cheaper
pub const MAX_SUBSCRIBER_BUFFER: usize = 65_536;

/// Most claimed blocks merged into a single push message
pub const MAX_COALESCED_BLOCKS: usize = 64;

/// Largest text frame accepted from a WebSocket client (1KB)
pub const MAX_CLIENT_MESSAGE_BYTES: usize = 1024;

/// Claims one client may submit per second, per IP over HTTP and per
/// WebSocket connection
pub const MAX_CLAIMS_PER_SECOND: usize = 20;

/// Display name used when the identity carries no usable name
pub const ANONYMOUS_NAME: &str = "Anonymous";
