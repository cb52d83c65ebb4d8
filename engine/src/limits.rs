// Default streaming radius, in mesh cells around the observer's cell.
// The number of resident meshes grows roughly with 4/3 * pi * RADIUS³.
pub const DEFAULT_RADIUS: u32 = 8;

// How many sync markers separate the chunk jobs of a shell from its mesh jobs.
pub const DEFAULT_SYNC_REPETITIONS: u32 = 1;

// Minimum time between two task buffer swaps. Bounds upload bursts on the render side.
pub const DEFAULT_MIN_SWAP_INTERVAL_MS: u64 = 50;

// Upper bound for meshes uploaded per lap, checked at sync markers. 0 disables the limit.
pub const DEFAULT_LAP_UPLOAD_BUDGET: usize = 256;

// Capacity of the lap report ring buffer between the loader and the consumer.
pub const DEFAULT_REPORT_CAPACITY: usize = 64;
