// Charts
pub const SUPPORTED_STEPSTYPE: &str = "dance-single";
pub const STREAM_THRESHOLD: u32 = 16; // Active rows for a measure to count as stream
pub const BEATS_PER_MEASURE: f64 = 4.0;

// Stream BPM estimate
pub const BPM_DEVIATION_TOLERANCE: f64 = 1.0; // Charts drifting further than this from the first BPM get no estimate
pub const TIER_MIN_SHARE: f64 = 0.05; // Fraction of total stream a note density needs to set the tier

// Breakdown thresholds (partially simplified mode)
pub const SHORT_BREAK_MAX: u32 = 4; // `-`
pub const MEDIUM_BREAK_LIMIT: u32 = 32; // `/` below this, `|` at or above
pub const FULL_DENSITY: f64 = 100.0;

// Chart hash
pub const CHART_HASH_LENGTH: usize = 16; // Hex chars kept from the SHA-1 digest
pub const MEASURE_SEPARATOR: &str = "\n,\n";

// Batch
pub const DEFAULT_SIMFILE_PATTERN: &str = "**/*.sm";
