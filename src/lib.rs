//! Parses StepMania `.sm` simfiles and derives the chart data GrooveStats-style
//! score trackers key on: the v3 chart hash, stream breakdowns, stream BPM,
//! per-measure NPS and chart length.
//!
//! ```
//! let doc = smhash::parse_simfile("#TITLE:Song;#ARTIST:Someone;#BPMS:0=150;")?;
//! assert!(doc.charts.is_empty());
//! # Ok::<(), smhash::ParseError>(())
//! ```

pub mod batch;
pub mod config;
pub mod parsing;
pub mod utils;

pub use parsing::bpm::TimingPoint;
pub use parsing::hash::{hash_chart, SimfileFormat};
pub use parsing::simfile::{
    parse_chart, parse_simfile, parse_simfile_file, Chart, ChartMetadata, Document, ParseError,
    Result,
};
pub use parsing::stats::{create_breakdowns, Breakdown};
