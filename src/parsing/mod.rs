pub mod bpm;
pub mod hash;
pub mod parse;
pub mod simfile;
pub mod stats;
