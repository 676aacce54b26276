use std::fmt;
use std::fmt::Write as FmtWrite;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::bpm::{normalize_float_digits, TimingPoint};
use super::simfile::{ParseError, Result};
use crate::config::{CHART_HASH_LENGTH, MEASURE_SEPARATOR};

static ROW_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("row break pattern is valid"));

/// Which simfile dialect a chart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimfileFormat {
    Sm,
    Ssc,
}

impl SimfileFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "sm" => Some(SimfileFormat::Sm),
            "ssc" => Some(SimfileFormat::Ssc),
            _ => None,
        }
    }
}

impl fmt::Display for SimfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimfileFormat::Sm => write!(f, "sm"),
            SimfileFormat::Ssc => write!(f, "ssc"),
        }
    }
}

#[inline]
fn is_all_zero(line: &str) -> bool {
    line.bytes().all(|b| b == b'0')
}

/// Minimizes measure lines while every other line is all-zero.
///
/// Only even line counts are halved (a 12-row measure stops after one pass
/// even when it could be thirded); the hash depends on exactly this.
pub fn minimize_measure(measure: &mut Vec<&str>) {
    while measure.len() >= 2 && measure.len() % 2 == 0 {
        if measure
            .iter()
            .skip(1)
            .step_by(2)
            .any(|line| !is_all_zero(line))
        {
            break;
        }
        let half_len = measure.len() / 2;
        for i in 0..half_len {
            measure[i] = measure[i * 2];
        }
        measure.truncate(half_len);
    }
}

/// Rewrites raw note data into its minimized form: blank lines dropped,
/// each measure minimized, measures joined by `\n,\n`.
pub fn minimize_chart(notes_data: &str) -> String {
    let measures: Vec<String> = notes_data
        .split(',')
        .map(|measure| {
            let mut lines: Vec<&str> = ROW_BREAKS
                .split(measure)
                .filter(|line| !line.is_empty())
                .collect();
            minimize_measure(&mut lines);
            lines.join("\n")
        })
        .collect();
    measures.join(MEASURE_SEPARATOR)
}

/// The GrooveStats v3 chart hash: the first 16 hex digits of
/// SHA-1(minimized notes + normalized BPMs).
///
/// # Errors
///
/// [`ParseError::UnsupportedFormat`] for `.ssc` charts, whose hash input is
/// built differently and is not implemented.
pub fn hash_chart(bpms: &[TimingPoint], notes_data: &str, format: SimfileFormat) -> Result<String> {
    if format == SimfileFormat::Ssc {
        return Err(ParseError::UnsupportedFormat(format.to_string()));
    }

    let mut input = minimize_chart(notes_data);
    input.push_str(&normalize_float_digits(bpms));

    let digest = Sha1::digest(input.as_bytes());
    let mut hash = String::with_capacity(CHART_HASH_LENGTH);
    for byte in digest.iter().take(CHART_HASH_LENGTH / 2) {
        let _ = write!(hash, "{byte:02x}");
    }
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_empty_odd_rows_until_they_are_not() {
        let mut measure = vec!["1000", "0000", "0100", "0000"];
        minimize_measure(&mut measure);
        assert_eq!(measure, vec!["1000", "0100"]);
    }

    #[test]
    fn minimizing_twice_changes_nothing() {
        let notes = "1000\n0000\n0000\n0000\n0100\n0000\n0000\n0000\n,\n1001\n0010\n0000\n";
        let once = minimize_chart(notes);
        assert_eq!(once, "1000\n0100\n,\n1001\n0010\n0000");
        assert_eq!(minimize_chart(&once), once);
    }

    #[test]
    fn odd_and_busy_measures_are_kept() {
        let mut triplets = vec!["1000", "0000", "0000"];
        minimize_measure(&mut triplets);
        assert_eq!(triplets, vec!["1000", "0000", "0000"]);

        let mut busy = vec!["1000", "0M00", "0100", "0000"];
        minimize_measure(&mut busy);
        assert_eq!(busy, vec!["1000", "0M00", "0100", "0000"]);
    }

    #[test]
    fn empty_measures_stay_empty() {
        assert_eq!(minimize_chart("1000\n0000\n,\n"), "1000\n,\n");
        let mut empty: Vec<&str> = Vec::new();
        minimize_measure(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn indented_rows_are_not_zero_rows() {
        let mut measure = vec!["1000", "  0000"];
        minimize_measure(&mut measure);
        assert_eq!(measure, vec!["1000", "  0000"]);
    }

    #[test]
    fn hash_is_sixteen_lowercase_hex_chars() {
        let bpms = [TimingPoint { beat: 0.0, value: 120.0 }];
        let hash = hash_chart(&bpms, "1000\n0000\n0000\n0000\n", SimfileFormat::Sm).expect("sm is hashable");
        assert_eq!(hash.len(), 16);
        assert!(hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert_eq!(hash, "85ea5e02343429e7");
    }

    #[test]
    fn padding_rows_do_not_change_the_hash() {
        let bpms = [TimingPoint { beat: 0.0, value: 120.0 }];
        let padded = "1000\r\n0000\r\n\r\n0000\n0000\n0000\n0000\n0000\n0000\n";
        let hash = hash_chart(&bpms, padded, SimfileFormat::Sm).expect("sm is hashable");
        assert_eq!(hash, "85ea5e02343429e7");
    }

    #[test]
    fn ssc_is_rejected() {
        let bpms = [TimingPoint { beat: 0.0, value: 120.0 }];
        let err = hash_chart(&bpms, "1000", SimfileFormat::Ssc).expect_err("ssc must not hash");
        assert!(matches!(err, ParseError::UnsupportedFormat(ref f) if f == "ssc"));
    }

    #[test]
    fn formats_from_extension() {
        assert_eq!(SimfileFormat::from_extension("SM"), Some(SimfileFormat::Sm));
        assert_eq!(SimfileFormat::from_extension("ssc"), Some(SimfileFormat::Ssc));
        assert_eq!(SimfileFormat::from_extension("dwi"), None);
    }
}
