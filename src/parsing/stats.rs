use serde::{Deserialize, Serialize};

use crate::config::{FULL_DENSITY, MEDIUM_BREAK_LIMIT, SHORT_BREAK_MAX, STREAM_THRESHOLD};
use crate::utils::format::{to_display, to_fixed};

/// Taps, hold heads and roll heads. Tails, mines, lifts and fakes are not
/// something the player steps on to start.
#[inline]
pub fn is_step(byte: u8) -> bool {
    matches!(byte, b'1' | b'2' | b'4')
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub detailed: String,
    pub partially_simplified: String,
    pub simplified: String,
    pub total: String,
    pub density: f64,
}

/// How aggressively breaks are folded into symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownMode {
    /// Single-measure breaks become `-`, longer ones ` (n)`.
    Basic,
    /// Breaks become `-` (up to 4), `/` (under 32) or `|`.
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Break,
    Stream,
}

#[inline]
fn is_stream(notes: u32) -> bool {
    notes >= STREAM_THRESHOLD
}

#[inline]
fn stream_measures(notes: u32) -> f64 {
    f64::from(notes) / f64::from(STREAM_THRESHOLD)
}

/// Counts rows holding at least one step in every `,`-separated measure.
pub fn count_notes_per_measure(notes_data: &str) -> Vec<u32> {
    notes_data
        .split(',')
        .map(|measure| {
            measure
                .split('\n')
                .filter(|line| line.bytes().any(is_step))
                .count() as u32
        })
        .collect()
}

/// Symbol written for a finished break of `run` measures.
pub fn break_symbol(mode: BreakdownMode, run: u32) -> String {
    match mode {
        BreakdownMode::Basic if run <= 1 => "-".to_owned(),
        BreakdownMode::Basic => format!(" ({run})"),
        BreakdownMode::Medium if run <= SHORT_BREAK_MAX => "-".to_owned(),
        BreakdownMode::Medium if run < MEDIUM_BREAK_LIMIT => "/".to_owned(),
        BreakdownMode::Medium => "|".to_owned(),
    }
}

/// Appends a finished stream, rounded to whole measures. A stream right after
/// a parenthesised break is separated by a space.
pub fn push_stream(breakdown: &mut String, measures: f64) {
    if breakdown.ends_with(')') {
        breakdown.push(' ');
    }
    breakdown.push_str(&to_fixed(measures, 0));
}

/// Walks the measures as a two-state machine (break / stream).
///
/// A stream is only written once a break follows it, so a chart that ends
/// mid-stream leaves its last stream out of the string.
pub fn generate_breakdown(notes_per_measure: &[u32], mode: BreakdownMode) -> String {
    let mut breakdown = String::new();
    let mut state = RunState::Break;
    let mut break_run = 0u32;
    let mut stream_size = 0.0;

    for &notes in notes_per_measure {
        match (state, is_stream(notes)) {
            (RunState::Break, true) => {
                state = RunState::Stream;
                // The leading break is never written.
                if !breakdown.is_empty() {
                    breakdown.push_str(&break_symbol(mode, break_run));
                    break_run = 0;
                }
                stream_size += stream_measures(notes);
            }
            (RunState::Stream, true) => stream_size += stream_measures(notes),
            (RunState::Stream, false) => {
                state = RunState::Break;
                push_stream(&mut breakdown, stream_size);
                stream_size = 0.0;
            }
            (RunState::Break, false) => break_run += 1,
        }
    }

    breakdown
}

fn sum_segment(segment: &str) -> f64 {
    segment
        .split('-')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| !v.is_nan()).unwrap_or(0.0))
        .sum()
}

/// Collapses a partially simplified breakdown: streams joined by `-` are summed
/// and starred, so `2-3/8` becomes `5*/8`.
pub fn fully_simplify(partially_simplified: &str) -> String {
    let mut simplified = String::with_capacity(partially_simplified.len());
    let mut segment = String::new();

    for ch in partially_simplified.chars() {
        if ch == '|' || ch == '/' {
            simplified.push_str(&to_fixed(sum_segment(&segment), 0));
            simplified.push('*');
            simplified.push(ch);
            segment.clear();
        } else {
            segment.push(ch);
        }
    }

    if segment.contains('-') {
        simplified.push_str(&to_display(sum_segment(&segment)));
        simplified.push('*');
    } else {
        simplified.push_str(&segment);
    }

    // Trailing divider only; a trailing `*` stays.
    if simplified.ends_with(['|', '/', '-']) {
        simplified.pop();
    }
    simplified
}

/// Total measures of stream, unrounded.
pub fn calculate_total(notes_per_measure: &[u32]) -> String {
    let total: f64 = notes_per_measure
        .iter()
        .filter(|&&n| is_stream(n))
        .map(|&n| stream_measures(n))
        .sum();
    to_display(total)
}

/// Share of stream between the first and last stream measure, as a
/// percentage.
pub fn calculate_density(notes_per_measure: &[u32]) -> f64 {
    let first = notes_per_measure.iter().position(|&n| is_stream(n));
    let last = notes_per_measure.iter().rposition(|&n| is_stream(n));
    let (Some(first), Some(last)) = (first, last) else {
        return FULL_DENSITY;
    };

    let mut stream = 0.0;
    let mut breaks = 0u32;
    for &notes in &notes_per_measure[first..=last] {
        if is_stream(notes) {
            stream += stream_measures(notes);
        } else if stream > 0.0 {
            breaks += 1;
        }
    }

    if breaks == 0 {
        FULL_DENSITY
    } else {
        FULL_DENSITY * stream / (stream + f64::from(breaks))
    }
}

/// Builds all breakdown strings, or `None` when no measure is stream.
pub fn create_breakdowns(notes_per_measure: &[u32]) -> Option<Breakdown> {
    if !notes_per_measure.iter().any(|&n| is_stream(n)) {
        return None;
    }

    let partially_simplified = generate_breakdown(notes_per_measure, BreakdownMode::Medium);
    Some(Breakdown {
        detailed: generate_breakdown(notes_per_measure, BreakdownMode::Basic),
        simplified: fully_simplify(&partially_simplified),
        partially_simplified,
        total: calculate_total(notes_per_measure),
        density: calculate_density(notes_per_measure),
    })
}
