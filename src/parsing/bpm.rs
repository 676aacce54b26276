use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use super::parse::read_element;
use crate::config::{BEATS_PER_MEASURE, BPM_DEVIATION_TOLERANCE, STREAM_THRESHOLD, TIER_MIN_SHARE};
use crate::utils::format::{parse_number, to_fixed};

/// A BPM change or a stop, anchored at a beat. Lists of these are kept in the
/// order the simfile declares them and are never sorted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    pub beat: f64,
    pub value: f64,
}

/// Parses a `#BPMS`/`#STOPS` value (`0.000=150.000,64.000=75.000`).
/// Malformed numbers come through as NaN.
pub fn parse_timing_list(value: &str) -> Vec<TimingPoint> {
    value
        .split(',')
        .map(|element| {
            let (beat, value) = read_element(element, '=');
            TimingPoint {
                beat: parse_number(beat),
                value: parse_number(value),
            }
        })
        .collect()
}

/// `beat=bpm` pairs at three decimals, joined by `,`. This is the BPM half of
/// the chart hash input.
pub fn normalize_float_digits(bpms: &[TimingPoint]) -> String {
    let mut output = String::with_capacity(bpms.len() * 16);
    for (i, bpm) in bpms.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        let _ = write!(output, "{}={}", to_fixed(bpm.beat, 3), to_fixed(bpm.value, 3));
    }
    output
}

/// Estimates the BPM the chart's streams are meant to be read at.
///
/// Only single-BPM charts get an estimate. The most common stream densities
/// are walked from densest to sparsest and the first one holding at least
/// 5% of all stream sets the multiplier (24 notes a measure is 1.5x, 32 is 2x).
pub fn compute_tier_bpm(bpms: &[TimingPoint], notes_per_measure: &[u32]) -> Option<f64> {
    let first_bpm = bpms.first()?.value;

    if bpms
        .iter()
        .any(|bpm| (bpm.value - first_bpm).abs() > BPM_DEVIATION_TOLERANCE)
    {
        return None;
    }

    let mut stream_by_density: BTreeMap<u32, f64> = BTreeMap::new();
    let mut total_stream = 0.0;
    for &notes in notes_per_measure.iter().filter(|&&n| n >= STREAM_THRESHOLD) {
        let measures_of_stream = f64::from(notes) / f64::from(STREAM_THRESHOLD);
        *stream_by_density.entry(notes).or_insert(0.0) += measures_of_stream;
        total_stream += measures_of_stream;
    }

    let speed = stream_by_density
        .iter()
        .rev()
        .find(|&(_, &measures)| measures >= total_stream * TIER_MIN_SHARE)
        .map_or(1.0, |(&notes, _)| f64::from(notes) / f64::from(STREAM_THRESHOLD));

    Some(first_bpm * speed)
}

/// Chart length in seconds. BPM segments are taken in declared order; the
/// last one runs to the end of the final measure.
pub fn compute_total_chart_length(bpms: &[TimingPoint], measure_count: usize) -> f64 {
    let mut length = 0.0;
    for (i, bpm) in bpms.iter().enumerate() {
        let beats = match bpms.get(i + 1) {
            Some(next) => next.beat - bpm.beat,
            None => measure_count as f64 * BEATS_PER_MEASURE - bpm.beat,
        };
        length += beats * (60.0 / bpm.value);
    }
    length
}

/// Returns the BPM in effect at `beat`. `bpms_desc` must be sorted by beat,
/// latest first; `fallback` covers beats before every change.
pub fn get_current_bpm(beat: f64, bpms_desc: &[TimingPoint], fallback: f64) -> f64 {
    bpms_desc
        .iter()
        .find(|bpm| beat >= bpm.beat)
        .map_or(fallback, |bpm| bpm.value)
}

/// Notes per second for each measure, using one BPM per measure.
///
/// The lookup beat is `measure / 4`, and mid-measure BPM changes are not
/// accounted for. Returns `None` when there are no BPMs at all.
pub fn compute_measure_nps_vec(notes_per_measure: &[u32], bpms: &[TimingPoint]) -> Option<Vec<f64>> {
    let first_bpm = bpms.first()?.value;

    let mut bpms_desc = bpms.to_vec();
    bpms_desc.sort_by(|a, b| b.beat.partial_cmp(&a.beat).unwrap_or(Ordering::Equal));

    let measure_nps_vec = notes_per_measure
        .iter()
        .enumerate()
        .map(|(i, &notes)| {
            let curr_bpm = get_current_bpm(i as f64 / BEATS_PER_MEASURE, &bpms_desc, first_bpm);
            f64::from(notes) * (curr_bpm / 240.0)
        })
        .collect();
    Some(measure_nps_vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(beat: f64, value: f64) -> TimingPoint {
        TimingPoint { beat, value }
    }

    #[test]
    fn timing_list_keeps_declared_order() {
        let points = parse_timing_list("64.000=75.000 ,\n 0.000=150.000");
        assert_eq!(points, vec![point(64.0, 75.0), point(0.0, 150.0)]);
    }

    #[test]
    fn malformed_timing_values_become_nan() {
        let points = parse_timing_list("0.000=fast,abc=120");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].beat, 0.0);
        assert!(points[0].value.is_nan());
        assert!(points[1].beat.is_nan());
        assert_eq!(points[1].value, 120.0);
    }

    #[test]
    fn missing_value_reads_as_zero() {
        assert_eq!(parse_timing_list("4"), vec![point(4.0, 0.0)]);
    }

    #[test]
    fn normalizes_to_three_decimals() {
        let bpms = [point(0.0, 150.0), point(32.5, 174.9996)];
        assert_eq!(normalize_float_digits(&bpms), "0.000=150.000,32.500=175.000");
        assert_eq!(normalize_float_digits(&[]), "");
    }

    #[test]
    fn tier_bpm_needs_bpms() {
        assert_eq!(compute_tier_bpm(&[], &[16, 16]), None);
    }

    #[test]
    fn tier_bpm_rejects_bpm_changes() {
        let bpms = [point(0.0, 150.0), point(32.0, 151.5)];
        assert_eq!(compute_tier_bpm(&bpms, &[16, 16]), None);
        let bpms = [point(0.0, 150.0), point(32.0, 148.0)];
        assert_eq!(compute_tier_bpm(&bpms, &[16, 16]), None);
        let bpms = [point(0.0, 150.0), point(32.0, 150.5)];
        assert_eq!(compute_tier_bpm(&bpms, &[16, 16]), Some(150.0));
    }

    #[test]
    fn tier_bpm_picks_densest_common_stream() {
        let bpms = [point(0.0, 120.0)];
        // 24ths make up well over 5% of the stream.
        let notes = [16, 16, 16, 24, 24, 0, 16];
        assert_eq!(compute_tier_bpm(&bpms, &notes), Some(180.0));
    }

    #[test]
    fn tier_bpm_ignores_rare_bursts() {
        let bpms = [point(0.0, 200.0)];
        let mut notes = vec![16; 40];
        notes.push(32); // 2 of 42 measures of stream, under 5%
        assert_eq!(compute_tier_bpm(&bpms, &notes), Some(200.0));
    }

    #[test]
    fn tier_bpm_without_stream_is_the_first_bpm() {
        let bpms = [point(0.0, 140.0)];
        assert_eq!(compute_tier_bpm(&bpms, &[4, 8, 0]), Some(140.0));
    }

    #[test]
    fn chart_length_follows_declared_segments() {
        // 8 beats at 120 (4s), then 24 beats at 240 (6s).
        let bpms = [point(0.0, 120.0), point(8.0, 240.0)];
        assert_eq!(compute_total_chart_length(&bpms, 8), 10.0);
        assert_eq!(compute_total_chart_length(&[], 8), 0.0);
    }

    #[test]
    fn chart_length_keeps_out_of_order_segments() {
        // -8 beats at 240 (-2s), then beat 0 to 32 at 120 (16s).
        let bpms = [point(8.0, 240.0), point(0.0, 120.0)];
        assert_eq!(compute_total_chart_length(&bpms, 8), 14.0);
    }

    #[test]
    fn nps_uses_one_bpm_per_measure() {
        let bpms = [point(0.0, 120.0), point(1.0, 240.0)];
        let nps = compute_measure_nps_vec(&[16, 16, 8, 16, 16], &bpms).expect("bpms present");
        // Measure i looks up beat i / 4, so only measure 4 sees the change.
        assert_eq!(nps, vec![8.0, 8.0, 4.0, 8.0, 16.0]);
    }

    #[test]
    fn nps_falls_back_to_first_declared_bpm() {
        let bpms = [point(2.0, 180.0), point(1.0, 60.0)];
        let nps = compute_measure_nps_vec(&[24, 24], &bpms).expect("bpms present");
        assert_eq!(nps, vec![18.0, 18.0]);
        assert_eq!(compute_measure_nps_vec(&[16], &[]), None);
    }
}
