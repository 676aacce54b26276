use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bpm::{
    compute_measure_nps_vec, compute_tier_bpm, compute_total_chart_length, parse_timing_list,
    TimingPoint,
};
use super::hash::{hash_chart, SimfileFormat};
use super::parse::{declarations, strip_comments, Declaration, Tag};
use super::stats::{count_notes_per_measure, create_breakdowns, Breakdown};
use crate::config::SUPPORTED_STEPSTYPE;
use crate::utils::format::is_blank;

const NOTES_FIELD_COUNT: usize = 6;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No {0} defined in simfile")]
    MissingField(&'static str),

    #[error("Invalid #NOTES: got {fields} fields, expected 6")]
    MalformedChartBlock { fields: usize },

    #[error("Unsupported simfile format: {0}")]
    UnsupportedFormat(String),

    #[error("Chart has no #BPMS to time it against")]
    MissingTempo,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub title: String,
    pub artist: String,
    pub subtitle: Option<String>,
    pub title_translit: Option<String>,
    pub artist_translit: Option<String>,
    pub subtitle_translit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub credit: String,
    pub difficulty_tag: String,
    pub level: String,
    pub bpms: Vec<TimingPoint>,
    pub stops: Vec<TimingPoint>,
    pub notes_per_measure: Vec<u32>,
    pub nps_per_measure: Vec<f64>,
    #[serde(rename = "streamBPM")]
    pub stream_tempo: Option<f64>,
    pub breakdown: Option<Breakdown>,
    #[serde(rename = "length")]
    pub length_seconds: f64,
    #[serde(rename = "hashGSv3")]
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub meta: ChartMetadata,
    pub charts: Vec<Chart>,
}

#[derive(Default)]
struct PartialMetadata {
    title: Option<String>,
    artist: Option<String>,
    subtitle: Option<String>,
    title_translit: Option<String>,
    artist_translit: Option<String>,
    subtitle_translit: Option<String>,
}

impl PartialMetadata {
    fn finish(self) -> Result<ChartMetadata> {
        let Some(artist) = self.artist else {
            error!("No #ARTIST defined in simfile");
            return Err(ParseError::MissingField("#ARTIST"));
        };
        let Some(title) = self.title else {
            error!("No #TITLE defined in simfile");
            return Err(ParseError::MissingField("#TITLE"));
        };
        Ok(ChartMetadata {
            title,
            artist,
            subtitle: self.subtitle,
            title_translit: self.title_translit,
            artist_translit: self.artist_translit,
            subtitle_translit: self.subtitle_translit,
        })
    }
}

/// Parses one `#NOTES` value. Returns `Ok(None)` for charts that aren't
/// dance-single.
///
/// `bpms` and `stops` are whatever the file declared before this block.
pub fn parse_chart(
    notes_value: &str,
    bpms: &[TimingPoint],
    stops: &[TimingPoint],
) -> Result<Option<Chart>> {
    // Only the start is trimmed: trailing newlines are part of the note data.
    let fields: Vec<&str> = notes_value
        .split(':')
        .map(|field| field.trim_start_matches(is_blank))
        .collect();

    let &[stepstype, credit, difficulty_tag, level, _radar_values, notes_data] = fields.as_slice() else {
        error!(
            "Invalid #NOTES. Got {} fields, but expected {}.",
            fields.len(),
            NOTES_FIELD_COUNT
        );
        return Err(ParseError::MalformedChartBlock { fields: fields.len() });
    };

    if stepstype != SUPPORTED_STEPSTYPE {
        debug!("Skipping {} chart.", stepstype);
        return Ok(None);
    }

    let notes_per_measure = count_notes_per_measure(notes_data);
    let content_hash = hash_chart(bpms, notes_data, SimfileFormat::Sm)?;
    let nps_per_measure =
        compute_measure_nps_vec(&notes_per_measure, bpms).ok_or(ParseError::MissingTempo)?;

    let chart = Chart {
        credit: credit.to_owned(),
        difficulty_tag: difficulty_tag.to_owned(),
        level: level.to_owned(),
        bpms: bpms.to_vec(),
        stops: stops.to_vec(),
        stream_tempo: compute_tier_bpm(bpms, &notes_per_measure),
        breakdown: create_breakdowns(&notes_per_measure),
        length_seconds: compute_total_chart_length(bpms, notes_per_measure.len()),
        content_hash,
        nps_per_measure,
        notes_per_measure,
    };

    debug!(
        "Processed {} {} chart by '{}': {} measures, hash {}, breakdown [{}]",
        chart.difficulty_tag,
        chart.level,
        chart.credit,
        chart.notes_per_measure.len(),
        chart.content_hash,
        chart.breakdown.as_ref().map_or("", |b| b.detailed.as_str()),
    );
    Ok(Some(chart))
}

/// Parses .sm text into its metadata and every dance-single chart.
///
/// # Errors
///
/// Fails when `#TITLE` or `#ARTIST` is missing, when any `#NOTES` block is
/// malformed (one bad chart fails the whole file), or when a chart appears
/// before any `#BPMS`.
pub fn parse_simfile(content: &str) -> Result<Document> {
    let cleaned = strip_comments(content);

    let mut meta = PartialMetadata::default();
    let mut bpms: Vec<TimingPoint> = Vec::new();
    let mut stops: Vec<TimingPoint> = Vec::new();
    let mut charts = Vec::new();

    for Declaration { key, value } in declarations(&cleaned) {
        let Some(tag) = Tag::from_key(key) else {
            continue;
        };
        match tag {
            Tag::Title => meta.title = Some(value.to_owned()),
            Tag::Artist => meta.artist = Some(value.to_owned()),
            Tag::Subtitle => meta.subtitle = Some(value.to_owned()),
            Tag::TitleTranslit => meta.title_translit = Some(value.to_owned()),
            Tag::ArtistTranslit => meta.artist_translit = Some(value.to_owned()),
            Tag::SubtitleTranslit => meta.subtitle_translit = Some(value.to_owned()),
            Tag::Bpms => bpms.extend(parse_timing_list(value)),
            Tag::Stops => stops.extend(parse_timing_list(value)),
            Tag::Notes => {
                if let Some(chart) = parse_chart(value, &bpms, &stops)? {
                    charts.push(chart);
                }
            }
        }
    }

    let meta = meta.finish()?;
    debug!(
        "Parsed {} - {} with {} chart(s).",
        meta.artist,
        meta.title,
        charts.len()
    );
    Ok(Document { meta, charts })
}

/// Reads and parses a simfile from disk. Only `.sm` files are accepted.
///
/// # Errors
///
/// Everything [`parse_simfile`] can return, plus IO errors and
/// [`ParseError::UnsupportedFormat`] for `.ssc` or unknown extensions.
pub fn parse_simfile_file(simfile_path: &Path) -> Result<Document> {
    let extension = simfile_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match SimfileFormat::from_extension(extension) {
        Some(SimfileFormat::Sm) => {}
        Some(SimfileFormat::Ssc) => {
            return Err(ParseError::UnsupportedFormat(SimfileFormat::Ssc.to_string()));
        }
        None => return Err(ParseError::UnsupportedFormat(extension.to_owned())),
    }

    info!("Parsing simfile: {:?}", simfile_path);
    let content_bytes = fs::read(simfile_path)?;
    let content = String::from_utf8_lossy(&content_bytes);
    if matches!(content, Cow::Owned(_)) {
        warn!("{:?} is not valid UTF-8, invalid bytes were replaced.", simfile_path);
    }
    parse_simfile(&content)
}
