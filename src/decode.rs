use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::TransformError;
use crate::table::{SampleBatch, TableAppender, CHANNEL_COUNT};

/// Nominal A/D sampling rate of the Grape2 receiver (format v2).
pub const SAMPLING_RATE_HZ: f64 = 8000.0;

/// Batch flush threshold: one second of samples at the nominal rate.
/// Flushing happens only at this exact count, never on a timer or on a
/// timestamp edge.
pub const SAMPLES_PER_BATCH: usize = 8000;

/// Number of leading metadata lines in a Grape2 v2 recording. This is fixed
/// by the file format, not derived from content.
pub const RAW_METADATA_LINES: usize = 25;

const TIMESTAMP_MARKER: char = 'T';
const CHECKSUM_MARKER: char = 'C';

/// Per-run accounting surfaced to the caller. Skipped lines are structurally
/// malformed data lines (wrong field count, empty field, or no timestamp
/// marker seen yet); they are recoverable and never abort the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub samples: u64,
    pub batches: u64,
    pub skipped_lines: u64,
}

/// Re-centers a raw A/D reading on the channel's calibrated zero point.
/// The result can exceed the 16-bit signed range and must stay wide.
pub fn calibrate(raw: u16, offset: u16) -> i32 {
    (i32::from(raw) - 0x8000) + (0x8000 - i32::from(offset))
}

/// Decodes the body of a raw recording and appends calibrated batches to the
/// table at `output`.
///
/// The calibration scan has already consumed the header separately; this
/// function restarts from the top of the file and skips the fixed metadata
/// preamble, so the two phases never share a read cursor. Body lines are
/// either timestamp markers (`T...`, setting the timestamp reused by every
/// following data line), checksum lines (`C...`, ignored), or data lines of
/// exactly one hex field per channel.
///
/// A trailing batch smaller than the flush threshold is flushed at
/// end-of-input rather than dropped.
pub fn process_and_append(
    input: &Path,
    offsets: &[u16],
    output: &Path,
) -> Result<DecodeStats, TransformError> {
    if offsets.len() != CHANNEL_COUNT {
        return Err(TransformError::OffsetCount {
            expected: CHANNEL_COUNT,
            found: offsets.len(),
        });
    }

    let reader = BufReader::new(File::open(input)?);
    let mut writer = TableAppender::open(output)?;
    let mut batch = SampleBatch::with_capacity(SAMPLES_PER_BATCH);
    let mut stats = DecodeStats::default();
    let mut current_timestamp: Option<String> = None;

    for (index, line) in reader.lines().enumerate().skip(RAW_METADATA_LINES) {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(CHECKSUM_MARKER) {
            continue;
        }
        if let Some(rest) = line.strip_prefix(TIMESTAMP_MARKER) {
            current_timestamp = Some(rest.to_string());
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != CHANNEL_COUNT || fields.iter().any(|field| field.is_empty()) {
            stats.skipped_lines += 1;
            continue;
        }
        let Some(timestamp) = current_timestamp.as_deref() else {
            stats.skipped_lines += 1;
            continue;
        };

        let mut values = [0i32; CHANNEL_COUNT];
        for (channel, field) in fields.iter().enumerate() {
            let raw = u16::from_str_radix(field.trim(), 16).map_err(|_| {
                TransformError::SampleParse {
                    line: index + 1,
                    token: (*field).to_string(),
                }
            })?;
            values[channel] = calibrate(raw, offsets[channel]);
        }
        batch.push(timestamp, values);
        stats.samples += 1;

        if batch.len() == SAMPLES_PER_BATCH {
            writer.append(&batch)?;
            stats.batches += 1;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        println!(
            "[info] Flushing trailing partial batch of {} samples",
            batch.len()
        );
        writer.append(&batch)?;
        stats.batches += 1;
    }
    writer.finalize()?;
    Ok(stats)
}
