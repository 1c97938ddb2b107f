use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::table::CHANNEL_COUNT;
use crate::utils::DynError;

/// Per-station signals read out of a transformed wide table, row-aligned
/// across channels. `coerced_cells[i]` counts cells of station `i` that were
/// not parseable as finite numbers and were forced to zero.
pub struct ChannelSignals {
    pub signals: Vec<Vec<f64>>,
    pub coerced_cells: Vec<u64>,
}

/// Loads every station column of the wide table at `path`.
///
/// The column layout is trusted: a leading timestamp column, then one column
/// per station in the fixed persisted order. Cells that fail to parse as a
/// finite number (including missing trailing cells) are coerced to `0.0` and
/// counted; this is a deliberate lossy-recovery policy, never an error.
pub fn load_channel_signals(path: &Path) -> Result<ChannelSignals, DynError> {
    let reader = BufReader::new(File::open(path)?);
    let mut signals = vec![Vec::new(); CHANNEL_COUNT];
    let mut coerced_cells = vec![0u64; CHANNEL_COUNT];

    let mut lines = reader.lines();
    let Some(header) = lines.next() else {
        return Ok(ChannelSignals {
            signals,
            coerced_cells,
        });
    };
    header?;

    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let _timestamp = fields.next();
        for channel in 0..CHANNEL_COUNT {
            let value = match fields.next() {
                Some(cell) => match cell.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        coerced_cells[channel] += 1;
                        0.0
                    }
                },
                None => {
                    coerced_cells[channel] += 1;
                    0.0
                }
            };
            signals[channel].push(value);
        }
    }

    Ok(ChannelSignals {
        signals,
        coerced_cells,
    })
}

/// Finds the first `YYYY-MM-DDTHH` date-hour token in `name` and squashes it
/// to `YYYYMMDDHH`. Used only for output artifact naming.
pub fn date_hour_label(name: &str) -> Option<String> {
    const TOKEN_LEN: usize = 13;
    const DIGITS: [usize; 10] = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12];
    let bytes = name.as_bytes();
    if bytes.len() < TOKEN_LEN {
        return None;
    }
    for start in 0..=bytes.len() - TOKEN_LEN {
        let window = &bytes[start..start + TOKEN_LEN];
        if window[4] != b'-' || window[7] != b'-' || window[10] != b'T' {
            continue;
        }
        if !DIGITS.iter().all(|&i| window[i].is_ascii_digit()) {
            continue;
        }
        let mut label = String::with_capacity(DIGITS.len());
        for &i in &DIGITS {
            label.push(window[i] as char);
        }
        return Some(label);
    }
    None
}
