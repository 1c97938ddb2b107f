use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::TransformError;

/// Marker that opens the per-channel zero-calibration line in a Grape2
/// recording header. Everything after it is a comma-separated list of
/// unsigned 16-bit hex offsets, one per receiver channel.
pub const CAL_MARKER: &str = "# A/D Zero Cal Data";

/// Outcome of the calibration scan: the offsets in encounter order plus the
/// zero-based line index the marker was found at. `header_line` is `None`
/// when no marker line exists; deciding whether that is fatal is left to the
/// caller.
#[derive(Debug, Clone)]
pub struct CalibrationScan {
    pub offsets: Vec<u16>,
    pub header_line: Option<usize>,
}

/// Scans `path` line by line for the first calibration marker and parses its
/// offsets. The scan stops at the first match; the rest of the file is left
/// for the sample decoder, which re-reads from a fixed line offset.
pub fn scan_calibration_offsets(path: &Path) -> Result<CalibrationScan, TransformError> {
    let reader = BufReader::new(File::open(path)?);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.starts_with(CAL_MARKER) {
            continue;
        }
        let mut offsets = Vec::new();
        for token in line[CAL_MARKER.len()..].split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let value = u16::from_str_radix(token, 16).map_err(|_| TransformError::HeaderParse {
                line: index + 1,
                token: token.to_string(),
            })?;
            offsets.push(value);
        }
        return Ok(CalibrationScan {
            offsets,
            header_line: Some(index),
        });
    }
    Ok(CalibrationScan {
        offsets: Vec::new(),
        header_line: None,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::TransformError;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn offsets_returned_in_encounter_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "rec.csv",
            "# Station Node N0000000\n# A/D Zero Cal Data F8A0,F89F,F8A2\n# Lat, Long\n",
        );
        let scan = scan_calibration_offsets(&path).unwrap();
        assert_eq!(scan.offsets, vec![0xF8A0, 0xF89F, 0xF8A2]);
        assert_eq!(scan.header_line, Some(1));
    }

    #[test]
    fn missing_marker_yields_empty_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rec.csv", "# Station Node N0000000\n# Lat, Long\n");
        let scan = scan_calibration_offsets(&path).unwrap();
        assert!(scan.offsets.is_empty());
        assert_eq!(scan.header_line, None);
    }

    #[test]
    fn malformed_offset_token_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rec.csv", "# A/D Zero Cal Data F8A0,xyzq!,F8A2\n");
        let err = scan_calibration_offsets(&path).unwrap_err();
        assert!(matches!(
            err,
            TransformError::HeaderParse { line: 1, .. }
        ));
    }

    #[test]
    fn only_first_marker_line_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "rec.csv",
            "# A/D Zero Cal Data 0001,0002,0003\n# A/D Zero Cal Data 0004,0005,0006\n",
        );
        let scan = scan_calibration_offsets(&path).unwrap();
        assert_eq!(scan.offsets, vec![1, 2, 3]);
        assert_eq!(scan.header_line, Some(0));
    }
}
