use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::TransformError;

pub const CHANNEL_COUNT: usize = 3;

/// Persisted column order, after the leading timestamp column. The Grape2
/// deployment monitors the WWV transmissions at 5, 10 and 15 MHz; appends
/// must never permute these.
pub const STATIONS: [&str; CHANNEL_COUNT] = ["wwv5", "wwv10", "wwv15"];

/// One flush unit of calibrated samples: a timestamp column plus one value
/// column per station, all the same length.
pub struct SampleBatch {
    timestamps: Vec<String>,
    channels: [Vec<i32>; CHANNEL_COUNT],
}

impl SampleBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            channels: std::array::from_fn(|_| Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn push(&mut self, timestamp: &str, values: [i32; CHANNEL_COUNT]) {
        self.timestamps.push(timestamp.to_string());
        for (column, value) in self.channels.iter_mut().zip(values) {
            column.push(value);
        }
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        for column in &mut self.channels {
            column.clear();
        }
    }
}

/// Append-only writer for the wide time-series table. The header row is
/// written if and only if the file is created by this open; reopening an
/// existing table extends it without touching the header.
pub struct TableAppender {
    writer: BufWriter<File>,
    rows_written: u64,
}

impl TableAppender {
    pub fn open(path: &Path) -> Result<Self, TransformError> {
        let (file, fresh) = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => (file, true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                (OpenOptions::new().append(true).open(path)?, false)
            }
            Err(err) => return Err(err.into()),
        };
        let mut writer = BufWriter::new(file);
        if fresh {
            write!(writer, "timestamp")?;
            for station in STATIONS {
                write!(writer, ",{station}")?;
            }
            writeln!(writer)?;
        }
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Appends every row of `batch`, preserving its order.
    pub fn append(&mut self, batch: &SampleBatch) -> Result<(), TransformError> {
        for row in 0..batch.len() {
            write!(self.writer, "{}", batch.timestamps[row])?;
            for column in &batch.channels {
                write!(self.writer, ",{}", column[row])?;
            }
            writeln!(self.writer)?;
        }
        self.rows_written += batch.len() as u64;
        Ok(())
    }

    pub fn finalize(mut self) -> Result<u64, TransformError> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(rows: &[(&str, [i32; CHANNEL_COUNT])]) -> SampleBatch {
        let mut batch = SampleBatch::with_capacity(rows.len());
        for (timestamp, values) in rows {
            batch.push(timestamp, *values);
        }
        batch
    }

    #[test]
    fn header_written_exactly_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all3.csv");

        let mut writer = TableAppender::open(&path).unwrap();
        writer
            .append(&batch_of(&[("15:00:00.000", [1, 2, 3])]))
            .unwrap();
        assert_eq!(writer.finalize().unwrap(), 1);

        let mut writer = TableAppender::open(&path).unwrap();
        writer
            .append(&batch_of(&[("15:00:01.000", [-4, 5, -6])]))
            .unwrap();
        assert_eq!(writer.finalize().unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "timestamp,wwv5,wwv10,wwv15",
                "15:00:00.000,1,2,3",
                "15:00:01.000,-4,5,-6",
            ]
        );
    }

    #[test]
    fn rows_keep_batch_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all3.csv");

        let mut writer = TableAppender::open(&path).unwrap();
        writer
            .append(&batch_of(&[
                ("a", [1, 1, 1]),
                ("b", [2, 2, 2]),
                ("c", [3, 3, 3]),
            ]))
            .unwrap();
        writer.finalize().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let timestamps: Vec<&str> = contents
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(timestamps, vec!["a", "b", "c"]);
    }
}
