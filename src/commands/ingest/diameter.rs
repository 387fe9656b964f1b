use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::error::IngestError;

use super::records::MeasurementRecord;

pub(crate) const SNIFF_SAMPLE_BYTES: usize = 1024;
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];
const DEFAULT_DELIMITER: u8 = b',';

/// Parses a benchtop diameter scan. The last header column is the position
/// axis; every other column becomes a characteristic at that position.
pub(crate) fn parse_diameter_csv(path: &Path) -> Result<Vec<MeasurementRecord>, IngestError> {
    let mut file = File::open(path).map_err(|source| IngestError::io(path, source))?;

    let mut sample = Vec::with_capacity(SNIFF_SAMPLE_BYTES);
    (&mut file)
        .take(SNIFF_SAMPLE_BYTES as u64)
        .read_to_end(&mut sample)
        .map_err(|source| IngestError::io(path, source))?;
    let delimiter = sniff_delimiter(&sample);
    file.seek(SeekFrom::Start(0))
        .map_err(|source| IngestError::io(path, source))?;

    debug!(
        path = %path.display(),
        delimiter = %char::from(delimiter).escape_default(),
        "sniffed diameter delimiter"
    );

    parse_delimited(path, file, delimiter)
}

pub(crate) fn parse_delimited<R: Read>(
    path: &Path,
    source: R,
    delimiter: u8,
) -> Result<Vec<MeasurementRecord>, IngestError> {
    let csv_error = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);
    let mut rows = reader.records();

    let header = match rows.next() {
        Some(row) => row.map_err(csv_error)?,
        None => return Err(position_missing(path)),
    };
    if header.len() < 2 {
        return Err(position_missing(path));
    }

    let position_idx = header.len() - 1;
    let characteristic_names = header
        .iter()
        .take(position_idx)
        .map(ToOwned::to_owned)
        .collect::<Vec<String>>();

    let mut records = Vec::new();
    for (row_idx, row) in rows.enumerate() {
        let row = row.map_err(csv_error)?;
        if row.len() < header.len() {
            warn!(
                path = %path.display(),
                row = row_idx + 2,
                fields = row.len(),
                expected = header.len(),
                "skipping short diameter row"
            );
            continue;
        }

        let position = &row[position_idx];
        for (name, value) in characteristic_names.iter().zip(row.iter()) {
            records.push(MeasurementRecord::new(position, name.as_str(), value));
        }
    }

    Ok(records)
}

fn position_missing(path: &Path) -> IngestError {
    IngestError::RequiredColumnMissing {
        path: path.to_path_buf(),
        sheet: None,
        column: "position".to_string(),
    }
}

/// Picks the candidate whose per-line count is most consistent across the
/// sample, then the one with the higher count. Falls back to `,`.
pub(crate) fn sniff_delimiter(sample: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(sample);
    let mut lines = text.lines().collect::<Vec<&str>>();
    // The sample cut most likely split the final line.
    if sample.len() >= SNIFF_SAMPLE_BYTES && lines.len() > 1 {
        lines.pop();
    }
    lines.retain(|line| !line.trim().is_empty());

    let mut best: Option<(u8, usize, usize)> = None;
    for candidate in CANDIDATE_DELIMITERS {
        let counts = lines
            .iter()
            .map(|line| line.bytes().filter(|byte| *byte == candidate).count())
            .collect::<Vec<usize>>();
        let Some((per_line, agreeing_lines)) = dominant_count(&counts) else {
            continue;
        };

        let beats_best = best.is_none_or(|(_, best_agreeing, best_per_line)| {
            (agreeing_lines, per_line) > (best_agreeing, best_per_line)
        });
        if beats_best {
            best = Some((candidate, agreeing_lines, per_line));
        }
    }

    best.map(|(delimiter, _, _)| delimiter)
        .unwrap_or(DEFAULT_DELIMITER)
}

/// Most frequent non-zero count and how many lines share it.
fn dominant_count(counts: &[usize]) -> Option<(usize, usize)> {
    let mut frequency = HashMap::<usize, usize>::new();
    for count in counts.iter().copied().filter(|count| *count > 0) {
        *frequency.entry(count).or_default() += 1;
    }

    frequency
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
}
