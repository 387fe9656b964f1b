use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::IngestError;

use super::records::MeasurementRecord;

pub(crate) const HEADER_SENTINEL: &str = "***End_of_Header***";
const PRESSURE_CHARACTERISTIC: &str = "Pressure";

// Data columns: time_elapsed, temperature, pressure, flow.
const TIME_COLUMN: usize = 0;
const PRESSURE_COLUMN: usize = 2;

/// Reads a tab-delimited pressure log and emits one `Pressure` record per data line.
pub(crate) fn parse_pressure_log(path: &Path) -> Result<Vec<MeasurementRecord>, IngestError> {
    let raw = fs::read(path).map_err(|source| IngestError::io(path, source))?;
    let content = String::from_utf8_lossy(&raw);
    parse_pressure_text(path, &content)
}

pub(crate) fn parse_pressure_text(
    path: &Path,
    content: &str,
) -> Result<Vec<MeasurementRecord>, IngestError> {
    let lines = content.lines().collect::<Vec<&str>>();
    let data_start = find_data_start(&lines).map_err(|found| IngestError::HeaderNotFound {
        path: path.to_path_buf(),
        sentinel: HEADER_SENTINEL,
        found,
    })?;

    let mut records = Vec::new();
    let mut short_lines = 0_usize;

    for (line_idx, line) in lines.iter().enumerate().skip(data_start) {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        let fields = line.split('\t').map(str::trim).collect::<Vec<&str>>();
        if fields.len() <= PRESSURE_COLUMN {
            short_lines += 1;
            warn!(
                path = %path.display(),
                line = line_idx + 1,
                fields = fields.len(),
                "skipping pressure line with too few columns"
            );
            continue;
        }

        records.push(MeasurementRecord::new(
            fields[TIME_COLUMN],
            PRESSURE_CHARACTERISTIC,
            fields[PRESSURE_COLUMN],
        ));
    }

    debug!(
        path = %path.display(),
        records = records.len(),
        short_lines,
        "parsed pressure log"
    );

    Ok(records)
}

/// Index of the first data line: two past the second sentinel. Errs with the
/// number of sentinels seen when there is no second one.
fn find_data_start(lines: &[&str]) -> Result<usize, usize> {
    let mut seen = 0_usize;
    for (idx, line) in lines.iter().enumerate() {
        if line.trim() == HEADER_SENTINEL {
            seen += 1;
            if seen == 2 {
                return Ok(idx + 2);
            }
        }
    }

    Err(seen)
}
