use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::IngestError;

use super::records::MeasurementRecord;

const RUN_LABEL_ROW: usize = 0;
const HEADER_ROWS: [usize; 2] = [1, 2];
const FIRST_DATA_ROW: usize = 3;
const TIME_AXIS_COLUMN: &str = "Time";
const DSC_PREFIX: &str = "DSC_";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ThermalVariant {
    Tga,
    Dsc,
}

impl ThermalVariant {
    pub fn from_stem(stem: &str) -> Self {
        let upper = stem.to_ascii_uppercase();
        if upper.contains("DSC") {
            return Self::Dsc;
        }
        if !upper.contains("TGA") {
            warn!(stem, "no TGA/DSC marker in filename; parsing as TGA");
        }
        Self::Tga
    }

    /// DSC temperature columns are prefixed so they never collide with TGA's.
    fn qualify(self, column: String) -> String {
        match self {
            Self::Dsc if column.to_ascii_lowercase().contains("temp") => {
                format!("{DSC_PREFIX}{column}")
            }
            _ => column,
        }
    }
}

pub(crate) struct HeaderNormalizer {
    percent_unit: Regex,
    parenthetical: Regex,
}

impl HeaderNormalizer {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            percent_unit: Regex::new(r"\(\s*%\s*\)")?,
            parenthetical: Regex::new(r"\([^)]*\)")?,
        })
    }

    /// `"Weight" + "(%)"` → `WeightPercent`, `"Heat Flow" + "(W/g)"` → `HeatFlow`.
    pub fn normalize(&self, upper: &str, lower: &str) -> String {
        let joined = format!("{upper}{lower}");
        let joined = self.percent_unit.replace_all(&joined, "Percent");
        let joined = self.parenthetical.replace_all(&joined, "");
        joined.chars().filter(|ch| !ch.is_whitespace()).collect()
    }
}

/// Parses every worksheet after the first (a cover/summary sheet) of a TGA or
/// DSC export. A sheet without a time column fails the whole workbook.
pub(crate) fn parse_thermal_workbook(
    path: &Path,
    variant: ThermalVariant,
) -> Result<Vec<MeasurementRecord>, IngestError> {
    let spreadsheet_error = |err: calamine::Error| IngestError::Spreadsheet {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let normalizer = HeaderNormalizer::new()?;
    let sheet_names = workbook.sheet_names();
    if sheet_names.len() < 2 {
        warn!(path = %path.display(), sheets = sheet_names.len(), "workbook has no data sheets");
    }

    let mut records = Vec::new();
    for sheet in sheet_names.iter().skip(1) {
        let range = workbook.worksheet_range(sheet).map_err(spreadsheet_error)?;
        let grid = range_to_grid(&range);
        let sheet_records = parse_thermal_sheet(path, sheet, &grid, variant, &normalizer)?;

        debug!(
            path = %path.display(),
            sheet = %sheet,
            records = sheet_records.len(),
            "parsed thermal sheet"
        );
        records.extend(sheet_records);
    }

    Ok(records)
}

/// Grid anchored at A1, so row/column positions match the sheet even when the
/// used range starts further in.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut grid = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    grid
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn parse_thermal_sheet(
    path: &Path,
    sheet: &str,
    grid: &[Vec<String>],
    variant: ThermalVariant,
    normalizer: &HeaderNormalizer,
) -> Result<Vec<MeasurementRecord>, IngestError> {
    let run_label = grid
        .get(RUN_LABEL_ROW)
        .and_then(|row| row.iter().find(|cell| !cell.is_empty()))
        .cloned()
        .unwrap_or_else(|| sheet.to_string());

    let [upper_row, lower_row] =
        HEADER_ROWS.map(|idx| grid.get(idx).map(Vec::as_slice).unwrap_or(&[]));
    let width = upper_row.len().max(lower_row.len());
    let columns = (0..width)
        .map(|col| {
            let name = normalizer.normalize(cell_at(upper_row, col), cell_at(lower_row, col));
            (!name.is_empty()).then(|| variant.qualify(name))
        })
        .collect::<Vec<Option<String>>>();

    let time_col = columns
        .iter()
        .position(|column| column.as_deref().is_some_and(is_time_axis))
        .ok_or_else(|| IngestError::RequiredColumnMissing {
            path: path.to_path_buf(),
            sheet: Some(sheet.to_string()),
            column: TIME_AXIS_COLUMN.to_string(),
        })?;

    let mut records = Vec::new();
    for row in grid.iter().skip(FIRST_DATA_ROW) {
        let time = cell_at(row, time_col);
        if time.is_empty() {
            continue;
        }

        for (col, column) in columns.iter().enumerate() {
            let Some(name) = column else {
                continue;
            };
            let value = cell_at(row, col);
            if col == time_col || value.is_empty() {
                continue;
            }
            records.push(
                MeasurementRecord::new(time, name.as_str(), value).with_run_label(&run_label),
            );
        }
    }

    Ok(records)
}

fn cell_at(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

fn is_time_axis(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with("time")
}
