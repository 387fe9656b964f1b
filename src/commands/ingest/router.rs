use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IngestError;

use super::diameter::parse_diameter_csv;
use super::identity::IdentityScope;
use super::pressure::parse_pressure_log;
use super::records::{MeasurementRecord, MeasurementTable};
use super::thermal::{ThermalVariant, parse_thermal_workbook};

pub(crate) const PARTS_QUALITY: &str = "Parts Quality";
pub(crate) const BENCHTOP_FILAMENT_DIAMETER: &str = "BenchTop Filament Diameter";
pub(crate) const CHARACTERISTICS: &str = "Characteristics";
pub(crate) const LIVE_PRINT_DATA: &str = "Live Print Data";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Handler {
    Pressure,
    Diameter,
    Thermal,
    Passthrough,
}

#[derive(Debug)]
pub(crate) struct Route {
    pub label: &'static str,
    pub extensions: &'static [&'static str],
    handler: Handler,
}

const ROUTES: &[Route] = &[
    Route {
        label: PARTS_QUALITY,
        extensions: &["lvm", "tdms", "csv"],
        handler: Handler::Pressure,
    },
    Route {
        label: BENCHTOP_FILAMENT_DIAMETER,
        extensions: &["csv"],
        handler: Handler::Diameter,
    },
    Route {
        label: CHARACTERISTICS,
        extensions: &["xlsx", "xls"],
        handler: Handler::Thermal,
    },
    // Accepted so uploads that include it still succeed; nothing is stored yet.
    Route {
        label: LIVE_PRINT_DATA,
        extensions: &[],
        handler: Handler::Passthrough,
    },
];

pub(crate) fn route_for(label: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.label == label)
}

/// Parser selected for one file, with its output table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FormatParser {
    Pressure,
    Diameter,
    Thermal(ThermalVariant),
}

impl FormatParser {
    pub fn parse(self, path: &Path) -> Result<Vec<MeasurementRecord>, IngestError> {
        match self {
            Self::Pressure => parse_pressure_log(path),
            Self::Diameter => parse_diameter_csv(path),
            Self::Thermal(variant) => parse_thermal_workbook(path, variant),
        }
    }

    pub fn table(self) -> MeasurementTable {
        match self {
            Self::Pressure => MeasurementTable::PartCharacteristics,
            Self::Diameter => MeasurementTable::BenchtopFilamentDiameter,
            Self::Thermal(_) => MeasurementTable::MaterialThermalCharacteristics,
        }
    }
}

impl Route {
    pub fn is_passthrough(&self) -> bool {
        self.handler == Handler::Passthrough
    }

    /// Thermal characterization belongs to the material, everything else to a part.
    pub fn identity_scope(&self) -> IdentityScope {
        match self.handler {
            Handler::Thermal => IdentityScope::Material,
            _ => IdentityScope::Part,
        }
    }

    pub fn parser_for(&self, stem: &str) -> Option<FormatParser> {
        match self.handler {
            Handler::Pressure => Some(FormatParser::Pressure),
            Handler::Diameter => Some(FormatParser::Diameter),
            Handler::Thermal => Some(FormatParser::Thermal(ThermalVariant::from_stem(stem))),
            Handler::Passthrough => None,
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|accepted| ext.eq_ignore_ascii_case(accepted))
            })
            .unwrap_or(false)
    }

    /// Regular files in `directory` carrying one of this route's extensions, sorted.
    pub fn list_files(&self, directory: &Path) -> Result<Vec<PathBuf>, IngestError> {
        let entries =
            fs::read_dir(directory).map_err(|source| IngestError::io(directory, source))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| IngestError::io(directory, source))?;
            let path = entry.path();

            let is_file = entry
                .file_type()
                .map_err(|source| IngestError::io(&path, source))?
                .is_file();
            if is_file && self.accepts(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}
