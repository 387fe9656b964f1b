/// One observation: a characteristic value at a point on the time or position axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MeasurementRecord {
    pub index: String,
    pub characteristic_name: String,
    pub characteristic_value: String,
    pub run_label: Option<String>,
}

impl MeasurementRecord {
    pub fn new(
        index: impl Into<String>,
        characteristic_name: impl Into<String>,
        characteristic_value: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            characteristic_name: characteristic_name.into(),
            characteristic_value: characteristic_value.into(),
            run_label: None,
        }
    }

    pub fn with_run_label(mut self, run_label: &str) -> Self {
        self.run_label = Some(run_label.to_string());
        self
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum MeasurementTable {
    PartCharacteristics,
    BenchtopFilamentDiameter,
    MaterialThermalCharacteristics,
}

impl MeasurementTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartCharacteristics => "part_characteristics",
            Self::BenchtopFilamentDiameter => "benchtop_filament_diameter",
            Self::MaterialThermalCharacteristics => "material_thermal_characteristics",
        }
    }

    pub fn insert_sql(self) -> &'static str {
        match self {
            Self::PartCharacteristics => {
                "
                INSERT INTO part_characteristics(part_id, time_elapsed, characteristic_name, characteristic_value)
                VALUES(?1, ?2, ?3, ?4)
                "
            }
            Self::BenchtopFilamentDiameter => {
                "
                INSERT INTO benchtop_filament_diameter(part_id, position, characteristic_name, characteristic_value)
                VALUES(?1, ?2, ?3, ?4)
                "
            }
            Self::MaterialThermalCharacteristics => {
                "
                INSERT INTO material_thermal_characteristics(material_id, time_elapsed, characteristic_name, characteristic_value, run_label)
                VALUES(?1, ?2, ?3, ?4, ?5)
                "
            }
        }
    }

    pub fn carries_run_label(self) -> bool {
        matches!(self, Self::MaterialThermalCharacteristics)
    }
}
