use crate::model::HabitUnit;

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Distance,
    Weight,
    Volume,
    Time,
    Count,
    Reading,
    Exercise,
    Custom,
}

impl UnitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Distance => "distance",
            UnitCategory::Weight => "weight",
            UnitCategory::Volume => "volume",
            UnitCategory::Time => "time",
            UnitCategory::Count => "count",
            UnitCategory::Reading => "reading",
            UnitCategory::Exercise => "exercise",
            UnitCategory::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UnitDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub category: UnitCategory,
    pub allows_decimal: bool,
    pub abbreviation: Option<&'static str>,
}

/// Seeded measurement units. Keys are unique; `units list` prints this table
/// and the validator resolves non-custom habit units against it.
pub const DEFAULT_UNITS: &[UnitDefinition] = &[
    UnitDefinition { key: "miles", label: "Miles", category: UnitCategory::Distance, allows_decimal: true, abbreviation: Some("mi") },
    UnitDefinition { key: "kilometers", label: "Kilometers", category: UnitCategory::Distance, allows_decimal: true, abbreviation: Some("km") },
    UnitDefinition { key: "meters", label: "Meters", category: UnitCategory::Distance, allows_decimal: true, abbreviation: Some("m") },
    UnitDefinition { key: "pounds", label: "Pounds", category: UnitCategory::Weight, allows_decimal: true, abbreviation: Some("lb") },
    UnitDefinition { key: "ounces", label: "Ounces", category: UnitCategory::Weight, allows_decimal: true, abbreviation: Some("oz") },
    UnitDefinition { key: "kilograms", label: "Kilograms", category: UnitCategory::Weight, allows_decimal: true, abbreviation: Some("kg") },
    UnitDefinition { key: "liters", label: "Liters", category: UnitCategory::Volume, allows_decimal: true, abbreviation: Some("L") },
    UnitDefinition { key: "milliliters", label: "Milliliters", category: UnitCategory::Volume, allows_decimal: true, abbreviation: Some("mL") },
    UnitDefinition { key: "ounces_fluid", label: "Fluid Ounces", category: UnitCategory::Volume, allows_decimal: true, abbreviation: Some("fl oz") },
    UnitDefinition { key: "cups", label: "Cups", category: UnitCategory::Volume, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "minutes", label: "Minutes", category: UnitCategory::Time, allows_decimal: false, abbreviation: Some("min") },
    UnitDefinition { key: "hours", label: "Hours", category: UnitCategory::Time, allows_decimal: true, abbreviation: Some("hr") },
    UnitDefinition { key: "pages", label: "Pages", category: UnitCategory::Reading, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "books", label: "Books", category: UnitCategory::Reading, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "count", label: "Count", category: UnitCategory::Count, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "reps", label: "Reps", category: UnitCategory::Exercise, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "sets", label: "Sets", category: UnitCategory::Exercise, allows_decimal: false, abbreviation: None },
    UnitDefinition { key: "steps", label: "Steps", category: UnitCategory::Exercise, allows_decimal: false, abbreviation: None },
];

pub fn find_unit(key: &str) -> Option<&'static UnitDefinition> {
    DEFAULT_UNITS.iter().find(|u| u.key == key)
}

/// Display label for a habit's unit. Custom label wins, then the catalog
/// label, then the raw key. Never fails.
pub fn resolve_unit_label(unit: &HabitUnit) -> String {
    if unit.is_custom {
        if let Some(label) = unit.custom_label.as_deref() {
            if !label.is_empty() {
                return label.to_string();
            }
        }
    }
    match find_unit(&unit.unit_key) {
        Some(def) => def.label.to_string(),
        None => unit.unit_key.clone(),
    }
}

/// Whether fractional target values are valid for this unit. Custom units
/// default to whole numbers unless the user said otherwise.
pub fn unit_allows_decimal(unit: &HabitUnit) -> bool {
    if let Some(allows) = unit.allows_decimal {
        return allows;
    }
    if unit.is_custom {
        return false;
    }
    find_unit(&unit.unit_key).map(|d| d.allows_decimal).unwrap_or(false)
}
