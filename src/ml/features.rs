use crate::error::{AppError, Result};
use crate::models::{Month, WaterColor, WaterSource};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use validator::{Validate, ValidationError};

/// Number of columns the classifier was trained on
pub const FEATURE_COUNT: usize = 18;

/// Kind of a schema column
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Integer,
    Categorical,
}

/// One column of the feature schema
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FeatureSpec {
    const fn numeric(name: &'static str, min: f64, max: Option<f64>) -> Self {
        Self {
            name,
            kind: FeatureKind::Numeric,
            min: Some(min),
            max,
        }
    }

    const fn categorical(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Categorical,
            min: None,
            max: None,
        }
    }

    /// Allowed values for categorical columns, in form order
    pub fn allowed_values(&self) -> Vec<&'static str> {
        match self.name {
            "Color" => WaterColor::iter().map(Into::into).collect(),
            "Source" => WaterSource::iter().map(Into::into).collect(),
            "Month" => Month::iter().map(Into::into).collect(),
            _ => Vec::new(),
        }
    }
}

/// Canonical column order and naming the classifier expects
pub const FEATURE_SCHEMA: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec::numeric("pH", 0.0, Some(14.0)),
    FeatureSpec::numeric("Iron", 0.0, None),
    FeatureSpec::numeric("Nitrate", 0.0, None),
    FeatureSpec::numeric("Chloride", 0.0, None),
    FeatureSpec::numeric("Lead", 0.0, None),
    FeatureSpec::numeric("Zinc", 0.0, None),
    FeatureSpec::categorical("Color"),
    FeatureSpec::numeric("Turbidity", 0.0, None),
    FeatureSpec::numeric("Fluoride", 0.0, None),
    FeatureSpec::numeric("Conductivity", 0.0, None),
    FeatureSpec::numeric("Chlorine", 0.0, None),
    FeatureSpec::numeric("Manganese", 0.0, None),
    FeatureSpec::numeric("Total Dissolved Solids", 0.0, None),
    FeatureSpec::categorical("Source"),
    FeatureSpec::numeric("Water Temperature", 0.0, Some(100.0)),
    FeatureSpec::numeric("Air Temperature", 0.0, Some(100.0)),
    FeatureSpec::categorical("Month"),
    FeatureSpec {
        name: "Day",
        kind: FeatureKind::Integer,
        min: Some(1.0),
        max: Some(31.0),
    },
];

/// Canonical column names in schema order
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_SCHEMA.iter().map(|spec| spec.name)
}

/// A single column value as handed to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(&'static str),
}

/// One assembled, schema-conformant input instance. Only
/// [`InputAssembler::assemble`] builds one, so every record has passed
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    ph: f64,
    iron: f64,
    nitrate: f64,
    chloride: f64,
    lead: f64,
    zinc: f64,
    color: WaterColor,
    turbidity: f64,
    fluoride: f64,
    conductivity: f64,
    chlorine: f64,
    manganese: f64,
    total_dissolved_solids: f64,
    source: WaterSource,
    water_temperature: f64,
    air_temperature: f64,
    month: Month,
    day: u8,
}

impl FeatureRecord {
    /// Column values in canonical schema order
    pub fn values(&self) -> [(&'static str, FeatureValue); FEATURE_COUNT] {
        use FeatureValue::{Categorical, Numeric};

        [
            ("pH", Numeric(self.ph)),
            ("Iron", Numeric(self.iron)),
            ("Nitrate", Numeric(self.nitrate)),
            ("Chloride", Numeric(self.chloride)),
            ("Lead", Numeric(self.lead)),
            ("Zinc", Numeric(self.zinc)),
            ("Color", Categorical(self.color.into())),
            ("Turbidity", Numeric(self.turbidity)),
            ("Fluoride", Numeric(self.fluoride)),
            ("Conductivity", Numeric(self.conductivity)),
            ("Chlorine", Numeric(self.chlorine)),
            ("Manganese", Numeric(self.manganese)),
            ("Total Dissolved Solids", Numeric(self.total_dissolved_solids)),
            ("Source", Categorical(self.source.into())),
            ("Water Temperature", Numeric(self.water_temperature)),
            ("Air Temperature", Numeric(self.air_temperature)),
            ("Month", Categorical(self.month.into())),
            ("Day", Numeric(f64::from(self.day))),
        ]
    }

    /// Look up a single column by its canonical name
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }
}

/// Raw form submission. Every field is optional at this layer; bounds are
/// checked by `validate()` and completeness by [`InputAssembler`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_sample"))]
pub struct RawSample {
    #[serde(rename = "pH", alias = "ph")]
    #[validate(range(min = 0.0, max = 14.0))]
    pub ph: Option<f64>,

    #[serde(rename = "Iron", alias = "iron")]
    #[validate(range(min = 0.0))]
    pub iron: Option<f64>,

    #[serde(rename = "Nitrate", alias = "nitrate")]
    #[validate(range(min = 0.0))]
    pub nitrate: Option<f64>,

    #[serde(rename = "Chloride", alias = "chloride")]
    #[validate(range(min = 0.0))]
    pub chloride: Option<f64>,

    #[serde(rename = "Lead", alias = "lead")]
    #[validate(range(min = 0.0))]
    pub lead: Option<f64>,

    #[serde(rename = "Zinc", alias = "zinc")]
    #[validate(range(min = 0.0))]
    pub zinc: Option<f64>,

    #[serde(rename = "Color", alias = "color")]
    pub color: Option<String>,

    #[serde(rename = "Turbidity", alias = "turbidity")]
    #[validate(range(min = 0.0))]
    pub turbidity: Option<f64>,

    #[serde(rename = "Fluoride", alias = "fluoride")]
    #[validate(range(min = 0.0))]
    pub fluoride: Option<f64>,

    #[serde(rename = "Conductivity", alias = "conductivity")]
    #[validate(range(min = 0.0))]
    pub conductivity: Option<f64>,

    #[serde(rename = "Chlorine", alias = "chlorine")]
    #[validate(range(min = 0.0))]
    pub chlorine: Option<f64>,

    #[serde(rename = "Manganese", alias = "manganese")]
    #[validate(range(min = 0.0))]
    pub manganese: Option<f64>,

    #[serde(rename = "Total Dissolved Solids", alias = "total_dissolved_solids")]
    #[validate(range(min = 0.0))]
    pub total_dissolved_solids: Option<f64>,

    #[serde(rename = "Source", alias = "source")]
    pub source: Option<String>,

    #[serde(rename = "Water Temperature", alias = "water_temperature")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub water_temperature: Option<f64>,

    #[serde(rename = "Air Temperature", alias = "air_temperature")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub air_temperature: Option<f64>,

    #[serde(rename = "Month", alias = "month")]
    pub month: Option<String>,

    #[serde(rename = "Day", alias = "day")]
    #[validate(range(min = 1, max = 31))]
    pub day: Option<i64>,
}

impl RawSample {
    /// The values the form starts out with
    pub fn defaults() -> Self {
        Self {
            ph: Some(7.0),
            iron: Some(0.01),
            nitrate: Some(5.0),
            chloride: Some(100.0),
            lead: Some(0.01),
            zinc: Some(0.01),
            color: Some(WaterColor::Colorless.to_string()),
            turbidity: Some(1.0),
            fluoride: Some(0.5),
            conductivity: Some(300.0),
            chlorine: Some(1.0),
            manganese: Some(0.01),
            total_dissolved_solids: Some(150.0),
            source: Some(WaterSource::Well.to_string()),
            water_temperature: Some(25.0),
            air_temperature: Some(30.0),
            month: Some(Month::January.to_string()),
            day: Some(1),
        }
    }

    fn numeric_fields(&self) -> [(&'static str, Option<f64>); 15] {
        [
            ("pH", self.ph),
            ("Iron", self.iron),
            ("Nitrate", self.nitrate),
            ("Chloride", self.chloride),
            ("Lead", self.lead),
            ("Zinc", self.zinc),
            ("Turbidity", self.turbidity),
            ("Fluoride", self.fluoride),
            ("Conductivity", self.conductivity),
            ("Chlorine", self.chlorine),
            ("Manganese", self.manganese),
            ("Total Dissolved Solids", self.total_dissolved_solids),
            ("Water Temperature", self.water_temperature),
            ("Air Temperature", self.air_temperature),
            ("Day", self.day.map(|day| day as f64)),
        ]
    }

    /// Canonical names of the columns that have no value
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = self
            .numeric_fields()
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        for (name, value) in [
            ("Color", &self.color),
            ("Source", &self.source),
            ("Month", &self.month),
        ] {
            if value.is_none() {
                missing.push(name);
            }
        }

        // Report in schema order
        missing.sort_by_key(|name| feature_names().position(|column| column == *name));
        missing
    }
}

fn parse_category<T: FromStr>(field: &'static str, value: &str) -> Result<T> {
    T::from_str(value.trim()).map_err(|_| {
        AppError::Validation(format!("{}: '{}' is not an allowed value", field, value))
    })
}

/// Checks the range derive cannot express: finiteness, category membership
/// and that the day exists in the chosen month.
fn validate_sample(sample: &RawSample) -> std::result::Result<(), ValidationError> {
    for (name, value) in sample.numeric_fields() {
        if let Some(value) = value {
            if !value.is_finite() {
                let mut err = ValidationError::new("non_finite");
                err.message = Some(format!("{} must be a finite number", name).into());
                return Err(err);
            }
        }
    }

    if let Some(color) = &sample.color {
        if WaterColor::from_str(color.trim()).is_err() {
            return Err(category_error("Color", color));
        }
    }
    if let Some(source) = &sample.source {
        if WaterSource::from_str(source.trim()).is_err() {
            return Err(category_error("Source", source));
        }
    }

    if let Some(month) = &sample.month {
        let month = Month::from_str(month.trim()).map_err(|_| category_error("Month", month))?;
        if let Some(day) = sample.day {
            if day > i64::from(month.max_day()) {
                let mut err = ValidationError::new("day_of_month");
                err.message = Some(
                    format!("{} has no day {} (max {})", month, day, month.max_day()).into(),
                );
                return Err(err);
            }
        }
    }

    Ok(())
}

fn category_error(field: &str, value: &str) -> ValidationError {
    let mut err = ValidationError::new("unknown_category");
    err.message = Some(format!("{}: '{}' is not an allowed value", field, value).into());
    err
}

/// Builds a [`FeatureRecord`] out of a form submission
#[derive(Debug, Clone, Copy, Default)]
pub struct InputAssembler;

impl InputAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble exactly one complete record. Out-of-bound values fail with a
    /// validation error and any missing column fails the whole assembly;
    /// nothing is clamped or defaulted.
    pub fn assemble(&self, raw: &RawSample) -> Result<FeatureRecord> {
        raw.validate()?;

        let missing = raw.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Schema(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let required = |name: &'static str, value: Option<f64>| {
            value.ok_or_else(|| AppError::Schema(format!("missing required fields: {}", name)))
        };
        let category = |name: &'static str, value: &Option<String>| {
            value
                .clone()
                .ok_or_else(|| AppError::Schema(format!("missing required fields: {}", name)))
        };

        Ok(FeatureRecord {
            ph: required("pH", raw.ph)?,
            iron: required("Iron", raw.iron)?,
            nitrate: required("Nitrate", raw.nitrate)?,
            chloride: required("Chloride", raw.chloride)?,
            lead: required("Lead", raw.lead)?,
            zinc: required("Zinc", raw.zinc)?,
            color: parse_category("Color", &category("Color", &raw.color)?)?,
            turbidity: required("Turbidity", raw.turbidity)?,
            fluoride: required("Fluoride", raw.fluoride)?,
            conductivity: required("Conductivity", raw.conductivity)?,
            chlorine: required("Chlorine", raw.chlorine)?,
            manganese: required("Manganese", raw.manganese)?,
            total_dissolved_solids: required("Total Dissolved Solids", raw.total_dissolved_solids)?,
            source: parse_category("Source", &category("Source", &raw.source)?)?,
            water_temperature: required("Water Temperature", raw.water_temperature)?,
            air_temperature: required("Air Temperature", raw.air_temperature)?,
            month: parse_category("Month", &category("Month", &raw.month)?)?,
            day: raw
                .day
                .ok_or_else(|| AppError::Schema("missing required fields: Day".to_string()))
                .and_then(|day| {
                    u8::try_from(day).map_err(|_| {
                        AppError::Validation(format!("Day: {} is out of range", day))
                    })
                })?,
        })
    }
}
