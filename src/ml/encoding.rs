use crate::error::{AppError, Result};
use crate::ml::features::{FeatureRecord, FeatureValue};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a categorical column is turned into numbers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// One output column holding the category's index
    Ordinal { categories: Vec<String> },

    /// One output column per category, 1.0 for the matching one
    OneHot { categories: Vec<String> },
}

impl ColumnEncoding {
    fn categories(&self) -> &[String] {
        match self {
            ColumnEncoding::Ordinal { categories } | ColumnEncoding::OneHot { categories } => {
                categories
            }
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnEncoding::Ordinal { .. } => 1,
            ColumnEncoding::OneHot { categories } => categories.len(),
        }
    }
}

#[derive(Debug, Clone)]
struct EncodedColumn {
    name: String,
    encoding: Option<ColumnEncoding>,
    offset: usize,
}

/// Turns a [`FeatureRecord`] into the numeric row an estimator was fitted on
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    columns: Vec<EncodedColumn>,
    width: usize,
}

impl FeatureEncoder {
    /// Build an encoder for `features` (in order). Columns without an entry
    /// in `encoders` pass through as numbers.
    pub fn new(features: &[String], encoders: &HashMap<String, ColumnEncoding>) -> Result<Self> {
        for name in encoders.keys() {
            if !features.iter().any(|feature| feature == name) {
                return Err(AppError::ClassifierUnavailable(format!(
                    "encoder declared for unknown column '{}'",
                    name
                )));
            }
        }

        let mut columns = Vec::with_capacity(features.len());
        let mut offset = 0;

        for name in features {
            let encoding = encoders.get(name).cloned();
            if let Some(encoding) = &encoding {
                if encoding.categories().is_empty() {
                    return Err(AppError::ClassifierUnavailable(format!(
                        "encoder for '{}' has no categories",
                        name
                    )));
                }
            }

            let width = encoding.as_ref().map(ColumnEncoding::width).unwrap_or(1);
            columns.push(EncodedColumn {
                name: name.clone(),
                encoding,
                offset,
            });
            offset += width;
        }

        Ok(Self {
            columns,
            width: offset,
        })
    }

    /// Width of the encoded row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether `column` is encoded as a category
    pub fn is_categorical(&self, column: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.name == column && c.encoding.is_some())
    }

    /// Encode one record into a row vector
    pub fn encode(&self, record: &FeatureRecord) -> Result<Array1<f64>> {
        let mut row = Array1::zeros(self.width);

        for column in &self.columns {
            let value = record.get(&column.name).ok_or_else(|| {
                AppError::Schema(format!("record has no column '{}'", column.name))
            })?;

            match (value, &column.encoding) {
                (FeatureValue::Numeric(v), None) => row[column.offset] = v,
                (FeatureValue::Categorical(label), Some(encoding)) => {
                    let index = encoding
                        .categories()
                        .iter()
                        .position(|category| category == label)
                        .ok_or_else(|| {
                            AppError::Schema(format!(
                                "category '{}' of column '{}' is unknown to the classifier",
                                label, column.name
                            ))
                        })?;

                    match encoding {
                        ColumnEncoding::Ordinal { .. } => row[column.offset] = index as f64,
                        ColumnEncoding::OneHot { .. } => row[column.offset + index] = 1.0,
                    }
                }
                (FeatureValue::Numeric(_), Some(_)) => {
                    return Err(AppError::Schema(format!(
                        "column '{}' is categorical for the classifier but numeric in the record",
                        column.name
                    )))
                }
                (FeatureValue::Categorical(_), None) => {
                    return Err(AppError::Schema(format!(
                        "column '{}' is numeric for the classifier but categorical in the record",
                        column.name
                    )))
                }
            }
        }

        Ok(row)
    }

    /// Encode one record into a single-row matrix
    pub fn encode_matrix(&self, record: &FeatureRecord) -> Result<Array2<f64>> {
        let row = self.encode(record)?;
        row.into_shape((1, self.width))
            .map_err(|e| AppError::Inference(format!("Failed to create feature array: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features::{feature_names, InputAssembler, RawSample};

    fn schema() -> Vec<String> {
        feature_names().map(String::from).collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn encoders() -> HashMap<String, ColumnEncoding> {
        let mut encoders = HashMap::new();
        encoders.insert(
            "Color".to_string(),
            ColumnEncoding::OneHot {
                categories: strings(&[
                    "Colorless",
                    "Near Colorless",
                    "Faint Yellow",
                    "Light Yellow",
                    "Yellow",
                ]),
            },
        );
        encoders.insert(
            "Source".to_string(),
            ColumnEncoding::Ordinal {
                categories: strings(&[
                    "Well", "Aquifer", "Stream", "Ground", "River", "Lake", "Reservoir",
                ]),
            },
        );
        encoders.insert(
            "Month".to_string(),
            ColumnEncoding::Ordinal {
                categories: strings(&[
                    "January",
                    "February",
                    "March",
                    "April",
                    "May",
                    "June",
                    "July",
                    "August",
                    "September",
                    "October",
                    "November",
                    "December",
                ]),
            },
        );
        encoders
    }

    fn record(sample: RawSample) -> FeatureRecord {
        InputAssembler::new().assemble(&sample).unwrap()
    }

    #[test]
    fn test_encoded_width() {
        let encoder = FeatureEncoder::new(&schema(), &encoders()).unwrap();
        // 15 numeric + 5 one-hot color + ordinal source + ordinal month
        assert_eq!(encoder.width(), 15 + 5 + 1 + 1);
        assert!(encoder.is_categorical("Color"));
        assert!(!encoder.is_categorical("pH"));
    }

    #[test]
    fn test_encode_defaults() {
        let encoder = FeatureEncoder::new(&schema(), &encoders()).unwrap();
        let row = encoder.encode(&record(RawSample::defaults())).unwrap();

        assert_eq!(row[0], 7.0); // pH
        assert_eq!(row[5], 0.01); // Zinc
        assert_eq!(row[6], 1.0); // Color=Colorless
        assert_eq!(row.slice(ndarray::s![7..11]).sum(), 0.0);
        assert_eq!(row[11], 1.0); // Turbidity
        assert_eq!(row[16], 150.0); // Total Dissolved Solids
        assert_eq!(row[17], 0.0); // Source=Well
        assert_eq!(row[18], 25.0); // Water Temperature
        assert_eq!(row[20], 0.0); // Month=January
        assert_eq!(row[21], 1.0); // Day
        assert_eq!(row.len(), 22);
    }

    #[test]
    fn test_unknown_category_is_schema_error() {
        let encoder = FeatureEncoder::new(&schema(), &encoders()).unwrap();
        let mut sample = RawSample::defaults();
        sample.source = Some("Spring".to_string());

        let err = encoder.encode(&record(sample)).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
        assert!(err.to_string().contains("Spring"));
    }

    #[test]
    fn test_kind_mismatch_is_schema_error() {
        let mut encoders = encoders();
        encoders.remove("Color");
        let encoder = FeatureEncoder::new(&schema(), &encoders).unwrap();

        let err = encoder.encode(&record(RawSample::defaults())).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn test_encoder_for_unknown_column_rejected() {
        let mut encoders = encoders();
        encoders.insert(
            "Hardness".to_string(),
            ColumnEncoding::Ordinal {
                categories: strings(&["Soft", "Hard"]),
            },
        );
        assert!(FeatureEncoder::new(&schema(), &encoders).is_err());
    }

    #[test]
    fn test_encode_matrix_shape() {
        let encoder = FeatureEncoder::new(&schema(), &encoders()).unwrap();
        let matrix = encoder
            .encode_matrix(&record(RawSample::defaults()))
            .unwrap();
        assert_eq!(matrix.shape(), &[1, encoder.width()]);
    }
}
