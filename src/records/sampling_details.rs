use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{null_int_col, repeat_col, staging_cols, str_col};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Second level: who sampled, as reporting country and institution.
#[derive(Debug, Clone)]
pub struct SamplingDetails {
    pub unit_key: String,
    pub parent_key: String,
    pub country: String,
    pub institution: String,
}

impl SamplingDetails {
    pub const COLUMNS: &'static [&'static str] =
        &["SDid", "DEid", "SDrecordType", "SDcountry", "SDinstitution"];

    pub fn new(parent_key: &str, country: &str, institution: &str) -> Self {
        Self {
            unit_key: format!("SD-{parent_key}"),
            parent_key: parent_key.to_string(),
            country: country.to_string(),
            institution: institution.to_string(),
        }
    }

    pub fn frame(rows: &[Self]) -> Result<DataFrame, ReportError> {
        let n = rows.len();
        let [unit, parent] = staging_cols(
            rows.iter().map(|r| Some(r.unit_key.clone())).collect(),
            rows.iter().map(|r| Some(r.parent_key.clone())).collect(),
        );
        let df = DataFrame::new(vec![
            unit,
            parent,
            null_int_col("SDid", n),
            null_int_col("DEid", n),
            repeat_col("SDrecordType", record_type::SAMPLING_DETAILS, n),
            str_col("SDcountry", rows.iter().map(|r| Some(r.country.clone())).collect()),
            str_col(
                "SDinstitution",
                rows.iter().map(|r| Some(r.institution.clone())).collect(),
            ),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("SDid", FieldType::Int, false),
            FieldSpec::new("DEid", FieldType::Int, false),
            FieldSpec::new("SDrecordType", FieldType::Str, true).allowed(&["SD"]),
            FieldSpec::new("SDcountry", FieldType::Str, true),
            FieldSpec::new("SDinstitution", FieldType::Str, true),
        ]
    }
}
