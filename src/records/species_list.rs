use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Reference listing: the species list used in this design, one row per
/// listed species.
#[derive(Debug, Clone)]
pub struct SpeciesList {
    pub unit_key: String,
    pub country: String,
    pub institute: String,
    pub species_list_name: Option<String>,
    pub year: i64,
    pub catch_fraction: String,
}

impl SpeciesList {
    pub const COLUMNS: &'static [&'static str] = &[
        "SLid",
        "SLrecordType",
        "SLcountry",
        "SLinstitute",
        "SLspeciesListName",
        "SLyear",
        "SLcatchFraction",
    ];

    pub fn new(species_no: i64, year: i64, country: &str, institute: &str) -> Self {
        Self {
            unit_key: species_no.to_string(),
            country: country.to_string(),
            institute: institute.to_string(),
            species_list_name: None,
            year,
            catch_fraction: "Catch".to_string(),
        }
    }

    pub fn frame(rows: &[Self]) -> Result<DataFrame, ReportError> {
        let n = rows.len();
        let [unit, parent] = staging_cols(
            rows.iter().map(|r| Some(r.unit_key.clone())).collect(),
            vec![None; n],
        );
        let df = DataFrame::new(vec![
            unit,
            parent,
            null_int_col("SLid", n),
            repeat_col("SLrecordType", record_type::SPECIES_LIST, n),
            str_col("SLcountry", rows.iter().map(|r| Some(r.country.clone())).collect()),
            str_col(
                "SLinstitute",
                rows.iter().map(|r| Some(r.institute.clone())).collect(),
            ),
            str_col(
                "SLspeciesListName",
                rows.iter().map(|r| r.species_list_name.clone()).collect(),
            ),
            int_col("SLyear", rows.iter().map(|r| Some(r.year)).collect()),
            str_col(
                "SLcatchFraction",
                rows.iter().map(|r| Some(r.catch_fraction.clone())).collect(),
            ),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("SLid", FieldType::Int, false),
            FieldSpec::new("SLrecordType", FieldType::Str, true).allowed(&["SL"]),
            FieldSpec::new("SLcountry", FieldType::Str, true),
            FieldSpec::new("SLinstitute", FieldType::Str, true),
            FieldSpec::new("SLspeciesListName", FieldType::Str, true),
            FieldSpec::new("SLyear", FieldType::Int, true).range(1965.0, 2030.0),
            FieldSpec::new("SLcatchFraction", FieldType::Str, true)
                .allowed(&["Catch", "Dis", "Lan"]),
        ]
    }
}
