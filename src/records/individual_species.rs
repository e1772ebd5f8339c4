use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Reference listing: one row per individually listed species, keyed by
/// its aphia code. Exported stacked after the species list; the `SLid`
/// column belongs to the exchange layout and stays unresolved.
#[derive(Debug, Clone)]
pub struct IndividualSpecies {
    pub unit_key: String,
    pub commercial_taxon: Option<i64>,
    pub species_code: Option<i64>,
}

impl IndividualSpecies {
    pub const COLUMNS: &'static [&'static str] =
        &["ISid", "SLid", "ISrecordType", "IScommercialTaxon", "ISspeciesCode"];

    pub fn new(species_no: i64, aphia_code: Option<i64>) -> Self {
        Self {
            unit_key: species_no.to_string(),
            commercial_taxon: aphia_code,
            species_code: aphia_code,
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
            null_int_col("ISid", n),
            null_int_col("SLid", n),
            repeat_col("ISrecordType", record_type::INDIVIDUAL_SPECIES, n),
            int_col(
                "IScommercialTaxon",
                rows.iter().map(|r| r.commercial_taxon).collect(),
            ),
            int_col("ISspeciesCode", rows.iter().map(|r| r.species_code).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("ISid", FieldType::Int, false),
            FieldSpec::new("SLid", FieldType::Int, false),
            FieldSpec::new("ISrecordType", FieldType::Str, true).allowed(&["IS"]),
            FieldSpec::new("IScommercialTaxon", FieldType::Int, true),
            FieldSpec::new("ISspeciesCode", FieldType::Int, true),
        ]
    }
}
