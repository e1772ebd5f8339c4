use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Reference listing: one row per vessel the population or the samples
/// touch. Exported standalone, never nested under the hierarchy.
#[derive(Debug, Clone)]
pub struct VesselDetails {
    pub unit_key: String,
    pub encrypted_vessel_code: Option<String>,
    pub year: i64,
    pub country: String,
    pub home_port: Option<String>,
    pub flag_country: String,
    pub length: Option<i64>,
    pub length_category: Option<String>,
    pub power: Option<i64>,
    pub tonnage: Option<i64>,
    pub ton_unit: String,
}

/// EU fleet-segment length class for a vessel length in metres.
pub fn vessel_length_category(length: f64) -> &'static str {
    if length < 8.0 {
        "VL0008"
    } else if length < 10.0 {
        "VL0810"
    } else if length < 12.0 {
        "VL1012"
    } else if length < 15.0 {
        "VL1215"
    } else if length < 18.0 {
        "VL1518"
    } else if length < 24.0 {
        "VL1824"
    } else if length < 40.0 {
        "VL2440"
    } else {
        "VL40XX"
    }
}

impl VesselDetails {
    pub const COLUMNS: &'static [&'static str] = &[
        "VDid",
        "VDrecordType",
        "VDencryptedVesselCode",
        "VDyear",
        "VDcountry",
        "VDhomePort",
        "VDflagCountry",
        "VDlength",
        "VDlengthCategory",
        "VDpower",
        "VDtonnage",
        "VDtonUnit",
    ];

    pub fn new(registration_no: i64, year: i64, country: &str) -> Self {
        Self {
            unit_key: registration_no.to_string(),
            encrypted_vessel_code: None,
            year,
            country: country.to_string(),
            home_port: None,
            flag_country: country.to_string(),
            length: None,
            length_category: None,
            power: None,
            tonnage: None,
            ton_unit: "GRT".to_string(),
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
            null_int_col("VDid", n),
            repeat_col("VDrecordType", record_type::VESSEL_DETAILS, n),
            str_col(
                "VDencryptedVesselCode",
                rows.iter().map(|r| r.encrypted_vessel_code.clone()).collect(),
            ),
            int_col("VDyear", rows.iter().map(|r| Some(r.year)).collect()),
            str_col("VDcountry", rows.iter().map(|r| Some(r.country.clone())).collect()),
            str_col("VDhomePort", rows.iter().map(|r| r.home_port.clone()).collect()),
            str_col(
                "VDflagCountry",
                rows.iter().map(|r| Some(r.flag_country.clone())).collect(),
            ),
            int_col("VDlength", rows.iter().map(|r| r.length).collect()),
            str_col(
                "VDlengthCategory",
                rows.iter().map(|r| r.length_category.clone()).collect(),
            ),
            int_col("VDpower", rows.iter().map(|r| r.power).collect()),
            int_col("VDtonnage", rows.iter().map(|r| r.tonnage).collect()),
            str_col("VDtonUnit", rows.iter().map(|r| Some(r.ton_unit.clone())).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("VDid", FieldType::Int, false),
            FieldSpec::new("VDrecordType", FieldType::Str, true).allowed(&["VD"]),
            FieldSpec::new("VDencryptedVesselCode", FieldType::Str, true),
            FieldSpec::new("VDyear", FieldType::Int, true).range(1965.0, 2030.0),
            FieldSpec::new("VDcountry", FieldType::Str, true),
            FieldSpec::new("VDhomePort", FieldType::Str, false),
            FieldSpec::new("VDflagCountry", FieldType::Str, true),
            FieldSpec::new("VDlength", FieldType::Int, true).range(3.0, 160.0),
            FieldSpec::new("VDlengthCategory", FieldType::Str, true).allowed(&[
                "VL0008", "VL0810", "VL1012", "VL1215", "VL1518", "VL1824", "VL2440", "VL40XX",
            ]),
            FieldSpec::new("VDpower", FieldType::Int, false),
            FieldSpec::new("VDtonnage", FieldType::Int, false),
            FieldSpec::new("VDtonUnit", FieldType::Str, false).allowed(&["GRT", "GT"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_category_boundaries() {
        assert_eq!(vessel_length_category(7.9), "VL0008");
        assert_eq!(vessel_length_category(8.0), "VL0810");
        assert_eq!(vessel_length_category(23.9), "VL1824");
        assert_eq!(vessel_length_category(40.0), "VL40XX");
    }
}
