//! Typed record kinds for the seven-level reporting hierarchy and the
//! standalone reference listings.
//!
//! Each kind is a struct with a fixed field set, built from the linked
//! source tables, and knows its declared output column order and its
//! validation catalogue. Own-id and parent-id columns are created null:
//! identifiers exist only after the persistence layer has written the
//! row, and the assembler back-fills parent references from write
//! results.

use polars::prelude::*;

use crate::schema::{record_type, staging};
use crate::validate::FieldSpec;

mod biological_variable;
mod design;
mod fishing_operation;
mod fishing_trip;
mod individual_species;
mod sample_record;
mod sampling_details;
mod species_list;
mod species_selection;
mod vessel_details;

pub use biological_variable::BiologicalVariable;
pub use design::Design;
pub use fishing_operation::FishingOperation;
pub use fishing_trip::FishingTrip;
pub use individual_species::IndividualSpecies;
pub use sample_record::SampleRecord;
pub use sampling_details::SamplingDetails;
pub use species_list::SpeciesList;
pub use species_selection::SpeciesSelection;
pub use vessel_details::{vessel_length_category, VesselDetails};

/// One of the record kinds handled by the assembler and exporter: the
/// seven hierarchy levels plus the three reference listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Design,
    SamplingDetails,
    FishingTrip,
    FishingOperation,
    SpeciesSelection,
    Sample,
    BiologicalVariable,
    VesselDetails,
    SpeciesList,
    IndividualSpecies,
}

impl Level {
    /// Hierarchy levels in strict parent-before-child write order.
    pub const HIERARCHY: [Level; 7] = [
        Level::Design,
        Level::SamplingDetails,
        Level::FishingTrip,
        Level::FishingOperation,
        Level::SpeciesSelection,
        Level::Sample,
        Level::BiologicalVariable,
    ];

    /// Reference listings written before the hierarchy; they carry no
    /// resolved parent references.
    pub const REFERENCE: [Level; 3] = [
        Level::VesselDetails,
        Level::SpeciesList,
        Level::IndividualSpecies,
    ];

    /// Storage table name used by the persistence collaborator.
    pub fn table(self) -> &'static str {
        match self {
            Level::Design => "design",
            Level::SamplingDetails => "sampling_details",
            Level::FishingTrip => "fishing_trip",
            Level::FishingOperation => "fishing_operation",
            Level::SpeciesSelection => "species_selection",
            Level::Sample => "sample",
            Level::BiologicalVariable => "biological_variable",
            Level::VesselDetails => "vessel_details",
            Level::SpeciesList => "species_list",
            Level::IndividualSpecies => "individual_species",
        }
    }

    pub fn record_type(self) -> &'static str {
        match self {
            Level::Design => record_type::DESIGN,
            Level::SamplingDetails => record_type::SAMPLING_DETAILS,
            Level::FishingTrip => record_type::FISHING_TRIP,
            Level::FishingOperation => record_type::FISHING_OPERATION,
            Level::SpeciesSelection => record_type::SPECIES_SELECTION,
            Level::Sample => record_type::SAMPLE,
            Level::BiologicalVariable => record_type::BIOLOGICAL_VARIABLE,
            Level::VesselDetails => record_type::VESSEL_DETAILS,
            Level::SpeciesList => record_type::SPECIES_LIST,
            Level::IndividualSpecies => record_type::INDIVIDUAL_SPECIES,
        }
    }

    /// Column holding the identifier the store assigns on insert.
    pub fn id_column(self) -> &'static str {
        match self {
            Level::Design => "DEid",
            Level::SamplingDetails => "SDid",
            Level::FishingTrip => "FTid",
            Level::FishingOperation => "FOid",
            Level::SpeciesSelection => "SSid",
            Level::Sample => "SAid",
            Level::BiologicalVariable => "BVid",
            Level::VesselDetails => "VDid",
            Level::SpeciesList => "SLid",
            Level::IndividualSpecies => "ISid",
        }
    }

    /// The record-type discriminator column; export projection starts here.
    pub fn record_type_column(self) -> &'static str {
        match self {
            Level::Design => "DErecordType",
            Level::SamplingDetails => "SDrecordType",
            Level::FishingTrip => "FTrecordType",
            Level::FishingOperation => "FOrecordType",
            Level::SpeciesSelection => "SSrecordType",
            Level::Sample => "SArecordType",
            Level::BiologicalVariable => "BVrecordType",
            Level::VesselDetails => "VDrecordType",
            Level::SpeciesList => "SLrecordType",
            Level::IndividualSpecies => "ISrecordType",
        }
    }

    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Design => None,
            Level::SamplingDetails => Some(Level::Design),
            Level::FishingTrip => Some(Level::SamplingDetails),
            Level::FishingOperation => Some(Level::FishingTrip),
            Level::SpeciesSelection => Some(Level::FishingOperation),
            Level::Sample => Some(Level::SpeciesSelection),
            Level::BiologicalVariable => Some(Level::Sample),
            Level::VesselDetails | Level::SpeciesList | Level::IndividualSpecies => None,
        }
    }

    /// Column that receives the parent's generated identifier.
    pub fn parent_id_column(self) -> Option<&'static str> {
        self.parent().map(Level::id_column)
    }

    /// Declared output column order for this kind.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Level::Design => Design::COLUMNS,
            Level::SamplingDetails => SamplingDetails::COLUMNS,
            Level::FishingTrip => FishingTrip::COLUMNS,
            Level::FishingOperation => FishingOperation::COLUMNS,
            Level::SpeciesSelection => SpeciesSelection::COLUMNS,
            Level::Sample => SampleRecord::COLUMNS,
            Level::BiologicalVariable => BiologicalVariable::COLUMNS,
            Level::VesselDetails => VesselDetails::COLUMNS,
            Level::SpeciesList => SpeciesList::COLUMNS,
            Level::IndividualSpecies => IndividualSpecies::COLUMNS,
        }
    }

    /// Validation catalogue for this kind.
    pub fn field_specs(self) -> Vec<FieldSpec> {
        match self {
            Level::Design => Design::field_specs(),
            Level::SamplingDetails => SamplingDetails::field_specs(),
            Level::FishingTrip => FishingTrip::field_specs(),
            Level::FishingOperation => FishingOperation::field_specs(),
            Level::SpeciesSelection => SpeciesSelection::field_specs(),
            Level::Sample => SampleRecord::field_specs(),
            Level::BiologicalVariable => BiologicalVariable::field_specs(),
            Level::VesselDetails => VesselDetails::field_specs(),
            Level::SpeciesList => SpeciesList::field_specs(),
            Level::IndividualSpecies => IndividualSpecies::field_specs(),
        }
    }
}

// ── Frame-building helpers shared by the record kinds ───────────────────────

pub(crate) fn str_col(name: &str, values: Vec<Option<String>>) -> Column {
    Column::new(name.into(), values)
}

pub(crate) fn int_col(name: &str, values: Vec<Option<i64>>) -> Column {
    Column::new(name.into(), values)
}

pub(crate) fn float_col(name: &str, values: Vec<Option<f64>>) -> Column {
    Column::new(name.into(), values)
}

pub(crate) fn null_int_col(name: &str, len: usize) -> Column {
    Column::new(name.into(), vec![None::<i64>; len])
}

pub(crate) fn repeat_col(name: &str, value: &str, len: usize) -> Column {
    Column::new(name.into(), vec![Some(value.to_string()); len])
}

/// The two staging columns every built level table starts with.
pub(crate) fn staging_cols(
    unit_keys: Vec<Option<String>>,
    parent_keys: Vec<Option<String>>,
) -> [Column; 2] {
    [
        Column::new(staging::UNIT_KEY.into(), unit_keys),
        Column::new(staging::PARENT_KEY.into(), parent_keys),
    ]
}

/// Shared allowed-value vocabularies used across several catalogues.
pub(crate) mod vocab {
    pub const YES_NO: &[&str] = &["N", "Y"];
    pub const SELECTION_METHODS: &[&str] = &[
        "CENSUS",
        "FIXED",
        "NPCS",
        "NPJS",
        "NPQSRSWOR",
        "SRSWOR",
        "SRSWR",
        "SYSS",
        "Unknown",
        "UPSWOR",
        "UPSWR",
    ];
    pub const SAMPLERS: &[&str] = &["Control", "Imagery", "Observer", "SelfSampling"];
}
