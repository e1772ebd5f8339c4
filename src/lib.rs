//! catch-reportkit: assembles fishery sampling observations into the
//! seven-level reporting hierarchy, validates every level against
//! declarative field specifications, persists it parent-before-child and
//! re-serialises the stored hierarchy depth-first into flat CSV
//! listings.
//!
//! The pieces, in pipeline order:
//! - [`matcher`] scores station×haul candidates by space-time proximity
//!   and picks each station's best haul per trip.
//! - [`submission`] pulls the source tables, runs the matcher and the
//!   area/gear/harbour lookups, and builds the typed record tables.
//! - [`validate`] checks any built table against its field-spec
//!   catalogue; findings are data, never panics.
//! - [`assembler`] writes the levels in parent-before-child order,
//!   back-filling child parent references from generated identifiers.
//! - [`exporter`] reads the persisted hierarchy back and writes the
//!   three flat listings.

pub mod assembler;
pub mod error;
pub mod exporter;
pub mod geo;
pub mod matcher;
pub mod records;
pub mod schema;
pub mod sources;
pub mod store;
pub mod submission;
pub mod validate;

pub use assembler::{
    Assembler, HierarchySubmission, LevelBatch, SubmissionOutcome, WriteMode,
};
pub use error::ReportError;
pub use exporter::{export, ExportPaths};
pub use matcher::{best_matches, match_closest_haul, MatchConfig};
pub use records::Level;
pub use store::{MemoryStore, RecordStore, Row};
pub use submission::{ReporterIdentity, SubmissionBuilder, SubmissionRequest};
pub use validate::{validate, FieldSpec, FieldType, ValidationReport};
