/// Column-name constants for catch-reportkit source and match tables.
/// Single source of truth for every join and matcher column.

// ── Station columns ─────────────────────────────────────────────────────────
pub mod station {
    pub const STATION_ID: &str = "station_id";
    pub const STATION_DATE: &str = "station_date";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const FISHING_TRIP_ID: &str = "fishing_trip_id";
    pub const AREA: &str = "area";
}

// ── Sample columns ──────────────────────────────────────────────────────────
pub mod sample {
    pub const STATION_ID: &str = "station_id";
    pub const SAMPLE_ID: &str = "sample_id";
    pub const TARGET_ASSEMBLAGE: &str = "target_assemblage";
}

// ── Haul (fishing-station) columns ──────────────────────────────────────────
pub mod haul {
    pub const FISHING_STATION_ID: &str = "fishing_station_id";
    pub const FISHING_TRIP_ID: &str = "fishing_trip_id";
    pub const FISHING_START: &str = "fishing_start";
    pub const FISHING_END: &str = "fishing_end";
    pub const TOW_LATITUDE: &str = "tow_latitude";
    pub const TOW_LONGITUDE: &str = "tow_longitude";
    pub const TOW_LATITUDE_END: &str = "tow_latitude_end";
    pub const TOW_LONGITUDE_END: &str = "tow_longitude_end";
    pub const FAO_GEAR_CODE: &str = "fao_gear_code";
    pub const MESH_SIZE: &str = "mesh_size";
}

// ── Matcher output columns ──────────────────────────────────────────────────
pub mod matching {
    pub const SPATIAL_DISTANCE: &str = "spatial_distance";
    pub const TIME_DIFF: &str = "time_diff";
    pub const SCORE: &str = "score";
    pub const SCALED_SCORE: &str = "scaled_score";
}

// ── Measure columns ─────────────────────────────────────────────────────────
pub mod measure {
    pub const MEASURE_ID: &str = "measure_id";
    pub const SPECIES_CODE: &str = "species_code";
    pub const LENGTH: &str = "length";
    pub const WEIGHT: &str = "weight";
}

// ── Record-type codes for the hierarchy levels ──────────────────────────────
pub mod record_type {
    pub const DESIGN: &str = "DE";
    pub const SAMPLING_DETAILS: &str = "SD";
    pub const FISHING_TRIP: &str = "FT";
    pub const FISHING_OPERATION: &str = "FO";
    pub const SPECIES_SELECTION: &str = "SS";
    pub const SAMPLE: &str = "SA";
    pub const BIOLOGICAL_VARIABLE: &str = "BV";
    pub const VESSEL_DETAILS: &str = "VD";
    pub const SPECIES_LIST: &str = "SL";
    pub const INDIVIDUAL_SPECIES: &str = "IS";
}

// ── Staging columns carried on built level tables, never persisted ──────────
pub mod staging {
    /// Natural key of the row itself, used to map store-generated ids.
    pub const UNIT_KEY: &str = "unit_key";
    /// Natural key of the parent row, resolved to an id before the write.
    pub const PARENT_KEY: &str = "parent_key";
}
