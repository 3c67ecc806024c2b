//! Field projection selection.
//!
//! Two fixed projections exist: anonymous callers see the public subset,
//! every authenticated caller sees the internal set regardless of role.

/// Which field set of a project a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Public,
    Internal,
}

/// Fields (top-level JSON keys) of the public projection.
pub const PUBLIC_FIELDS: &[&str] = &[
    "id",
    "unique_code",
    "name",
    "status",
    "unit",
    "typology",
    "address",
    "land_area",
    "building_area",
    "sector",
    "year",
    "prioritized",
    "created_at",
    "updated_at",
];

/// Fields the internal projection adds on top of [`PUBLIC_FIELDS`].
pub const INTERNAL_ONLY_FIELDS: &[&str] = &[
    "description",
    "designer",
    "formulator",
    "financing_line",
    "program",
    "financing_stage",
    "amount",
    "currency",
    "file_code",
    "application_date",
    "awarded_amount",
    "tender_code",
    "status_id",
    "unit_id",
    "typology_id",
    "sector_id",
    "designer_id",
    "formulator_id",
    "financing_line_id",
    "program_id",
    "financing_stage_id",
];

impl Projection {
    /// Select the projection for a caller.
    pub fn for_caller(has_identity: bool) -> Self {
        if has_identity {
            Projection::Internal
        } else {
            Projection::Public
        }
    }

    /// Every top-level field visible under this projection.
    pub fn fields(self) -> Vec<&'static str> {
        match self {
            Projection::Public => PUBLIC_FIELDS.to_vec(),
            Projection::Internal => PUBLIC_FIELDS
                .iter()
                .chain(INTERNAL_ONLY_FIELDS)
                .copied()
                .collect(),
        }
    }
}
