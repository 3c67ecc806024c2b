//! Project orchestration over the storage traits.
//!
//! Every operation takes the caller identity as an explicit argument and
//! returns [`CoreError`](secplan_core::error::CoreError) on failure.

pub mod code_generator;
pub mod lookups;
pub mod projects;

mod store_error;

pub use code_generator::CodeGenerator;
pub use lookups::LookupCatalogProvider;
pub use projects::ProjectService;
