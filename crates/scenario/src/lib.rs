//! Scenario and role-profile storage.
//!
//! Both stores hold read-mostly snapshots: readers clone an `Arc` and
//! never block a writer; writers swap entries under a short lock.

pub mod fallback;
pub mod profiles;
pub mod store;
pub mod validate;

pub use profiles::RoleProfileStore;
pub use store::ScenarioStore;
