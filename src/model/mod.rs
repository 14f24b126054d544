//! Persisted model artifacts and the store that builds, writes and reads them

pub mod artifact;
pub mod store;

pub use artifact::{ModelArtifact, FORMAT_VERSION};
pub use store::ModelStore;
