//! Per-contributor engineering metrics: local git history and GitHub pull
//! request activity, merged under canonical identities and scored.

pub mod analyze;
pub mod error;
pub mod gather;
pub mod git;
pub mod github;
pub mod model;
pub mod report;
pub mod utils;

pub use gather::gather;
