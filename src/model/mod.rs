mod alias;
mod config;
mod period;
mod project;
mod result;

pub use alias::AliasResolver;
pub use config::Config;
pub use period::Period;
pub use project::Project;
pub use result::{ReportInfo, RepositoryStats, RunResult, UserRecord};
