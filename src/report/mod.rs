pub mod history;

pub use history::{combine_results, save_results, COMBINED_RESULTS};
