#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kabucal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pipeline;

// Re-export main types from sub-crates
pub use kabucal_data as data;
pub use kabucal_output as output;

pub use config::PipelineConfig;
pub use pipeline::{
    PipelineError, RunSummary, Sources, collect_announcements, collect_holidays, generate,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
