//! Reasoning capability implementations for windlass.
//!
//! All implementations satisfy the `windlass_core::Reasoner` trait; the
//! workflow and gateway consume them behind `Arc<dyn Reasoner>`.

use std::sync::Arc;

use windlass_core::Reasoner;

pub mod local;

pub use local::LocalReasoner;

/// Build the configured reasoning capability.
pub fn build_from_config(config: &windlass_config::AppConfig) -> Arc<dyn Reasoner> {
    Arc::new(LocalReasoner::from_config(&config.reasoner))
}
