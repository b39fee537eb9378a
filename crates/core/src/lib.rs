//! Subtheme classification core: rule data, pattern compilation, the
//! multi-tier cascade scorer, and per-theme dispatch.

pub mod classifier;
pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod models;
pub mod pool;
pub mod rules;
pub mod scorer;
pub mod themes;
