//! CLI command implementations

pub mod apply;
pub mod calculate;
pub mod json_output;
pub mod settings;
pub mod validate;
