//! Output stage: renders a parsed character for external consumers.
pub mod json;
