//! Rendering and export for the `mergescore` binary.
pub mod export;
pub mod render;
