//! Core library: scanning, name matching, correspondence resolution and
//! line-level quality metrics for merge-tool output.

pub mod analysis;
pub mod comparator;
pub mod config;
pub mod error;
pub mod legacy;
pub mod matcher;
pub mod models;
pub mod names;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod scanner;
pub mod similarity;
