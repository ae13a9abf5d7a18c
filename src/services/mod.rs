// src/services/mod.rs

pub mod analytics;
pub mod scoring;
pub mod submission;
