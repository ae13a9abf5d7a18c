// src/models/mod.rs

pub mod analytics;
pub mod attempt;
pub mod exam;
pub mod question;
pub mod user;
