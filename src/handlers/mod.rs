// src/handlers/mod.rs

pub mod admin;
pub mod analytics;
pub mod attempt;
pub mod auth;
pub mod exam;
pub mod question;
