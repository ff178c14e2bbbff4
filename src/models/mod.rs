// src/models/mod.rs

pub mod attempt;
pub mod bundle;
pub mod quiz;
