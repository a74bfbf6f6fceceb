// src/handlers/mod.rs

pub mod predict;
pub mod quiz;
