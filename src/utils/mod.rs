// src/utils/mod.rs

pub mod extract;
