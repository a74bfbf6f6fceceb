// src/models/mod.rs

pub mod prediction;
pub mod question;
pub mod session;
