//! # Reusable Layer Modules

pub mod blocks;
