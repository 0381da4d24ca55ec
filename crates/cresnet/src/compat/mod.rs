//! # Compat Wrappers
//!
//! Abstraction wrappers over families of ``burn::nn`` layers,
//! ported or planned for an upcoming release of ``burn``.

pub mod activation_wrapper;
pub mod normalization_wrapper;
