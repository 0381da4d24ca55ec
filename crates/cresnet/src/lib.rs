#![warn(missing_docs)]
//! # cresnet - Configurable CIFAR-style ResNets for burn
//!
//! ## Notable Components
//!
//! * [`compat`] - compat code, ported or planned for an upcoming release of ``burn``.
//!   * [`compat::activation_wrapper::Activation`] - activation layer abstraction wrapper.
//!   * [`compat::normalization_wrapper::Normalization`] - norm layer abstraction wrapper.
//! * [`layers`] - reusable neural network modules.
//!   * [`layers::blocks`] - miscellaneous blocks.
//!     * [`layers::blocks::conv_norm_act`] - ``Conv2d + Norm + Activation`` block.
//! * [`models`] - complete model families.
//!   * [`models::resnet`] - configurable `ResNet` classifiers.

/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod compat;

pub mod layers;

pub mod models;
