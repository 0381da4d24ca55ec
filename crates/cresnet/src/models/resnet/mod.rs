//! # Configurable `ResNet` Classifiers
//!
//! CIFAR-style residual networks: a stride-1 3x3 stem, four residual
//! stages at base widths 64/128/256/512, a fixed-window average pool,
//! and a linear classifier head producing logits.
//!
//! Block composition is driven by per-block [`BlockSpec`] records;
//! the named constructors in [`prefabs`] fix the block variant and
//! per-stage depths for the standard ResNet-18/34/50/101/152 shapes.

pub mod basic_block;
pub mod block_spec;
pub mod bottleneck;
pub mod downsample;
pub mod layer_block;
pub mod prefabs;
pub mod residual_block;
pub mod resnet_model;
pub mod util;

pub use block_spec::{BlockSpec, ConvSpec};
pub use prefabs::{resnet18, resnet34, resnet50, resnet101, resnet152};
pub use residual_block::BlockVariant;
pub use resnet_model::{ResNet, ResNetConfig};
