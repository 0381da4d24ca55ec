//! # Named `ResNet` Constructors
//!
//! Factories fixing the block variant and per-stage depths for the
//! standard `ResNet` shapes. Each takes one [`BlockSpec`] list per
//! stage and returns a [`ResNetConfig`] with the default class count;
//! use [`ResNetConfig::with_num_classes`] to override it, and
//! [`ResNetConfig::init`] to obtain the forward-callable model.

use crate::models::resnet::block_spec::BlockSpec;
use crate::models::resnet::residual_block::BlockVariant;
use crate::models::resnet::resnet_model::ResNetConfig;

/// `ResNet`-18 block depths.
pub const RESNET18_BLOCKS: [usize; 4] = [2, 2, 2, 2];
/// `ResNet`-34 block depths.
pub const RESNET34_BLOCKS: [usize; 4] = [3, 4, 6, 3];
/// `ResNet`-50 block depths.
pub const RESNET50_BLOCKS: [usize; 4] = [3, 4, 6, 3];
/// `ResNet`-101 block depths.
pub const RESNET101_BLOCKS: [usize; 4] = [3, 4, 23, 3];
/// `ResNet`-152 block depths.
pub const RESNET152_BLOCKS: [usize; 4] = [3, 8, 36, 3];

/// Default number of classification classes.
pub const DEFAULT_NUM_CLASSES: usize = 10;

fn expect_build(
    variant: BlockVariant,
    depths: [usize; 4],
    stage_specs: [Vec<BlockSpec>; 4],
) -> ResNetConfig {
    match ResNetConfig::build(variant, depths, stage_specs, DEFAULT_NUM_CLASSES) {
        Ok(config) => config,
        Err(err) => panic!("{}", err),
    }
}

/// Build a `ResNet`-18 configuration; basic blocks, depths ``[2, 2, 2, 2]``.
///
/// # Panics
///
/// If a stage's spec-list length differs from its depth.
pub fn resnet18(stage_specs: [Vec<BlockSpec>; 4]) -> ResNetConfig {
    expect_build(BlockVariant::Basic, RESNET18_BLOCKS, stage_specs)
}

/// Build a `ResNet`-34 configuration; basic blocks, depths ``[3, 4, 6, 3]``.
///
/// # Panics
///
/// If a stage's spec-list length differs from its depth.
pub fn resnet34(stage_specs: [Vec<BlockSpec>; 4]) -> ResNetConfig {
    expect_build(BlockVariant::Basic, RESNET34_BLOCKS, stage_specs)
}

/// Build a `ResNet`-50 configuration; bottleneck blocks, depths ``[3, 4, 6, 3]``.
///
/// # Panics
///
/// If a stage's spec-list length differs from its depth.
pub fn resnet50(stage_specs: [Vec<BlockSpec>; 4]) -> ResNetConfig {
    expect_build(BlockVariant::Bottleneck, RESNET50_BLOCKS, stage_specs)
}

/// Build a `ResNet`-101 configuration; bottleneck blocks, depths ``[3, 4, 23, 3]``.
///
/// # Panics
///
/// If a stage's spec-list length differs from its depth.
pub fn resnet101(stage_specs: [Vec<BlockSpec>; 4]) -> ResNetConfig {
    expect_build(BlockVariant::Bottleneck, RESNET101_BLOCKS, stage_specs)
}

/// Build a `ResNet`-152 configuration; bottleneck blocks, depths ``[3, 8, 36, 3]``.
///
/// # Panics
///
/// If a stage's spec-list length differs from its depth.
pub fn resnet152(stage_specs: [Vec<BlockSpec>; 4]) -> ResNetConfig {
    expect_build(BlockVariant::Bottleneck, RESNET152_BLOCKS, stage_specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resnet::layer_block::LayerBlockMeta;
    use crate::models::resnet::residual_block::ResidualBlockConfig;
    use crate::models::resnet::resnet_model::ResNet;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;
    use burn::prelude::Tensor;
    use hamcrest::prelude::*;

    fn standard_specs(depths: [usize; 4]) -> [Vec<BlockSpec>; 4] {
        let mut out: [Vec<BlockSpec>; 4] = Default::default();
        for (idx, stage_stride) in [1, 2, 2, 2].into_iter().enumerate() {
            out[idx] = (0..depths[idx])
                .map(|block_idx| {
                    BlockSpec::new().with_stride(if block_idx == 0 { stage_stride } else { 1 })
                })
                .collect();
        }
        out
    }

    fn is_basic(config: &ResNetConfig) -> bool {
        config
            .stages
            .iter()
            .flat_map(|stage| stage.blocks.iter())
            .all(|block| matches!(block, ResidualBlockConfig::Basic(_)))
    }

    fn is_bottleneck(config: &ResNetConfig) -> bool {
        config
            .stages
            .iter()
            .flat_map(|stage| stage.blocks.iter())
            .all(|block| matches!(block, ResidualBlockConfig::Bottleneck(_)))
    }

    #[test]
    fn test_prefab_structure() {
        let depth_tables = [
            RESNET18_BLOCKS,
            RESNET34_BLOCKS,
            RESNET50_BLOCKS,
            RESNET101_BLOCKS,
            RESNET152_BLOCKS,
        ];
        let builders: [fn([Vec<BlockSpec>; 4]) -> ResNetConfig; 5] =
            [resnet18, resnet34, resnet50, resnet101, resnet152];
        let bottleneck = [false, false, true, true, true];

        for idx in 0..5 {
            let depths = depth_tables[idx];
            let config = builders[idx](standard_specs(depths));
            config.expect_valid();

            for (stage, &depth) in config.stages.iter().zip(depths.iter()) {
                assert_that!(stage.len(), is(equal_to(depth)));
            }

            if bottleneck[idx] {
                assert!(is_bottleneck(&config));
                assert_eq!(config.stages[3].out_planes(), 2048);
            } else {
                assert!(is_basic(&config));
                assert_eq!(config.stages[3].out_planes(), 512);
            }

            assert_eq!(config.num_classes, DEFAULT_NUM_CLASSES);
            assert_eq!(config.expected_input_resolution(), [32, 32]);
        }
    }

    #[test]
    fn test_resnet18_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let model: ResNet<B> = resnet18(standard_specs(RESNET18_BLOCKS)).init(&device);

        let input = Tensor::ones([2, 3, 32, 32], &device);
        let output = model.forward(input);

        assert_shape_contract!(
            ["batch", "num_classes"],
            &output,
            &[("batch", 2), ("num_classes", 10)],
        );
    }

    #[test]
    fn test_resnet50_forward_with_classes() {
        type B = NdArray<f32>;
        let device = Default::default();

        let model: ResNet<B> = resnet50(standard_specs(RESNET50_BLOCKS))
            .with_num_classes(100)
            .init(&device);

        assert_eq!(model.head_planes(), 2048);

        let input = Tensor::ones([1, 3, 32, 32], &device);
        let output = model.forward(input);

        assert_shape_contract!(
            ["batch", "num_classes"],
            &output,
            &[("batch", 1), ("num_classes", 100)],
        );
    }

    #[test]
    fn test_deep_prefab_forward_shapes() {
        type B = NdArray<f32>;
        let device = Default::default();

        for (builder, depths) in [
            (resnet34 as fn([Vec<BlockSpec>; 4]) -> ResNetConfig, RESNET34_BLOCKS),
            (resnet101, RESNET101_BLOCKS),
            (resnet152, RESNET152_BLOCKS),
        ] {
            let model: ResNet<B> = builder(standard_specs(depths)).init(&device);

            let input = Tensor::ones([1, 3, 32, 32], &device);
            let output = model.forward(input);

            assert_shape_contract!(
                ["batch", "num_classes"],
                &output,
                &[("batch", 1), ("num_classes", 10)],
            );
        }
    }

    #[test]
    #[should_panic(expected = "expected 2 block specs, got 1")]
    fn test_prefab_rejects_count_mismatch() {
        let mut specs = standard_specs(RESNET18_BLOCKS);
        specs[2].pop();
        resnet18(specs);
    }
}
