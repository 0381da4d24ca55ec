//! # Miscellaneous Blocks

pub mod conv_norm_act;
