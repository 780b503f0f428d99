//! Static catalog of models with dedicated reasoning modes.
//!
//! Deliberately independent of configuration: the catalog answers
//! "which models can reason" even when none of their vendors hold a
//! key in this process.

/// Models with a first-class reasoning mode, across all vendors.
pub const REASONING_MODELS: &[&str] = &[
    "o1",
    "o3-mini",
    "deepseek-reasoner",
    "claude-3-7-sonnet-20250219",
];

pub const REASONING_MODELS_DESCRIPTION: &str =
    "These models are specifically optimized for reasoning tasks and support \
     the reasoning_effort parameter.";
