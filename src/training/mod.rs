//! Model training
//!
//! - Seeded, non-stratified train/test partitioning
//! - CART decision trees with per-split feature subsampling
//! - Random Forest (bootstrap aggregation of decision trees)

pub mod decision_tree;
pub mod random_forest;
pub mod split;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use split::{train_test_split, TrainTestSplit};

use crate::config::PipelineConfig;

/// Build an unfitted forest from the pipeline hyperparameters
pub fn forest_from_config(config: &PipelineConfig) -> RandomForest {
    let mut forest = RandomForest::new(config.n_estimators)
        .with_random_state(config.seed)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(config.max_features);
    if let Some(depth) = config.max_depth {
        forest = forest.with_max_depth(depth);
    }
    forest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forest_from_default_config() {
        let forest = forest_from_config(&PipelineConfig::default());
        assert_eq!(forest.n_estimators, 100);
        assert_eq!(forest.random_state, 42);
        assert_eq!(forest.max_depth, None);
        assert_eq!(forest.max_features, MaxFeatures::Sqrt);
        assert!(forest.bootstrap);
    }
}
