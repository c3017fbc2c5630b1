pub mod classifier_trait;
pub mod decision_tree;
pub mod factory;
pub mod random_forest;

pub use classifier_trait::ClassifierModel;
pub use factory::{build_model, Classifier};
pub use random_forest::RandomForest;
