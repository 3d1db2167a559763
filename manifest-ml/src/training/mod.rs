//! Train/test splitting and the random forest classifier.

pub mod artifact;
pub mod forest;
pub mod split;
pub mod tree;

pub use artifact::{FORMAT_VERSION, ModelArtifact};
pub use forest::{RandomForestModel, Trainer, feature_matrix};
pub use split::{SplitData, Splitter, test_row_count};
pub use tree::{DecisionTree, Node};
