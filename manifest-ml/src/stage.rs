//! Pipeline stage identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stage of the pipeline, used to tag log lines and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Clean,
    Features,
    Persist,
    Split,
    Train,
    Evaluate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Clean => "clean",
            Self::Features => "features",
            Self::Persist => "persist",
            Self::Split => "split",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
