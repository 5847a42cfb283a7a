use thiserror::Error;

use crate::types::{NodeId, PathId};

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("column range {min}..={max} must span at least two columns")]
    InvalidColumnRange { min: usize, max: usize },
    #[error("every node content type is excluded for this split")]
    NoEventTypes,
    #[error("no encounter is available for the major battle")]
    NoMajorEncounter,
    #[error("no node in column {floor} could be connected")]
    Unconnectable { floor: usize },
    #[error("path {path:?} does not leave node {from:?}")]
    NotConnected { from: NodeId, path: PathId },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("split name {0:?} is defined more than once")]
    DuplicateSplit(String),
    #[error("split {name:?} has an encounter without enemies")]
    EmptyEncounter { name: String },
}
