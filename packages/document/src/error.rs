//! Error types for document edits

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Position {pos} is outside the document (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Position {0} is not a block boundary")]
    NotABlockBoundary(usize),

    #[error("Invalid range: {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("Block {0} does not exist")]
    BlockNotFound(usize),
}
