use std::path::PathBuf;

use thiserror::Error;

use crate::reactor::StopReason;

/// Errors raised while building a reactor layout from codes or grid text.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid number of components: {0}")]
    InvalidComponentCount(usize),

    #[error("Invalid component code: {0}")]
    UnknownCode(String),

    #[error("Invalid number of extra chambers: {0}")]
    InvalidChambers(usize),

    #[error("Invalid number of rows: {found} (expected {expected})")]
    InvalidRowCount { found: usize, expected: usize },

    #[error("Row {row} has {found} components, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Slot ({x}, {y}) outside {width}x{height} grid")]
    SlotOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Layout file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Layout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the reactor evaluation.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Unexpected stop reason during {stage}: {reason:?}")]
    UnexpectedStop {
        stage: &'static str,
        reason: StopReason,
    },
}
