// renderer/error.rs
use std::fmt;

use thiserror::Error;

/// Which of the renderer's state stacks an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Color,
    Texture,
    Transform,
    DisplayList,
    Wireframe,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StackKind::Color => "color",
            StackKind::Texture => "texture",
            StackKind::Transform => "transform",
            StackKind::DisplayList => "display list",
            StackKind::Wireframe => "wireframe",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("{stack} stack overflow (max depth {depth})")]
    StackOverflow { stack: StackKind, depth: usize },

    #[error("{stack} stack underflow")]
    StackUnderflow { stack: StackKind },

    #[error("no display list is being built")]
    UnbalancedBuilder,

    #[error("backend submission failed: {0}")]
    BackendSubmissionFailure(String),

    #[error("renderer has not been initialized with a viewport")]
    NotInitialized,

    #[error("settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stack() {
        let err = RenderError::StackOverflow {
            stack: StackKind::Transform,
            depth: 64,
        };
        assert_eq!(err.to_string(), "transform stack overflow (max depth 64)");

        let err = RenderError::StackUnderflow {
            stack: StackKind::DisplayList,
        };
        assert_eq!(err.to_string(), "display list stack underflow");
    }
}
