//! Error types shared by the grammar engine, the turtles and the skeleton builder.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FractalError {
    /// A pop was issued with nothing on the save/restore stack.
    ///
    /// This means the symbol sequence has unbalanced brackets. The turtle
    /// state is left untouched and the current pass is aborted.
    #[error("pop on empty turtle stack (unbalanced brackets)")]
    StackUnderflow,

    /// The optional length guard on [`LSystem`](crate::LSystem) tripped.
    #[error("generation {generation} would reach {len} symbols, limit is {limit}")]
    SequenceTooLarge {
        generation: usize,
        len: usize,
        limit: usize,
    },
}

pub type Result<T> = std::result::Result<T, FractalError>;
