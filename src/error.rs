// SPDX-License-Identifier: Apache-2.0

//! Error type shared by the parser, function model, and comparator.

/// Statement forms that are recognized but deliberately not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    Label,
    Switch,
}

impl std::fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedKind::Label => write!(f, "label"),
            UnsupportedKind::Switch => write!(f, "switch"),
        }
    }
}

/// Errors that can arise while building or comparing GIMPLE functions.
#[derive(Debug, Clone, PartialEq)]
pub enum GimpleError {
    /// A block was built from zero lines.
    EmptyBlock,
    /// The first line of a block is not a `<bb N>:` header.
    MalformedBlockHeader(String),
    /// Two blocks in one function share a number.
    DuplicateBlock(usize),
    /// No `;; Function` line was found.
    MissingFunctionHeader,
    /// A `;; Function` line did not carry the expected uid fields.
    MalformedFunctionHeader(String),
    /// The named function has no `{` line.
    MissingBody(String),
    /// The named function's body has no closing `}` line.
    UnterminatedBody(String),
    /// A label or switch statement was encountered.
    UnsupportedStatement { kind: UnsupportedKind, text: String },
    /// Similarity threshold outside of (0, 1].
    InvalidThreshold(f64),
    /// Iteration bound of zero.
    InvalidIterations(usize),
    /// Configuration text could not be decoded.
    Config(String),
    /// The caller's cancellation flag was raised.
    Cancelled,
}

impl std::fmt::Display for GimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GimpleError::EmptyBlock => write!(f, "cannot build a block from zero lines"),
            GimpleError::MalformedBlockHeader(text) => {
                write!(f, "expected block header, got '{}'", text)
            }
            GimpleError::DuplicateBlock(number) => {
                write!(f, "block <bb {}> appears more than once", number)
            }
            GimpleError::MissingFunctionHeader => write!(f, "no ';; Function' header found"),
            GimpleError::MalformedFunctionHeader(text) => {
                write!(f, "malformed function header '{}'", text)
            }
            GimpleError::MissingBody(name) => {
                write!(f, "function '{}' has no '{{' body start", name)
            }
            GimpleError::UnterminatedBody(name) => {
                write!(f, "function '{}' body has no closing '}}'", name)
            }
            GimpleError::UnsupportedStatement { kind, text } => {
                write!(f, "unsupported {} statement: '{}'", kind, text)
            }
            GimpleError::InvalidThreshold(value) => {
                write!(f, "threshold must be in (0, 1]; got {}", value)
            }
            GimpleError::InvalidIterations(value) => {
                write!(f, "iterations must be at least 1; got {}", value)
            }
            GimpleError::Config(msg) => write!(f, "configuration error: {}", msg),
            GimpleError::Cancelled => write!(f, "comparison cancelled"),
        }
    }
}

impl std::error::Error for GimpleError {}
