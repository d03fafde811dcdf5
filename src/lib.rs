// SPDX-License-Identifier: Apache-2.0

//! Semantic similarity of C functions, measured on GCC's optimized GIMPLE
//! dumps rather than on source text.
//!
//! A dump is parsed into a [`Function`] (blocks, statements, variables and
//! their define-use chains). A [`Comparator`] correlates the variables of two
//! functions, aligns their naming, and scores the statement sequences from 0
//! to 100.
//!
//! ```no_run
//! use gimple_sim::{Comparator, CompareOptions, Function};
//!
//! let left = Function::parse(&std::fs::read_to_string("a.gimple").unwrap()).unwrap();
//! let right = Function::parse(&std::fs::read_to_string("b.gimple").unwrap()).unwrap();
//! let comparator = Comparator::new(CompareOptions::default()).unwrap();
//! println!("{:.1}", comparator.compare(&left, &right).unwrap());
//! ```

pub mod block;
pub mod compare;
pub mod config;
pub mod error;
pub mod function;
pub mod operand;
pub mod stmt;
pub mod stmt_equiv;
pub mod stmt_parser;
pub mod var;
pub mod var_correlation;

pub use block::Block;
pub use compare::Comparator;
pub use config::CompareOptions;
pub use error::{GimpleError, UnsupportedKind};
pub use function::{Function, FunctionId};
pub use operand::{ArrayDereference, Operand};
pub use stmt::{Stmt, StmtKind, StmtPayload};
pub use var::{Duc, DucEntry, Variable};
pub use var_correlation::{correlate, VarMapping};
