//! Numeric and memory runtime for compiled kforth programs.
//!
//! Generated code calls the primitives exported from [`abi`]; Rust callers (tests, tools)
//! construct a [`Runtime`] over any reader/writer pair and call its methods directly.
//!
//! Every value crossing the boundary is an `i32`. Floats travel as IEEE-754 bit patterns
//! ([`fbits`]); the trigonometry family in [`fixed`] uses integers scaled by 10000.

#![allow(clippy::missing_safety_doc)]

pub mod abi;
pub mod config;
pub mod error;
pub mod fbits;
pub mod fixed;
pub mod heap;
pub mod input;
pub mod mem;
pub mod output;
pub mod prims;
pub mod runtime;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use prims::{lookup, Arg, Primitive, PrimitiveSpec, ValueKind, PRIMITIVES};
pub use runtime::{Runtime, StdRuntime};
