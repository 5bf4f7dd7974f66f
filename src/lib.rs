//! `tensorplan` is a graph memory planner for a tensor compiler's graph
//! runtime backend: given a function body over a typed, immutable
//! expression tree, it assigns every tensor a storage id, choosing reuse
//! over fresh allocation wherever the tree's liveness admits it.
//!
//! [`planner::plan`] is the crate's single entry point. Everything else
//! is the machinery it is built from: the expression/type model
//! ([`ir`]), the per-producer storage record ([`token`]), the two-level
//! allocator ([`alloc`]), the compilation-target and external-hook
//! surface ([`target`], [`hooks`]), and the final serialization step
//! ([`serialize`]).

#[macro_use]
extern crate lazy_static;

pub mod alloc;
pub mod error;
pub mod hooks;
pub mod ir;
pub mod planner;
pub mod serialize;
pub mod target;
pub mod token;

pub use error::{Error, ErrorKind, Result};
pub use planner::plan;
pub use serialize::{NodePlan, PlanResult};
