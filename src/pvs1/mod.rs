//! The PVS1 decision engine: helper predicates (C7) and the decision tree (C8).

pub mod engine;
pub mod helpers;

pub use engine::{classify, CancellationToken, NeverCancelled, PathLabel, Verdict, VerdictLevel};
