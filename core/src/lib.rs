//! # Probing Engine
//!
//! Candidate generation, concurrent TCP/HTTP probing and the
//! annotate → filter → rank pipeline behind a benchmark run.

pub mod annotator;
pub mod benchmark;
pub mod expander;
pub mod locations;
pub mod network;
pub mod ranker;
pub mod scanner;
