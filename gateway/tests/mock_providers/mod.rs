//! Mock upstream servers for integration tests

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod funasr_mock;

pub use funasr_mock::{FunAsrMock, FunAsrScript, Received};
