//! Edge case tests for bang-eval
