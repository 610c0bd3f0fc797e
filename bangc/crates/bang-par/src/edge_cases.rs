//! Edge case tests for bang-par
