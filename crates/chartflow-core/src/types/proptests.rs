//! Property-based tests for time keys and the merged table.
