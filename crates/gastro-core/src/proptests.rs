//! Property-based tests for the occupancy estimator and points arithmetic.
