//! Operator-facing output

pub mod console;
