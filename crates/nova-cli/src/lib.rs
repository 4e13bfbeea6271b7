//! Library target for the `nova` binary.
//!
//! `cargo test -p nova-cli --lib` runs the unit tests in `main.rs` without
//! building the integration suite, so the binary root is compiled here as a
//! module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
