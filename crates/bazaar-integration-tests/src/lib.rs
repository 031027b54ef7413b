//! Integration tests spanning the bazaar crates.
//!
//! No public API; everything lives under `tests/`.

#![forbid(unsafe_code)]
