//! Integration test crate for the generational heap workspace.
//!
//! The tests live under `tests/`; this library exists only so the crate can
//! be a workspace member.
