//! Remote-attach reproduction harness.
//!
//! Runs the populate → publish → verify workflow against a configured S3-compatible endpoint,
//! either end to end or one step at a time.

pub mod config;
pub mod populate;
pub mod publish;
pub mod reproduce;
pub mod verify;
