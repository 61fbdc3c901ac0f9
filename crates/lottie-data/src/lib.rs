//! Serde model of the Lottie JSON scene format.
//!
//! The types mirror the on-disk field names (`ty`, `nm`, `ks`, ...) so that a
//! document round-trips through `serde_json` without a translation layer.

pub mod model;
