//! Serde schema for Lottie (Bodymovin) JSON documents.
//!
//! The types here mirror the exported JSON closely and stay lenient about the
//! many shapes a single field can take in the wild (`[50]` vs `50`, three vs
//! four color channels). Semantic validation happens in `lottie-core`.

pub mod model;
