//! Pipeline stages for patient-data extraction.
//!
//! Each submodule implements one pure transformation; the network call in
//! between lives in [`crate::inference`] and the orchestration in
//! [`crate::extract`].
//!
//! ## Data Flow
//!
//! ```text
//! document ──▶ inference ──▶ parse
//! (base64,      (model)      (reply → PatientRecord)
//!  header,
//!  version)
//! ```
//!
//! 1. [`document`]: decode base64, check the `%PDF-` signature, classify
//!    the declared version to pick a prompt
//! 2. [`parse`]: locate the JSON object in the model's prose and coerce
//!    it into the fixed record shape

pub mod document;
pub mod parse;
