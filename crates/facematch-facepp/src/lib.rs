//! facematch-facepp — Face++ `compare` API client.
//!
//! Sends both images as `multipart/form-data` and maps the service's
//! answer onto [`facematch_core::Comparison`] / [`facematch_core::CompareError`].

pub mod client;
pub mod config;

pub use client::{ClientError, FacePlusPlus};
pub use config::FacePlusPlusConfig;
