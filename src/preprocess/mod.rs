//! Image preprocessing
//!
//! Crops the subject area out of product photographs and brings every image
//! to a common working size before masking.

pub mod resize;

pub use resize::Resizer;
