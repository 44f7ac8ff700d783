//! Background and skin detection
//!
//! Both detectors produce an exclusion [`crate::Mask`] over the resized
//! image. Pixels excluded by either mask never reach clustering.

pub mod background;
pub mod filter;
pub mod skin;

pub use background::{BackgroundMasker, EdgePolicy};
pub use skin::SkinMasker;
