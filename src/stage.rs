//! Capability interface shared by the pipeline components
//!
//! Each component is configured once from its own config struct and then
//! processes many inputs without mutation, so one instance can be shared
//! across threads.

use crate::error::Result;

/// Construction of a component from its configuration, validated eagerly
pub trait Configure: Sized {
    type Config;

    fn configure(config: Self::Config) -> Result<Self>;
}

/// One step of the extraction pipeline
pub trait Stage<In: ?Sized> {
    type Output;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn process(&self, input: &In) -> Result<Self::Output>;
}
