//! Configuration module.
//!
//! Resolution policy, alias naming and aggregate collision handling.

mod settings;

pub use settings::{
    AggregateSettings, AliasSettings, ResolutionSettings, Settings, SettingsError,
};
