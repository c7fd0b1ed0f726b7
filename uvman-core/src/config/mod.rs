//! Persisted user preferences.

mod settings;

pub use settings::Settings;
