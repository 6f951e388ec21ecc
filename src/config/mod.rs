mod settings;

pub use settings::{ApiConfig, PushConfig, Settings};
