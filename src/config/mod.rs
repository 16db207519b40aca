mod settings;

pub use settings::{LoggingConfig, PreviewConfig, RendererConfig, ServerConfig, Settings};
