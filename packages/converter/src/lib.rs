pub mod config;
pub mod engine;
pub mod error;
pub mod glb;
pub mod reference;

pub use config::EngineConfig;
pub use engine::{ConversionEngine, ConvertedModel, DerivativeFormat};
pub use error::ConversionError;
pub use reference::ReferenceEngine;
