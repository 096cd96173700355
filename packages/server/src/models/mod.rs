pub mod annotation;
pub mod asset;
