pub mod annotations;
pub mod assets;
pub mod files;
pub mod upload;
