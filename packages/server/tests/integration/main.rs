mod common;
mod deletion;
mod files;
mod upload;
