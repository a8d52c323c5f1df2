// Library interface for newspulse modules
// This allows tests and other binaries to import modules

pub mod cache;
pub mod model;
pub mod newsapi;
pub mod sentiment;
pub mod server;
