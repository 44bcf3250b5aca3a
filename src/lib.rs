pub mod config;
pub mod describe;
pub mod document;
pub mod error;
pub mod mapfile;
pub mod session;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod state;
