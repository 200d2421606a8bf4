// Hostprov - host provisioning helper
// Library root

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod menu;
pub mod network;
pub mod shell;
pub mod systemd;
pub mod version;

// Test modules (only compiled during tests)
#[cfg(test)]
mod app_tests;
