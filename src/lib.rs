pub mod bootstrap;
pub mod config;
pub mod core;
#[cfg(windows)]
pub mod elevation;
pub mod hotkeys;
#[cfg(windows)]
pub mod scm;
#[cfg(windows)]
pub mod ui;
pub mod utils;
