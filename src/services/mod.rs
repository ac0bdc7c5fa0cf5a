// Core services
pub mod billing;
pub mod menu;
pub mod orders;
pub mod tables;
pub mod tax;

// Startup helpers
pub mod seed;
