pub mod appointment;
pub mod config;
pub mod health;
pub mod whoami;
