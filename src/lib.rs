pub mod audit;
pub mod config;
pub mod messages;
pub mod motor;
