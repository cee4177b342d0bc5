pub mod agent;
pub mod auth;
pub mod health;
pub mod platform;
pub mod tenant;
