pub mod agent;
pub mod auth;
pub mod platform;
pub mod session;
pub mod tenant;
pub mod user;
