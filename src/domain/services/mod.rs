pub mod auth_service;
pub mod platform_reconciler;
pub mod session_id;
pub mod session_state;
