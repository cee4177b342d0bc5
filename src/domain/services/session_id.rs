use chrono::Utc;

/// The only session name the single-session (CORE) remote edition accepts.
pub const CORE_SESSION_ID: &str = "default";

/// How remote session names are chosen. Selected once at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdStrategy {
    /// Every platform shares one fixed session; creating a new one evicts the previous holder.
    FixedSingleSession(String),
    UniquePerTenant,
}

impl SessionIdStrategy {
    pub fn from_mode(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("CORE") {
            SessionIdStrategy::FixedSingleSession(CORE_SESSION_ID.to_string())
        } else {
            SessionIdStrategy::UniquePerTenant
        }
    }

    pub fn is_single_session(&self) -> bool {
        matches!(self, SessionIdStrategy::FixedSingleSession(_))
    }

    pub fn session_id_for(&self, tenant_id: &str) -> String {
        match self {
            SessionIdStrategy::FixedSingleSession(id) => id.clone(),
            SessionIdStrategy::UniquePerTenant => {
                let prefix: String = tenant_id
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .take(8)
                    .collect();
                let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
                format!("t_{}_{}", prefix.to_ascii_lowercase(), nanos)
            }
        }
    }
}
