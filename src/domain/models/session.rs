use serde::Deserialize;
use std::fmt;

/// Session status as reported by the remote session service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RawSessionStatus {
    Stopped,
    Starting,
    ScanQrCode,
    Working,
    Failed,
    Other(String),
}

impl RawSessionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STOPPED" => Self::Stopped,
            "STARTING" => Self::Starting,
            "SCAN_QR_CODE" => Self::ScanQrCode,
            "WORKING" => Self::Working,
            "FAILED" => Self::Failed,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Starting => "STARTING",
            Self::ScanQrCode => "SCAN_QR_CODE",
            Self::Working => "WORKING",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }

    /// The session is booting or running; a repeated start is a no-op.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::ScanQrCode | Self::Working)
    }

    pub fn needs_restart(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// A QR code can only be rendered once the browser reached the scan screen.
    pub fn qr_may_be_ready(&self) -> bool {
        !matches!(self, Self::Stopped | Self::Starting | Self::Failed)
    }
}

impl From<String> for RawSessionStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl fmt::Display for RawSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub name: String,
    pub status: RawSessionStatus,
}

/// Result of one status read against the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Reported(RawSessionStatus),
    /// The remote service answered and does not know the session.
    Missing,
    /// The remote service could not be asked.
    Unreachable(String),
}

impl PollOutcome {
    pub fn raw_label(&self) -> &str {
        match self {
            Self::Reported(raw) => raw.as_str(),
            Self::Missing => "STOPPED",
            Self::Unreachable(_) => "UNREACHABLE",
        }
    }

    pub fn needs_restart(&self) -> bool {
        match self {
            Self::Reported(raw) => raw.needs_restart(),
            Self::Missing => true,
            Self::Unreachable(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    Requested,
    Failed(String),
}

/// What a QR poll produced. Not being ready yet is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrOutcome {
    Ready(String),
    NotReady(String),
}
