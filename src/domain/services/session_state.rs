use crate::domain::models::platform::PlatformStatus;
use crate::domain::models::session::{PollOutcome, RawSessionStatus};

/// Folds the remote vocabulary into the four states the console shows.
/// STARTING shares the "please wait" view with SCAN_QR_CODE; anything unknown counts as stopped.
pub fn map_session_status(raw: &RawSessionStatus) -> PlatformStatus {
    match raw {
        RawSessionStatus::Working => PlatformStatus::Working,
        RawSessionStatus::ScanQrCode | RawSessionStatus::Starting => PlatformStatus::Scanning,
        RawSessionStatus::Failed => PlatformStatus::Failed,
        RawSessionStatus::Stopped | RawSessionStatus::Other(_) => PlatformStatus::Stopped,
    }
}

pub fn map_poll_outcome(outcome: &PollOutcome) -> PlatformStatus {
    match outcome {
        PollOutcome::Reported(raw) => map_session_status(raw),
        PollOutcome::Missing | PollOutcome::Unreachable(_) => PlatformStatus::Stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_raw_status(raw: &str) -> PlatformStatus {
        map_session_status(&RawSessionStatus::parse(raw))
    }

    #[test]
    fn test_mapping_table() {
        assert_eq!(map_raw_status("WORKING"), PlatformStatus::Working);
        assert_eq!(map_raw_status("SCAN_QR_CODE"), PlatformStatus::Scanning);
        assert_eq!(map_raw_status("STARTING"), PlatformStatus::Scanning);
        assert_eq!(map_raw_status("FAILED"), PlatformStatus::Failed);
        assert_eq!(map_raw_status("STOPPED"), PlatformStatus::Stopped);
    }

    #[test]
    fn test_mapping_is_total() {
        for raw in ["", "unknown", "PAIRING", "💥", "working ", "SCAN-QR-CODE"] {
            let mapped = map_raw_status(raw);
            let expected = if raw.trim().eq_ignore_ascii_case("WORKING") {
                PlatformStatus::Working
            } else {
                PlatformStatus::Stopped
            };
            assert_eq!(mapped, expected, "raw status {:?}", raw);
        }
    }

    #[test]
    fn test_poll_outcomes_without_report_are_stopped() {
        assert_eq!(map_poll_outcome(&PollOutcome::Missing), PlatformStatus::Stopped);
        assert_eq!(map_poll_outcome(&PollOutcome::Unreachable("refused".into())), PlatformStatus::Stopped);
        assert_eq!(map_poll_outcome(&PollOutcome::Reported(RawSessionStatus::Working)), PlatformStatus::Working);
    }
}
