use coldtrack_domain::{DownlinkDisposition, DownlinkSink};
use tracing::{info, warn};

/// Receives commands pushed back from the ingestion endpoint.
///
/// The payload is only borrowed for the callback, so it is copied into an
/// owned buffer before any processing. The copy is reserved fallibly against
/// a fixed budget: if the reservation cannot be made the message is abandoned
/// untouched and left to the transport to redeliver.
pub struct CommandDownlinkHandler {
    max_copy_bytes: usize,
}

impl CommandDownlinkHandler {
    pub fn new(max_copy_bytes: usize) -> Self {
        Self { max_copy_bytes }
    }
}

impl DownlinkSink for CommandDownlinkHandler {
    fn handle(&self, payload: &[u8]) -> DownlinkDisposition {
        if payload.len() > self.max_copy_bytes {
            warn!(
                payload_size = payload.len(),
                budget = self.max_copy_bytes,
                "downlink exceeds copy budget, abandoning"
            );
            return DownlinkDisposition::Abandoned;
        }

        let mut owned = Vec::new();
        if owned.try_reserve_exact(payload.len()).is_err() {
            warn!(
                payload_size = payload.len(),
                "downlink copy reservation failed, abandoning"
            );
            return DownlinkDisposition::Abandoned;
        }
        owned.extend_from_slice(payload);

        // Not every downlink is JSON; log structured commands as such and
        // everything else as text.
        match serde_json::from_slice::<serde_json::Value>(&owned) {
            Ok(command) => info!(%command, "downlink command received"),
            Err(_) => info!(
                content = %String::from_utf8_lossy(&owned),
                "downlink message received"
            ),
        }

        DownlinkDisposition::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_payload_accepted() {
        let handler = CommandDownlinkHandler::new(1024);
        assert_eq!(
            handler.handle(b"{\"command\":\"defrost\"}"),
            DownlinkDisposition::Accepted
        );
    }

    #[test]
    fn test_non_json_payload_still_accepted() {
        let handler = CommandDownlinkHandler::new(1024);
        assert_eq!(handler.handle(b"PING"), DownlinkDisposition::Accepted);
    }

    #[test]
    fn test_non_utf8_payload_accepted() {
        let handler = CommandDownlinkHandler::new(1024);
        assert_eq!(
            handler.handle(&[0xff, 0xfe, 0x00, 0x01]),
            DownlinkDisposition::Accepted
        );
    }

    #[test]
    fn test_copy_budget_exhaustion_abandons() {
        let handler = CommandDownlinkHandler::new(16);
        let oversized = vec![b'x'; 17];
        assert_eq!(handler.handle(&oversized), DownlinkDisposition::Abandoned);
    }

    #[test]
    fn test_payload_at_budget_boundary_accepted() {
        let handler = CommandDownlinkHandler::new(16);
        let exact = vec![b'x'; 16];
        assert_eq!(handler.handle(&exact), DownlinkDisposition::Accepted);
    }
}
