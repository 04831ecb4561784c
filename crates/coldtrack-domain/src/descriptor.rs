use crate::error::{TransportError, TransportResult};

/// Endpoint descriptor for the ingestion service, carried as an opaque
/// `HostName=...;DeviceId=...;SharedAccessKey=...` string in configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub device_id: String,
    pub shared_access_key: String,
}

impl ConnectionDescriptor {
    /// Parse a `key=value;key=value` connection string.
    ///
    /// All three fields are required. The access key is treated as opaque and
    /// may itself contain `=`, so only the first `=` of each pair splits.
    pub fn parse(connection_string: &str) -> TransportResult<Self> {
        let mut host = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for pair in connection_string.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                TransportError::InvalidDescriptor(format!("malformed segment: {pair}"))
            })?;
            match key {
                "HostName" => host = Some(value.to_string()),
                "DeviceId" => device_id = Some(value.to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                other => {
                    return Err(TransportError::InvalidDescriptor(format!(
                        "unknown segment: {other}"
                    )))
                }
            }
        }

        let host =
            host.ok_or_else(|| TransportError::InvalidDescriptor("missing HostName".into()))?;
        let device_id =
            device_id.ok_or_else(|| TransportError::InvalidDescriptor("missing DeviceId".into()))?;
        let shared_access_key = shared_access_key
            .ok_or_else(|| TransportError::InvalidDescriptor("missing SharedAccessKey".into()))?;

        if host.is_empty() || device_id.is_empty() || shared_access_key.is_empty() {
            return Err(TransportError::InvalidDescriptor(
                "empty descriptor field".into(),
            ));
        }

        Ok(Self {
            host,
            device_id,
            shared_access_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let descriptor = ConnectionDescriptor::parse(
            "HostName=hub.example.net;DeviceId=TEST-DEVICE-1;SharedAccessKey=abc123=",
        )
        .unwrap();
        assert_eq!(descriptor.host, "hub.example.net");
        assert_eq!(descriptor.device_id, "TEST-DEVICE-1");
        assert_eq!(descriptor.shared_access_key, "abc123=");
    }

    #[test]
    fn test_parse_key_keeps_embedded_equals() {
        let descriptor = ConnectionDescriptor::parse(
            "HostName=h;DeviceId=d;SharedAccessKey=a=b=c",
        )
        .unwrap();
        assert_eq!(descriptor.shared_access_key, "a=b=c");
    }

    #[test]
    fn test_parse_missing_device_id() {
        let err = ConnectionDescriptor::parse("HostName=h;SharedAccessKey=k").unwrap_err();
        assert!(err.to_string().contains("DeviceId"));
    }

    #[test]
    fn test_parse_unknown_segment() {
        let err =
            ConnectionDescriptor::parse("HostName=h;DeviceId=d;SharedAccessKey=k;GatewayHostName=g")
                .unwrap_err();
        assert!(err.to_string().contains("unknown segment"));
    }

    #[test]
    fn test_parse_malformed_segment() {
        assert!(ConnectionDescriptor::parse("HostName").is_err());
    }

    #[test]
    fn test_parse_trailing_semicolon_tolerated() {
        assert!(ConnectionDescriptor::parse("HostName=h;DeviceId=d;SharedAccessKey=k;").is_ok());
    }
}
