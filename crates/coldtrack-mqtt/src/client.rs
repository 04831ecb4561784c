use coldtrack_domain::{
    ConnectionDescriptor, DownlinkDisposition, DownlinkSink, IngestTransport, PumpSummary,
    SendAck, SendReceipt, TransportError, TransportOption, TransportResult,
};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const MQTT_PORT: u16 = 1883;
const MQTT_TLS_PORT: u16 = 8883;

/// Protocol default for the downlink polling floor; the worker normally
/// overrides it with a much shorter `MinimumPollingTime` option.
const DEFAULT_MINIMUM_POLLING: Duration = Duration::from_secs(25 * 60);

/// Connection-level knobs that are not part of the option surface.
#[derive(Debug, Clone)]
pub struct MqttTuning {
    pub keep_alive: Duration,
    /// Upper bound on how long one `pump_work` call drives the event loop.
    pub pump_budget: Duration,
    pub channel_capacity: usize,
}

impl Default for MqttTuning {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(30),
            pump_budget: Duration::from_millis(250),
            channel_capacity: 100,
        }
    }
}

struct Session {
    client: AsyncClient,
    event_loop: EventLoop,
}

/// MQTT-backed connection to the ingestion endpoint.
///
/// The network session opens lazily on the first send or pump; a malformed
/// descriptor fails `connect` and is fatal to the caller. Options apply only
/// before the session opens. Uplinks go out QoS 1 on the device's events
/// topic; downlink publishes arrive on the devicebound filter and are handed
/// to the registered sink from inside `pump_work`.
pub struct MqttIngestClient {
    descriptor: ConnectionDescriptor,
    tuning: MqttTuning,
    trusted_certs: Option<Vec<u8>>,
    product_info: Option<String>,
    minimum_polling: Duration,
    sink: Option<Arc<dyn DownlinkSink>>,
    session: Option<Session>,
    // QoS 1 acks come back in publish order; front of the queue is the
    // oldest unacknowledged uplink.
    pending_acks: VecDeque<SendAck>,
    last_poll: Option<Instant>,
    disconnected: bool,
}

impl std::fmt::Debug for MqttIngestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttIngestClient")
            .field("descriptor", &self.descriptor)
            .field("tuning", &self.tuning)
            .field("trusted_certs", &self.trusted_certs.as_ref().map(|c| c.len()))
            .field("product_info", &self.product_info)
            .field("minimum_polling", &self.minimum_polling)
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .field("session", &self.session.as_ref().map(|_| "<session>"))
            .field("pending_acks", &self.pending_acks.len())
            .field("last_poll", &self.last_poll)
            .field("disconnected", &self.disconnected)
            .finish()
    }
}

impl MqttIngestClient {
    /// Create the transport handle from an opaque connection string.
    pub fn connect(connection_string: &str, tuning: MqttTuning) -> TransportResult<Self> {
        let descriptor = ConnectionDescriptor::parse(connection_string)?;
        info!(
            host = %descriptor.host,
            device_id = %descriptor.device_id,
            "transport handle created"
        );
        Ok(Self {
            descriptor,
            tuning,
            trusted_certs: None,
            product_info: None,
            minimum_polling: DEFAULT_MINIMUM_POLLING,
            sink: None,
            session: None,
            pending_acks: VecDeque::new(),
            last_poll: None,
            disconnected: false,
        })
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    async fn ensure_session(&mut self) -> TransportResult<()> {
        if self.disconnected {
            return Err(TransportError::Setup(
                "transport already disconnected".into(),
            ));
        }
        if self.session.is_some() {
            return Ok(());
        }

        let port = if self.trusted_certs.is_some() {
            MQTT_TLS_PORT
        } else {
            MQTT_PORT
        };
        let mut options = MqttOptions::new(
            self.descriptor.device_id.clone(),
            self.descriptor.host.clone(),
            port,
        );
        let mut username = format!("{}/{}", self.descriptor.host, self.descriptor.device_id);
        if let Some(tag) = &self.product_info {
            username = format!("{username}/?DeviceClientType={tag}");
        }
        options.set_credentials(username, self.descriptor.shared_access_key.clone());
        options.set_keep_alive(self.tuning.keep_alive);
        options.set_clean_session(true);
        // The sink's disposition decides whether a downlink is acknowledged.
        options.set_manual_acks(true);
        if let Some(ca) = &self.trusted_certs {
            options.set_transport(Transport::Tls(TlsConfiguration::Simple {
                ca: ca.clone(),
                alpn: None,
                client_auth: None,
            }));
        }

        let (client, event_loop) = AsyncClient::new(options, self.tuning.channel_capacity);
        client
            .subscribe(
                downlink_topic_filter(&self.descriptor.device_id),
                QoS::AtLeastOnce,
            )
            .await
            .map_err(|e| TransportError::Setup(format!("downlink subscribe: {e}")))?;

        debug!(device_id = %self.descriptor.device_id, port, "transport session prepared");
        self.session = Some(Session { client, event_loop });
        Ok(())
    }
}

#[async_trait::async_trait]
impl IngestTransport for MqttIngestClient {
    fn set_option(&mut self, option: TransportOption) -> TransportResult<()> {
        if self.session.is_some() {
            return Err(TransportError::InvalidOption {
                name: option.name(),
                reason: "session already open".into(),
            });
        }
        match option {
            TransportOption::TrustedCerts(pem) => {
                if !String::from_utf8_lossy(&pem).contains("-----BEGIN") {
                    return Err(TransportError::InvalidOption {
                        name: "TrustedCerts",
                        reason: "not a PEM bundle".into(),
                    });
                }
                self.trusted_certs = Some(pem);
            }
            TransportOption::ProductInfo(tag) => {
                if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '/') {
                    return Err(TransportError::InvalidOption {
                        name: "product_info",
                        reason: format!("invalid tag: {tag:?}"),
                    });
                }
                self.product_info = Some(tag);
            }
            TransportOption::MinimumPollingTime(interval) => {
                if interval.is_zero() {
                    return Err(TransportError::InvalidOption {
                        name: "MinimumPollingTime",
                        reason: "interval must be non-zero".into(),
                    });
                }
                self.minimum_polling = interval;
            }
        }
        Ok(())
    }

    fn register_downlink(&mut self, sink: Arc<dyn DownlinkSink>) {
        self.sink = Some(sink);
    }

    async fn send_async(&mut self, payload: Vec<u8>) -> TransportResult<SendReceipt> {
        self.ensure_session().await?;
        let Some(session) = self.session.as_mut() else {
            return Err(TransportError::Send("session unavailable".into()));
        };
        session
            .client
            .publish(
                uplink_topic(&self.descriptor.device_id),
                QoS::AtLeastOnce,
                false,
                payload,
            )
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let (ack, receipt) = SendReceipt::pending();
        self.pending_acks.push_back(ack);
        Ok(receipt)
    }

    async fn pump_work(&mut self) -> TransportResult<PumpSummary> {
        let mut summary = PumpSummary::default();

        // Nothing outstanding and still inside the polling floor: stay off
        // the network.
        if self.pending_acks.is_empty() {
            if let Some(last) = self.last_poll {
                if last.elapsed() < self.minimum_polling {
                    debug!("pump skipped, inside minimum polling window");
                    return Ok(summary);
                }
            }
        }

        self.ensure_session().await?;
        self.last_poll = Some(Instant::now());
        let deadline = Instant::now() + self.tuning.pump_budget;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Some(session) = self.session.as_mut() else {
                break;
            };
            let event = match tokio::time::timeout(remaining, session.event_loop.poll()).await {
                Err(_) => break,
                Ok(event) => event,
            };
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    summary.downlinks += 1;
                    let disposition =
                        dispatch_downlink(self.sink.as_deref(), &publish.topic, &publish.payload);
                    match disposition {
                        DownlinkDisposition::Accepted | DownlinkDisposition::Rejected => {
                            if let Err(e) = session.client.ack(&publish).await {
                                warn!(error = %e, "downlink acknowledgment failed");
                            }
                        }
                        // Left unacknowledged so the endpoint may redeliver.
                        DownlinkDisposition::Abandoned => {}
                    }
                }
                Ok(Event::Incoming(Packet::PubAck(_))) => {
                    if let Some(ack) = self.pending_acks.pop_front() {
                        ack.resolve();
                        summary.acked += 1;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(device_id = %self.descriptor.device_id, "connected to ingestion endpoint");
                    // Session resumed from scratch; the devicebound
                    // subscription must be re-issued.
                    if let Err(e) = session.client.try_subscribe(
                        downlink_topic_filter(&self.descriptor.device_id),
                        QoS::AtLeastOnce,
                    ) {
                        warn!(error = %e, "downlink re-subscribe failed");
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    debug!("downlink subscription acknowledged");
                }
                Ok(Event::Incoming(Packet::PingResp)) => {
                    debug!("keepalive healthy");
                }
                Ok(_) => {}
                Err(e) => {
                    // Unacknowledged sends will never resolve on this session.
                    self.pending_acks.clear();
                    return Err(TransportError::Pump(e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.disconnected = true;
        self.pending_acks.clear();
        if let Some(session) = self.session.take() {
            if let Err(e) = session.client.disconnect().await {
                debug!(error = %e, "disconnect request not deliverable");
            }
            info!(device_id = %self.descriptor.device_id, "transport session released");
        }
        Ok(())
    }
}

fn uplink_topic(device_id: &str) -> String {
    format!("devices/{device_id}/messages/events/")
}

fn downlink_topic_filter(device_id: &str) -> String {
    format!("devices/{device_id}/messages/devicebound/#")
}

/// Hand one inbound publish to the registered sink.
fn dispatch_downlink(
    sink: Option<&dyn DownlinkSink>,
    topic: &str,
    payload: &[u8],
) -> DownlinkDisposition {
    let Some(sink) = sink else {
        warn!(topic, "downlink received with no handler registered");
        return DownlinkDisposition::Abandoned;
    };
    let disposition = sink.handle(payload);
    debug!(topic, payload_size = payload.len(), ?disposition, "downlink dispatched");
    disposition
}
