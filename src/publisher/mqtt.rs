//! # MQTT destination writer.
//!
//! One [`MqttWriter`] per destination: an `rumqttc` client plus the task that drives its
//! event loop. Messages go to `<topic_prefix><destination>/<key>` with QoS 1, so the identity
//! key is the last topic level (the broker-side routing/dedup key).
//!
//! ## Lifecycle
//! ```text
//! connect() ─► AsyncClient::new ─► spawn(event loop: poll until Disconnect or stop)
//! send()    ─► client.publish(topic, AtLeastOnce, payload)
//! close()   ─► client.disconnect() ─► wait loop (bounded) ─► stop token fallback
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{PublishError, RuntimeError};
use crate::publisher::writer::DestinationWriter;

/// How long `close` waits for the event loop to flush the disconnect.
const CLOSE_WAIT: Duration = Duration::from_secs(2);

/// Pause after an event loop error before polling again.
const RECONNECT_PAUSE: Duration = Duration::from_millis(250);

/// Broker connection settings shared by every destination writer.
#[derive(Clone, Debug)]
pub struct MqttSettings {
    /// Broker addresses (`host:port`). Only the first entry is dialed.
    pub brokers: Vec<String>,
    /// Prefix for per-destination client ids.
    pub client_id_prefix: String,
    /// Prepended verbatim to every topic.
    pub topic_prefix: String,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// Capacity of the client request channel.
    pub request_capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:1883".to_string()],
            client_id_prefix: "adsynth".to_string(),
            topic_prefix: String::new(),
            keep_alive: Duration::from_secs(30),
            request_capacity: 64,
        }
    }
}

impl MqttSettings {
    /// Host and port of the broker to dial.
    pub fn broker(&self) -> Result<(String, u16), RuntimeError> {
        let addr = self
            .brokers
            .first()
            .ok_or_else(|| RuntimeError::invalid("no broker address configured"))?;
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| RuntimeError::invalid(format!("broker `{addr}` is not host:port")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| RuntimeError::invalid(format!("broker `{addr}` port: {e}")))?;
        if host.is_empty() {
            return Err(RuntimeError::invalid(format!("broker `{addr}` has no host")));
        }
        Ok((host.to_string(), port))
    }

    /// Configured addresses after the first, which are never dialed.
    pub fn ignored_brokers(&self) -> &[String] {
        self.brokers.get(1..).unwrap_or(&[])
    }
}

/// Destination writer publishing to an MQTT broker.
pub struct MqttWriter {
    destination: String,
    topic_prefix: String,
    client: AsyncClient,
    event_loop: Mutex<Option<JoinHandle<()>>>,
    stop: CancellationToken,
    closed: AtomicBool,
}

impl MqttWriter {
    /// Creates the client for `destination` and spawns its event loop.
    ///
    /// Must be called inside a tokio runtime. The connection itself is established lazily
    /// by the event loop; failures show up as logged poll errors and failed sends.
    pub fn connect(destination: &str, settings: &MqttSettings) -> Result<Self, RuntimeError> {
        let (host, port) = settings.broker()?;
        let ignored = settings.ignored_brokers();
        if !ignored.is_empty() {
            warn!(destination, dialed = %host, ?ignored, "only the first broker is dialed");
        }
        let client_id = format!(
            "{}-{}-{}",
            settings.client_id_prefix,
            destination,
            std::process::id()
        );
        let mut opts = MqttOptions::new(client_id, host, port);
        opts.set_keep_alive(settings.keep_alive);

        let (client, mut event_loop) = AsyncClient::new(opts, settings.request_capacity.max(1));
        let stop = CancellationToken::new();
        let cancel = stop.clone();
        let name = destination.to_string();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(destination = %name, "mqtt loop stopped");
                        break;
                    }
                    ev = event_loop.poll() => match ev {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                            debug!(destination = %name, "mqtt disconnected");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(destination = %name, error = %e, "mqtt poll error");
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(RECONNECT_PAUSE) => {}
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            destination: destination.to_string(),
            topic_prefix: settings.topic_prefix.clone(),
            client,
            event_loop: Mutex::new(Some(handle)),
            stop,
            closed: AtomicBool::new(false),
        })
    }

    fn topic_for(&self, key: &[u8]) -> String {
        topic(&self.topic_prefix, &self.destination, key)
    }
}

fn topic(prefix: &str, destination: &str, key: &[u8]) -> String {
    format!("{prefix}{destination}/{}", String::from_utf8_lossy(key))
}

#[async_trait]
impl DestinationWriter for MqttWriter {
    async fn send(&self, key: &[u8], value: Vec<u8>) -> Result<(), PublishError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError::Closed {
                destination: self.destination.clone(),
            });
        }
        self.client
            .publish(self.topic_for(key), QoS::AtLeastOnce, false, value)
            .await
            .map_err(|e| PublishError::transport(&self.destination, e))
    }

    async fn close(&self) -> Result<(), PublishError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let res = self
            .client
            .disconnect()
            .await
            .map_err(|e| PublishError::transport(&self.destination, e));

        if let Some(mut handle) = self.event_loop.lock().await.take() {
            if tokio::time::timeout(CLOSE_WAIT, &mut handle).await.is_err() {
                self.stop.cancel();
                let _ = handle.await;
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_parses_first_address() {
        let s = MqttSettings {
            brokers: vec!["broker-a:29092".into(), "broker-b:1883".into()],
            ..MqttSettings::default()
        };
        assert_eq!(s.broker().unwrap(), ("broker-a".to_string(), 29092));
    }

    #[test]
    fn broker_rejects_malformed_addresses() {
        for bad in ["", "no-port", ":1883", "host:notaport"] {
            let s = MqttSettings {
                brokers: if bad.is_empty() { vec![] } else { vec![bad.into()] },
                ..MqttSettings::default()
            };
            assert!(
                matches!(s.broker(), Err(RuntimeError::InvalidConfig { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn brokers_after_the_first_are_reported_as_ignored() {
        let s = MqttSettings {
            brokers: vec!["a:1883".into(), "b:1883".into(), "c:1883".into()],
            ..MqttSettings::default()
        };
        assert_eq!(s.broker().unwrap(), ("a".to_string(), 1883));
        assert_eq!(s.ignored_brokers(), ["b:1883", "c:1883"]);

        assert!(MqttSettings::default().ignored_brokers().is_empty());
        let none = MqttSettings {
            brokers: vec![],
            ..MqttSettings::default()
        };
        assert!(none.ignored_brokers().is_empty());
    }

    #[test]
    fn topic_ends_with_identity_key() {
        assert_eq!(
            topic("synthetic/", "clicks", b"click-Ab12"),
            "synthetic/clicks/click-Ab12"
        );
    }
}
