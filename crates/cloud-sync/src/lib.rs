//! Cloud Synchronization Module
//!
//! Delivers drowsiness notifications to the fleet backend:
//! - JSON payload with the drowsy instant and last known coordinates
//! - Best-effort POST with a request timeout, no retries

use chrono::{DateTime, Local};
use position::GpsCoords;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Cloud sync error types
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid endpoint {url}: {reason}")]
    Endpoint { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server rejected notification with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Timestamp layout of `drowsyInstant` (local time, microseconds)
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Notification delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Send notifications at all
    pub enabled: bool,
    /// Statistics endpoint receiving the POST
    pub endpoint: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:3000/api/v1/statistics".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Payload sent once per alarm rising edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "drowsyInstant")]
    pub drowsy_instant: String,
    #[serde(rename = "gpsCoords")]
    pub coordinates: GpsCoords,
}

impl NotificationEvent {
    pub fn new(instant: DateTime<Local>, coordinates: GpsCoords) -> Self {
        Self {
            drowsy_instant: instant.format(INSTANT_FORMAT).to_string(),
            coordinates,
        }
    }

    /// Event stamped with the current local time
    pub fn now(coordinates: GpsCoords) -> Self {
        Self::new(Local::now(), coordinates)
    }

    pub fn to_json(&self) -> Result<String, CloudError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// HTTP notification client
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl Notifier {
    /// Build a client for `config.endpoint`; fails on an unusable URL
    pub fn new(config: &CloudConfig) -> Result<Self, CloudError> {
        let endpoint = reqwest::Url::parse(&config.endpoint).map_err(|e| CloudError::Endpoint {
            url: config.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CloudError::Endpoint {
                url: config.endpoint.clone(),
                reason: format!("unsupported scheme {}", endpoint.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Notifications go to {}", endpoint);
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// POST the event; returns the response body on a 2xx status
    pub async fn send(&self, event: &NotificationEvent) -> Result<String, CloudError> {
        debug!("Sending notification {:?}", event);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CloudError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one HTTP request, answer it, and return the raw request
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    if request.len() >= pos + 4 + content_length(&text[..pos]) {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (addr, task)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn config_for(addr: SocketAddr) -> CloudConfig {
        CloudConfig {
            endpoint: format!("http://{}/api/v1/statistics", addr),
            ..Default::default()
        }
    }

    #[test]
    fn test_payload_shape() {
        let instant = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let event = NotificationEvent::new(
            instant,
            GpsCoords {
                lat: Some(0.5),
                long: Some(0.25),
            },
        );

        assert_eq!(event.drowsy_instant, "2024-03-09T14:05:07.000000");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"drowsyInstant":"2024-03-09T14:05:07.000000","gpsCoords":{"lat":0.5,"long":0.25}}"#
        );
    }

    #[test]
    fn test_unset_coordinates_are_null() {
        let event = NotificationEvent::now(GpsCoords::unset());
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert!(json["gpsCoords"]["lat"].is_null());
        assert!(json["gpsCoords"]["long"].is_null());
        // YYYY-MM-DDTHH:MM:SS.ffffff
        assert_eq!(event.drowsy_instant.len(), 26);
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        for url in ["not a url", "ftp://example.com/stats"] {
            let config = CloudConfig {
                endpoint: url.to_string(),
                ..Default::default()
            };
            assert!(matches!(Notifier::new(&config), Err(CloudError::Endpoint { .. })));
        }
    }

    #[tokio::test]
    async fn test_send_posts_json() {
        let (addr, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let notifier = Notifier::new(&config_for(addr)).unwrap();
        let event = NotificationEvent::now(GpsCoords {
            lat: Some(1.0),
            long: Some(2.0),
        });

        let body = notifier.send(&event).await.unwrap();
        assert_eq!(body, r#"{"ok":true}"#);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/statistics"));
        assert!(request.contains(&event.to_json().unwrap()));
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let (addr, server) = serve_once("500 Internal Server Error", "boom").await;
        let notifier = Notifier::new(&config_for(addr)).unwrap();

        let err = notifier.send(&NotificationEvent::now(GpsCoords::unset())).await.unwrap_err();
        assert!(matches!(err, CloudError::Rejected { status: 500, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = Notifier::new(&config_for(addr)).unwrap();
        let err = notifier.send(&NotificationEvent::now(GpsCoords::unset())).await.unwrap_err();
        assert!(matches!(err, CloudError::Request(_)));
    }
}
