//! Cloud datastore sink (Firebase Realtime Database REST).
//!
//! Implements [`TelemetrySink`]: each record is serialised with
//! `serde_json` and POSTed to `{database_url}{path}.json?auth={token}`,
//! which appends it under a server-generated key.
//!
//! The sink is ready once a database URL is configured.  Network
//! readiness is checked by the caller through `NetworkPort`.

use log::{debug, warn};

use crate::app::ports::TelemetrySink;
use crate::config::CloudConfig;
use crate::error::PublishError;
use crate::telemetry::TelemetryRecord;

pub struct CloudSink {
    database_url: String,
    auth_token: String,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    timeout_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_status: Result<u16, PublishError>,
    #[cfg(not(target_os = "espidf"))]
    sim_pushed: Vec<(String, String)>,
}

impl CloudSink {
    pub fn new(cloud: &CloudConfig, timeout_ms: u32) -> Self {
        Self {
            database_url: cloud.database_url.trim_end_matches('/').to_string(),
            auth_token: cloud.auth_token.clone(),
            timeout_ms,
            #[cfg(not(target_os = "espidf"))]
            sim_status: Ok(200),
            #[cfg(not(target_os = "espidf"))]
            sim_pushed: Vec::new(),
        }
    }

    /// Full REST endpoint for `path`.
    pub fn endpoint(&self, path: &str) -> String {
        let mut url = format!("{}{}.json", self.database_url, path);
        if !self.auth_token.is_empty() {
            url.push_str("?auth=");
            url.push_str(&self.auth_token);
        }
        url
    }

    #[cfg(target_os = "espidf")]
    fn platform_post(&mut self, url: &str, body: &[u8]) -> Result<u16, PublishError> {
        use core::time::Duration;
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::Write;

        let config = Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|_| PublishError::NotReady)?;
        let len = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", len.as_str()),
        ];
        conn.initiate_request(Method::Post, url, &headers)
            .map_err(|_| PublishError::TimedOut)?;
        conn.write_all(body).map_err(|_| PublishError::TimedOut)?;
        conn.initiate_response().map_err(|_| PublishError::TimedOut)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(&mut self, url: &str, body: &[u8]) -> Result<u16, PublishError> {
        let status = self.sim_status?;
        self.sim_pushed
            .push((url.to_string(), String::from_utf8_lossy(body).into_owned()));
        Ok(status)
    }

    /// Simulation: outcome of every following push.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_respond(&mut self, outcome: Result<u16, PublishError>) {
        self.sim_status = outcome;
    }

    /// Simulation: `(url, json body)` of every accepted POST.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_pushed(&self) -> &[(String, String)] {
        &self.sim_pushed
    }
}

impl TelemetrySink for CloudSink {
    fn is_ready(&self) -> bool {
        !self.database_url.is_empty()
    }

    fn push(&mut self, path: &str, record: &TelemetryRecord) -> Result<(), PublishError> {
        if !self.is_ready() {
            return Err(PublishError::NotReady);
        }
        let body = serde_json::to_vec(record).map_err(|_| PublishError::Encode)?;
        let url = self.endpoint(path);
        let status = self.platform_post(&url, &body)?;
        if (200..300).contains(&status) {
            debug!("cloud: pushed {} bytes to {}", body.len(), path);
            Ok(())
        } else {
            warn!("cloud: push to {} rejected with HTTP {}", path, status);
            Err(PublishError::Rejected(status))
        }
    }
}
