//! HTTP relay transport.
//!
//! Implements [`RelayTransport`] with one bodiless GET per call.  The
//! relay module on the other end answers `/on` and `/off`; its response
//! body is ignored.
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`,
//!   a fresh connection per request with the caller's timeout.
//! - **all other targets**: records the URL and answers from a scripted
//!   status so host tests can drive both outcomes.

use log::{debug, warn};

use crate::app::ports::{RelayTransport, RequestFault};

pub struct HttpRelayTransport {
    #[cfg(not(target_os = "espidf"))]
    sim_status: Result<u16, RequestFault>,
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<String>,
}

impl Default for HttpRelayTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRelayTransport {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_status: Ok(200),
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_get(&mut self, url: &str, timeout_ms: u32) -> Result<u16, RequestFault> {
        use core::time::Duration;
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let config = Configuration {
            timeout: Some(Duration::from_millis(u64::from(timeout_ms))),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|e| {
            warn!("relay: client init failed: {:?}", e);
            RequestFault::Io
        })?;
        conn.initiate_request(Method::Get, url, &[])
            .map_err(|_| RequestFault::Timeout)?;
        conn.initiate_response().map_err(|_| RequestFault::Timeout)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_get(&mut self, url: &str, _timeout_ms: u32) -> Result<u16, RequestFault> {
        self.sim_sent.push(url.to_string());
        self.sim_status
    }

    /// Simulation: what every following request returns.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_respond(&mut self, outcome: Result<u16, RequestFault>) {
        self.sim_status = outcome;
    }

    /// Simulation: URLs requested so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[String] {
        &self.sim_sent
    }
}

impl RelayTransport for HttpRelayTransport {
    fn get(&mut self, url: &str, timeout_ms: u32) -> Result<u16, RequestFault> {
        let outcome = self.platform_get(url, timeout_ms);
        match outcome {
            Ok(status) => debug!("relay: GET {} -> {}", url, status),
            Err(fault) => warn!("relay: GET {} failed ({:?})", url, fault),
        }
        outcome
    }
}
