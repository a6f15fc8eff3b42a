//! Station link and provisioning portal.
//!
//! [`WifiAdapter`] serves [`NetworkPort`]: it keeps the monitor joined to
//! the configured network and, when asked from the menu, opens a setup
//! access point where a phone can submit new credentials.
//!
//! The ESP-IDF build drives `esp_idf_svc::wifi`; host builds swap in a
//! [`SimRadio`] so the link can be dropped and portal submissions queued
//! from tests.
//!
//! Link loss is retried from [`WifiAdapter::poll`] with a doubling delay
//! (2 s, 4 s, 8 s ... 60 s).

use core::fmt;
use log::{info, warn};

use crate::app::ports::NetworkPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

const FIRST_RETRY_MS: u64 = 2_000;
const MAX_RETRY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    MissingCredentials,
    BadSsid,
    BadPassphrase,
    AssociationFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "no network configured"),
            Self::BadSsid => write!(f, "SSID must be 1-32 printable ASCII characters"),
            Self::BadPassphrase => write!(f, "passphrase must be empty or 8-64 characters"),
            Self::AssociationFailed => write!(f, "could not join network"),
        }
    }
}

/// Where the station link stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Offline,
    Online,
    /// Waiting until `retry_at_ms` before the next association attempt.
    Retrying { attempt: u32, retry_at_ms: u64 },
}

/// Validated station credentials.  An empty passphrase means an open network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationCredentials {
    ssid: heapless::String<32>,
    passphrase: heapless::String<64>,
}

impl StationCredentials {
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, LinkError> {
        if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(LinkError::BadSsid);
        }
        if !passphrase.is_empty() && passphrase.len() < 8 {
            return Err(LinkError::BadPassphrase);
        }
        Ok(Self {
            ssid: ssid.try_into().map_err(|_| LinkError::BadSsid)?,
            passphrase: passphrase.try_into().map_err(|_| LinkError::BadPassphrase)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

// ── Portal form decoding ──────────────────────────────────────

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Undo `application/x-www-form-urlencoded` escaping.  Malformed `%`
/// escapes are kept literally.
fn form_decode(raw: &str) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut rest = raw.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        match b {
            b'+' => out.push(b' '),
            b'%' => match rest {
                [hi, lo, after @ ..] if hex_digit(*hi).is_some() && hex_digit(*lo).is_some() => {
                    out.push((hex_digit(*hi).unwrap_or(0) << 4) | hex_digit(*lo).unwrap_or(0));
                    rest = after;
                }
                _ => out.push(b'%'),
            },
            _ => out.push(b),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Extract `(ssid, passphrase)` from the portal's `/save?s=..&p=..` query.
/// `None` unless a non-empty `s` is present.
pub fn parse_portal_query(query: &str) -> Option<(String, String)> {
    let field = |name: &str| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| form_decode(v))
    };
    let ssid = field("s").filter(|s| !s.is_empty())?;
    Some((ssid, field("p").unwrap_or_default()))
}

// ── Host radio ────────────────────────────────────────────────

/// Stand-in for the radio on host builds.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimRadio {
    link_up: bool,
    ap_up: bool,
    queued_submission: Option<(String, String)>,
    associations: u32,
}

// ── Adapter ───────────────────────────────────────────────────

pub struct WifiAdapter {
    link: LinkState,
    credentials: Option<StationCredentials>,
    retry_delay_ms: u64,
    ap_name: String,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    radio: SimRadio,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, ap_name: &str) -> Self {
        Self {
            link: LinkState::Offline,
            credentials: None,
            retry_delay_ms: FIRST_RETRY_MS,
            ap_name: ap_name.to_string(),
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ap_name: &str) -> Self {
        Self {
            link: LinkState::Offline,
            credentials: None,
            retry_delay_ms: FIRST_RETRY_MS,
            ap_name: ap_name.to_string(),
            radio: SimRadio::default(),
        }
    }

    /// Adopt the station credentials the driver kept from an earlier
    /// portal run.  Returns `true` if usable ones were found.
    #[cfg(target_os = "espidf")]
    pub fn restore_stored_credentials(&mut self) -> bool {
        use esp_idf_svc::wifi::Configuration;

        let stored = match self.wifi.get_configuration() {
            Ok(Configuration::Client(c) | Configuration::Mixed(c, _)) => c,
            _ => return false,
        };
        match StationCredentials::new(stored.ssid.as_str(), stored.password.as_str()) {
            Ok(creds) => {
                info!("WiFi: using stored network '{}'", creds.ssid());
                self.credentials = Some(creds);
                true
            }
            Err(_) => false,
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn set_credentials(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError> {
        let creds = StationCredentials::new(ssid, passphrase)?;
        info!("WiFi: network set to '{}'", creds.ssid());
        self.credentials = Some(creds);
        Ok(())
    }

    /// Join the configured network now.  Already being online is not an error.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        let Some(creds) = self.credentials.clone() else {
            return Err(LinkError::MissingCredentials);
        };
        if self.link == LinkState::Online && self.platform_link_up() {
            return Ok(());
        }
        info!("WiFi: joining '{}'", creds.ssid());
        match self.platform_associate(&creds) {
            Ok(()) => {
                self.mark_online();
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: join failed ({})", e);
                self.link = LinkState::Retrying { attempt: 0, retry_at_ms: 0 };
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.platform_release();
        self.link = LinkState::Offline;
        info!("WiFi: offline");
    }

    /// Notice link loss and drive retries.  Call once per loop pass.
    pub fn poll(&mut self, now_ms: u64) {
        match self.link {
            LinkState::Online if !self.platform_link_up() => {
                warn!("WiFi: link lost, retrying in {} ms", self.retry_delay_ms);
                self.link = LinkState::Retrying {
                    attempt: 0,
                    retry_at_ms: now_ms + self.retry_delay_ms,
                };
            }
            LinkState::Retrying { attempt, retry_at_ms } if now_ms >= retry_at_ms => {
                let Some(creds) = self.credentials.clone() else {
                    self.link = LinkState::Offline;
                    return;
                };
                info!("WiFi: retry #{}", attempt + 1);
                if self.platform_associate(&creds).is_ok() {
                    self.mark_online();
                } else {
                    self.link = LinkState::Retrying {
                        attempt: attempt + 1,
                        retry_at_ms: now_ms + self.retry_delay_ms,
                    };
                    self.retry_delay_ms = (self.retry_delay_ms * 2).min(MAX_RETRY_MS);
                }
            }
            _ => {}
        }
    }

    fn mark_online(&mut self) {
        self.link = LinkState::Online;
        self.retry_delay_ms = FIRST_RETRY_MS;
        info!("WiFi: online");
    }

    fn adopt_submission(&mut self, ssid: &str, passphrase: &str) -> bool {
        if let Err(e) = self.set_credentials(ssid, passphrase) {
            warn!("WiFi portal: submission rejected ({})", e);
            return false;
        }
        if self.link == LinkState::Online {
            self.disconnect();
        }
        self.connect().is_ok()
    }

    // ── ESP-IDF ───────────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn client_configuration(
        creds: &StationCredentials,
    ) -> Result<esp_idf_svc::wifi::ClientConfiguration, LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration};

        Ok(ClientConfiguration {
            ssid: creds.ssid().try_into().map_err(|_| LinkError::BadSsid)?,
            password: creds.passphrase().try_into().map_err(|_| LinkError::BadPassphrase)?,
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        })
    }

    /// Station side for mode switches: the current network, or an empty
    /// one when none is set.
    #[cfg(target_os = "espidf")]
    fn station_configuration(&self) -> esp_idf_svc::wifi::ClientConfiguration {
        self.credentials
            .as_ref()
            .and_then(|c| Self::client_configuration(c).ok())
            .unwrap_or_default()
    }

    #[cfg(target_os = "espidf")]
    fn platform_associate(&mut self, creds: &StationCredentials) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::Configuration;

        let client = Self::client_configuration(creds)?;
        let wifi = &mut self.wifi;
        wifi.set_configuration(&Configuration::Client(client))
            .and_then(|()| if wifi.is_started()? { Ok(()) } else { wifi.start() })
            .and_then(|()| wifi.connect())
            .and_then(|()| wifi.wait_netif_up())
            .map_err(|e| {
                warn!("WiFi: driver error {:?}", e);
                LinkError::AssociationFailed
            })
    }

    #[cfg(target_os = "espidf")]
    fn platform_release(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Serve the setup form until a submission arrives or `timeout_secs`
    /// pass.  The station side stays configured so a timeout leaves the
    /// old network usable.  The caller tears the AP down with
    /// [`Self::platform_close_portal`].
    #[cfg(target_os = "espidf")]
    fn platform_portal(&mut self, timeout_secs: u32) -> Option<(String, String)> {
        use std::sync::{Arc, Mutex};
        use std::time::{Duration, Instant};

        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpServer};
        use esp_idf_svc::io::Write;
        use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};

        const FORM: &str = "<html><body><h3>Water monitor WiFi</h3>\
            <form action=\"/save\">SSID <input name=\"s\"><br>\
            Password <input name=\"p\" type=\"password\"><br>\
            <input type=\"submit\" value=\"Save\"></form></body></html>";

        let station = self.station_configuration();
        let ap = AccessPointConfiguration {
            ssid: self.ap_name.as_str().try_into().ok()?,
            auth_method: AuthMethod::None,
            ..Default::default()
        };
        if let Err(e) = self
            .wifi
            .set_configuration(&Configuration::Mixed(station, ap))
            .and_then(|()| self.wifi.start())
        {
            warn!("WiFi portal: AP start failed: {:?}", e);
            return None;
        }

        let submitted: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        let mut server = EspHttpServer::new(&HttpConfig::default())
            .map_err(|e| warn!("WiFi portal: HTTP server failed: {:?}", e))
            .ok()?;
        let slot = Arc::clone(&submitted);
        let registered = server
            .fn_handler("/", Method::Get, |req| {
                req.into_ok_response()?.write_all(FORM.as_bytes())
            })
            .and_then(|s| {
                s.fn_handler("/save", Method::Get, move |req| {
                    let query = req.uri().split_once('?').map_or("", |(_, q)| q);
                    let reply: &[u8] = match parse_portal_query(query) {
                        Some(creds) => {
                            if let Ok(mut guard) = slot.lock() {
                                *guard = Some(creds);
                            }
                            b"Saved. Connecting..."
                        }
                        None => b"SSID required",
                    };
                    req.into_ok_response()?.write_all(reply)
                })
            });
        if let Err(e) = registered {
            warn!("WiFi portal: handler registration failed: {:?}", e);
            return None;
        }

        info!("WiFi portal: AP '{}' open for {}s", self.ap_name, timeout_secs);
        let deadline = Instant::now() + Duration::from_secs(u64::from(timeout_secs));
        while Instant::now() < deadline {
            if let Some(creds) = submitted.lock().ok().and_then(|mut g| g.take()) {
                return Some(creds);
            }
            std::thread::sleep(Duration::from_millis(200));
        }
        None
    }

    /// Back to station-only mode, which takes the open setup AP down.
    #[cfg(target_os = "espidf")]
    fn platform_close_portal(&mut self) {
        use esp_idf_svc::wifi::Configuration;

        let station = self.station_configuration();
        match self.wifi.set_configuration(&Configuration::Client(station)) {
            Ok(()) => info!("WiFi portal: AP '{}' closed", self.ap_name),
            Err(e) => warn!("WiFi portal: AP teardown failed: {:?}", e),
        }
    }

    // ── Host ──────────────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_associate(&mut self, creds: &StationCredentials) -> Result<(), LinkError> {
        self.radio.associations += 1;
        self.radio.link_up = true;
        info!("WiFi(sim): joined '{}' (#{})", creds.ssid(), self.radio.associations);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_release(&mut self) {
        self.radio.link_up = false;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.radio.link_up
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_portal(&mut self, timeout_secs: u32) -> Option<(String, String)> {
        info!("WiFi(sim): portal '{}' for {}s", self.ap_name, timeout_secs);
        self.radio.ap_up = true;
        self.radio.queued_submission.take()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_close_portal(&mut self) {
        self.radio.ap_up = false;
    }

    /// Whether the setup AP is currently broadcasting.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_ap_up(&self) -> bool {
        self.radio.ap_up
    }

    /// Queue what the next portal run "receives" from a phone.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_submit_portal(&mut self, ssid: &str, passphrase: &str) {
        self.radio.queued_submission = Some((ssid.to_string(), passphrase.to_string()));
    }

    /// Drop the link as if the access point went out of range.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.radio.link_up = false;
    }
}

impl NetworkPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.link == LinkState::Online && self.platform_link_up()
    }

    fn ssid(&self) -> Option<String> {
        if !self.is_connected() {
            return None;
        }
        self.credentials.as_ref().map(|c| c.ssid().to_string())
    }

    fn start_portal(&mut self, timeout_secs: u32) -> bool {
        let submission = self.platform_portal(timeout_secs);
        self.platform_close_portal();
        if let Some((ssid, passphrase)) = submission {
            return self.adopt_submission(&ssid, &passphrase);
        }
        warn!("WiFi portal: nothing submitted within {}s", timeout_secs);
        if !self.is_connected() && self.credentials.is_some() {
            if let Err(e) = self.connect() {
                warn!("WiFi portal: previous network unavailable ({})", e);
            }
        }
        self.is_connected()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn joined() -> WifiAdapter {
        let mut a = WifiAdapter::new("WaterMonitorSetup");
        a.set_credentials("lab-net", "password1").unwrap();
        a.connect().unwrap();
        a
    }

    #[test]
    fn credential_rules() {
        assert_eq!(StationCredentials::new("", "password1"), Err(LinkError::BadSsid));
        assert_eq!(StationCredentials::new("caf\u{e9}", ""), Err(LinkError::BadSsid));
        assert_eq!(StationCredentials::new(&"x".repeat(33), ""), Err(LinkError::BadSsid));
        assert_eq!(StationCredentials::new("lab", "short"), Err(LinkError::BadPassphrase));
        assert_eq!(StationCredentials::new("lab", &"x".repeat(65)), Err(LinkError::BadPassphrase));
        assert!(StationCredentials::new("Open Cafe", "").unwrap().is_open());
    }

    #[test]
    fn connect_needs_credentials() {
        let mut a = WifiAdapter::new("WaterMonitorSetup");
        assert_eq!(a.connect(), Err(LinkError::MissingCredentials));
        assert_eq!(a.link_state(), LinkState::Offline);
    }

    #[test]
    fn ssid_is_reported_only_while_online() {
        let mut a = joined();
        assert_eq!(a.ssid().as_deref(), Some("lab-net"));
        assert!(a.connect().is_ok());
        a.disconnect();
        assert!(!a.is_connected());
        assert_eq!(a.ssid(), None);
    }

    #[test]
    fn lost_link_is_retried_after_delay() {
        let mut a = joined();
        a.sim_drop_link();
        assert!(!a.is_connected());

        a.poll(1_000);
        assert_eq!(
            a.link_state(),
            LinkState::Retrying { attempt: 0, retry_at_ms: 3_000 }
        );
        a.poll(2_999);
        assert!(!a.is_connected());
        a.poll(3_000);
        assert!(a.is_connected());
    }

    #[test]
    fn portal_submission_replaces_network() {
        let mut a = joined();
        a.sim_submit_portal("Field Station", "password2");
        assert!(a.start_portal(180));
        assert_eq!(a.ssid().as_deref(), Some("Field Station"));
    }

    #[test]
    fn portal_rejects_bad_submission() {
        let mut a = WifiAdapter::new("WaterMonitorSetup");
        a.sim_submit_portal("lab", "short");
        assert!(!a.start_portal(180));
    }

    #[test]
    fn portal_timeout_falls_back_to_previous_network() {
        let mut a = joined();
        a.sim_drop_link();
        a.poll(0);
        assert!(a.start_portal(1));
        assert_eq!(a.ssid().as_deref(), Some("lab-net"));

        let mut fresh = WifiAdapter::new("WaterMonitorSetup");
        assert!(!fresh.start_portal(1));
    }

    #[test]
    fn setup_ap_is_closed_after_every_portal_run() {
        let mut fresh = WifiAdapter::new("WaterMonitorSetup");
        assert!(!fresh.start_portal(1));
        assert!(!fresh.sim_ap_up());

        let mut a = joined();
        a.sim_submit_portal("Field Station", "password2");
        assert!(a.start_portal(180));
        assert!(!a.sim_ap_up());

        a.sim_submit_portal("lab", "short");
        assert!(!a.start_portal(180));
        assert!(!a.sim_ap_up());
    }

    #[test]
    fn portal_query_decoding() {
        assert_eq!(
            parse_portal_query("s=Lab+Net&p=p%40ss%21word"),
            Some(("Lab Net".to_string(), "p@ss!word".to_string()))
        );
        assert_eq!(parse_portal_query("p=only"), None);
        assert_eq!(parse_portal_query("s=&p=x"), None);
        assert_eq!(
            parse_portal_query("s=Open"),
            Some(("Open".to_string(), String::new()))
        );
        assert_eq!(
            parse_portal_query("s=100%&p=%4"),
            Some(("100%".to_string(), "%4".to_string()))
        );
    }
}
