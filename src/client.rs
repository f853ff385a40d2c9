use std::cell::RefCell;

use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::device::{Charger, Monitor};
use crate::error::Result;
use crate::model::{DeviceStatus, StatusEntry};
use crate::request::{HttpTransport, Request, Response, Transport};
use crate::session::{Credentials, LOGIN_PATH, Session};
use crate::state::{DeviceCaches, DeviceKind};

/// Client for the Battery Tender service.
///
/// Not meant to be shared between threads: caches and the token sit in
/// `RefCell`s so device views can borrow the client immutably.
pub struct BatteryTender<T = HttpTransport> {
    config: Config,
    session: Session<T>,
    caches: RefCell<DeviceCaches>,
}

impl BatteryTender<HttpTransport> {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_transport(config, HttpTransport::new()?)
    }
}

impl<T: Transport> BatteryTender<T> {
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        let credentials = Credentials {
            email: config.email.clone(),
            password: config.password.clone(),
        };
        let session = Session::new(transport, credentials, &config.base_url)?;
        let caches = RefCell::new(DeviceCaches::new(config.cache_ttl, config.timezone));

        Ok(Self {
            config,
            session,
            caches,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    fn send(&self, request: Request) -> Result<Response> {
        let mut on_login = |body: &Map<String, Value>| self.caches.borrow_mut().absorb_login(body);
        self.session.send(request, &mut on_login)
    }

    /// Call the service and return its JSON body.
    ///
    /// Any final status other than 200 yields an empty map. Only a rejected
    /// login and transport failures are errors.
    pub fn request(&self, method: Method, path: &str, params: &[(&str, &str)]) -> Result<Map<String, Value>> {
        let request = Request::build(method, &self.config.base_url, path, params)?;
        let response = self.send(request)?;

        if response.status != StatusCode::OK {
            debug!(status = response.status.as_u16(), path, "no data");
            return Ok(Map::new());
        }

        response.json_object()
    }

    /// Reload the device lists.
    ///
    /// Posts to the login endpoint without credentials, which answers 401 and
    /// so runs the full login cycle.
    pub fn refresh_cache(&self) -> Result<()> {
        let body = self.request(Method::POST, LOGIN_PATH, &[])?;
        if !body.is_empty() {
            self.caches.borrow_mut().absorb_login(&body)?;
        }
        Ok(())
    }

    fn status(&self, kind: DeviceKind, device_id: &str) -> Result<DeviceStatus> {
        let cached = self.caches.borrow().status(kind).get(device_id).cloned();
        if let Some(status) = cached {
            return Ok(status);
        }

        let raw = self.request(Method::GET, kind.status_path(), &[(kind.id_param(), device_id)])?;
        let status = DeviceStatus::from_json(raw, kind.record_key(), self.config.timezone)?;

        self.caches
            .borrow_mut()
            .status_mut(kind)
            .insert(device_id.to_owned(), status.clone());
        Ok(status)
    }

    pub fn monitor(&self, device_id: &str) -> Result<DeviceStatus> {
        self.status(DeviceKind::Monitor, device_id)
    }

    pub fn charger(&self, device_id: &str) -> Result<DeviceStatus> {
        self.status(DeviceKind::Charger, device_id)
    }

    fn listed_ids(&self, kind: DeviceKind) -> Result<Vec<String>> {
        let empty = self.caches.borrow().list(kind).is_empty();
        if empty {
            self.refresh_cache()?;
        }
        Ok(self.caches.borrow().list(kind).keys())
    }

    pub fn monitors(&self) -> Result<Vec<Monitor<'_, T>>> {
        let ids = self.listed_ids(DeviceKind::Monitor)?;
        Ok(ids.into_iter().map(|id| Monitor::new(id, self)).collect())
    }

    pub fn chargers(&self) -> Result<Vec<Charger<'_, T>>> {
        let ids = self.listed_ids(DeviceKind::Charger)?;
        Ok(ids.into_iter().map(|id| Charger::new(id, self)).collect())
    }

    fn history(&self, kind: DeviceKind, device_id: &str) -> Result<Vec<StatusEntry>> {
        let known = self.caches.borrow().list(kind).contains_key(device_id);
        if !known {
            self.refresh_cache()?;
        }

        Ok(self
            .caches
            .borrow()
            .list(kind)
            .get(device_id)
            .map(|device| device.status_history.clone())
            .unwrap_or_default())
    }

    pub fn monitor_history(&self, device_id: &str) -> Result<Vec<StatusEntry>> {
        self.history(DeviceKind::Monitor, device_id)
    }

    pub fn charger_history(&self, device_id: &str) -> Result<Vec<StatusEntry>> {
        self.history(DeviceKind::Charger, device_id)
    }
}
