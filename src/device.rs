//! Views over a single device.
//!
//! A view holds only the device id and the client. Every accessor goes back
//! to the client, so values follow the caches as they expire and refill.

use std::fmt;

use crate::client::BatteryTender;
use crate::error::Result;
use crate::model::{DeviceInfo, DeviceStatus, Reading, StatusEntry, Timestamp};
use crate::request::{HttpTransport, Transport};

pub struct Monitor<'a, T = HttpTransport> {
    device_id: String,
    client: &'a BatteryTender<T>,
}

impl<'a, T: Transport> Monitor<'a, T> {
    pub fn new(device_id: impl Into<String>, client: &'a BatteryTender<T>) -> Self {
        Self {
            device_id: device_id.into(),
            client,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn status(&self) -> Result<DeviceStatus> {
        self.client.monitor(&self.device_id)
    }

    fn info(&self) -> Result<Option<DeviceInfo>> {
        Ok(self.status()?.device)
    }

    /// Date, id, state of charge and voltage, or `None` unless all four are
    /// reported.
    pub fn current(&self) -> Result<Option<Reading>> {
        Ok(self.status()?.current())
    }

    pub fn created(&self) -> Result<Option<Timestamp>> {
        Ok(self.info()?.and_then(|info| info.created_at))
    }

    pub fn updated(&self) -> Result<Option<Timestamp>> {
        Ok(self.info()?.and_then(|info| info.updated_at))
    }

    pub fn name(&self) -> Result<Option<String>> {
        Ok(self.info()?.and_then(|info| info.name))
    }

    pub fn history(&self) -> Result<Vec<StatusEntry>> {
        self.client.monitor_history(&self.device_id)
    }

    pub fn date(&self) -> Result<Option<Timestamp>> {
        Ok(self.status()?.date)
    }

    /// State of charge in percent.
    pub fn soc(&self) -> Result<Option<f64>> {
        Ok(self.status()?.soc)
    }

    pub fn voltage(&self) -> Result<Option<f64>> {
        Ok(self.status()?.voltage)
    }
}

pub struct Charger<'a, T = HttpTransport> {
    device_id: String,
    client: &'a BatteryTender<T>,
}

impl<'a, T: Transport> Charger<'a, T> {
    pub fn new(device_id: impl Into<String>, client: &'a BatteryTender<T>) -> Self {
        Self {
            device_id: device_id.into(),
            client,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn status(&self) -> Result<DeviceStatus> {
        self.client.charger(&self.device_id)
    }

    pub fn history(&self) -> Result<Vec<StatusEntry>> {
        self.client.charger_history(&self.device_id)
    }
}

impl<T> fmt::Display for Monitor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Monitor: {}", self.device_id)
    }
}

impl<T> fmt::Debug for Monitor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor").field("device_id", &self.device_id).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Charger<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charger: {}", self.device_id)
    }
}

impl<T> fmt::Debug for Charger<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Charger").field("device_id", &self.device_id).finish_non_exhaustive()
    }
}
