use std::time::Duration;

use chrono_tz::Tz;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::model::{listed_devices, DeviceStatus, ListedDevice};

pub const CHARGER_PATH: &str = "/api/charger/status";
pub const MONITOR_PATH: &str = "/api/monitor/status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeviceKind {
    Charger,
    Monitor,
}

impl DeviceKind {
    pub(crate) fn status_path(self) -> &'static str {
        match self {
            DeviceKind::Charger => CHARGER_PATH,
            DeviceKind::Monitor => MONITOR_PATH,
        }
    }

    pub(crate) fn id_param(self) -> &'static str {
        match self {
            DeviceKind::Charger => "chargerId",
            DeviceKind::Monitor => "monitorId",
        }
    }

    /// Key of the device sub-record in a status response.
    pub(crate) fn record_key(self) -> &'static str {
        match self {
            DeviceKind::Charger => "charger",
            DeviceKind::Monitor => "monitor",
        }
    }

    /// Key of the device list in a login response.
    pub(crate) fn list_key(self) -> &'static str {
        match self {
            DeviceKind::Charger => "chargers",
            DeviceKind::Monitor => "monitors",
        }
    }
}

/// The client's four caches: status records fetched per device, and the
/// device lists delivered with each login.
pub(crate) struct DeviceCaches {
    charger_status: TtlCache<String, DeviceStatus>,
    charger_list: TtlCache<String, ListedDevice>,
    monitor_status: TtlCache<String, DeviceStatus>,
    monitor_list: TtlCache<String, ListedDevice>,
    timezone: Tz,
}

impl DeviceCaches {
    pub(crate) fn new(ttl: Duration, timezone: Tz) -> Self {
        Self {
            charger_status: TtlCache::new(ttl),
            charger_list: TtlCache::new(ttl),
            monitor_status: TtlCache::new(ttl),
            monitor_list: TtlCache::new(ttl),
            timezone,
        }
    }

    pub(crate) fn status(&self, kind: DeviceKind) -> &TtlCache<String, DeviceStatus> {
        match kind {
            DeviceKind::Charger => &self.charger_status,
            DeviceKind::Monitor => &self.monitor_status,
        }
    }

    pub(crate) fn status_mut(&mut self, kind: DeviceKind) -> &mut TtlCache<String, DeviceStatus> {
        match kind {
            DeviceKind::Charger => &mut self.charger_status,
            DeviceKind::Monitor => &mut self.monitor_status,
        }
    }

    pub(crate) fn list(&self, kind: DeviceKind) -> &TtlCache<String, ListedDevice> {
        match kind {
            DeviceKind::Charger => &self.charger_list,
            DeviceKind::Monitor => &self.monitor_list,
        }
    }

    fn list_mut(&mut self, kind: DeviceKind) -> &mut TtlCache<String, ListedDevice> {
        match kind {
            DeviceKind::Charger => &mut self.charger_list,
            DeviceKind::Monitor => &mut self.monitor_list,
        }
    }

    /// Store every listed monitor and charger of a login response body.
    pub(crate) fn absorb_login(&mut self, body: &Map<String, Value>) -> Result<()> {
        for kind in [DeviceKind::Monitor, DeviceKind::Charger] {
            let devices = listed_devices(body, kind.list_key(), self.timezone)?;
            debug!(kind = kind.list_key(), count = devices.len(), "caching listed devices");

            let cache = self.list_mut(kind);
            for device in devices {
                cache.insert(device.device_id.clone(), device);
            }
        }
        Ok(())
    }
}
