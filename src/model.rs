//! Device records as returned by the service.
//!
//! The service sends loosely shaped JSON. Records keep the fields this crate
//! understands as typed values and carry everything else through in `extra`.
//! Timestamp fields are parsed on construction, so a record never holds a raw
//! date string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub type Timestamp = DateTime<FixedOffset>;

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Parse an ISO-8601 style timestamp.
///
/// Extended and basic forms are accepted, with or without seconds and
/// fractions. Strings with an offset (`Z`, `+hh:mm`, `+hhmm`) keep it. Naive
/// strings, including a bare date, are taken as local time in `tz`.
pub fn parse_timestamp(field: &str, raw: &str, tz: Tz) -> Result<Timestamp> {
    let invalid = || Error::InvalidTimestamp {
        field: field.to_string(),
        value: raw.to_string(),
    };
    let raw_trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(parsed);
    }

    // `%z` does not take a `Z` designator
    let with_offset = match raw_trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+0000"),
        None => raw_trimmed.to_string(),
    };
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&with_offset, fmt).ok())
    {
        return Ok(parsed);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw_trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw_trimmed, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.fixed_offset())
        .ok_or_else(invalid)
}

fn take_timestamp(map: &mut Map<String, Value>, field: &str, tz: Tz) -> Result<Option<Timestamp>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => parse_timestamp(field, &raw, tz).map(Some),
        Some(other) => Err(Error::InvalidTimestamp {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

// Numbers sometimes arrive quoted. Anything else stays in the map untouched.
fn take_number(map: &mut Map<String, Value>, field: &str) -> Option<f64> {
    let value = map.remove(field)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if number.is_none() {
        map.insert(field.to_string(), value);
    }
    number
}

fn take_string(map: &mut Map<String, Value>, field: &str) -> Option<String> {
    let value = map.remove(field)?;
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => {
            map.insert(field.to_string(), other);
            None
        }
    }
}

/// The `monitor` / `charger` sub-record of a status response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceInfo {
    pub fn from_json(mut map: Map<String, Value>, tz: Tz) -> Result<Self> {
        Ok(Self {
            name: take_string(&mut map, "name"),
            created_at: take_timestamp(&mut map, "createdAt", tz)?,
            updated_at: take_timestamp(&mut map, "updatedAt", tz)?,
            extra: map,
        })
    }
}

/// Response of the monitor or charger status endpoint.
///
/// An empty record means the service returned no data for the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub id: Option<String>,
    pub date: Option<Timestamp>,
    pub soc: Option<f64>,
    pub voltage: Option<f64>,
    pub device: Option<DeviceInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceStatus {
    /// Build a status record. `key` names the device sub-record, `monitor` or
    /// `charger`.
    pub fn from_json(mut map: Map<String, Value>, key: &str, tz: Tz) -> Result<Self> {
        let device = match map.remove(key) {
            Some(Value::Object(inner)) => Some(DeviceInfo::from_json(inner, tz)?),
            Some(other) => {
                map.insert(key.to_string(), other);
                None
            }
            None => None,
        };

        Ok(Self {
            id: take_string(&mut map, "id"),
            date: take_timestamp(&mut map, "date", tz)?,
            soc: take_number(&mut map, "soc"),
            voltage: take_number(&mut map, "voltage"),
            device,
            extra: map,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The latest reading, only when date, id, soc and voltage are all present.
    ///
    /// Presence means present as a usable value: a `soc` or `voltage` that is
    /// not numeric is kept in `extra` and counts as missing here, even though
    /// the key exists in the raw record.
    pub fn current(&self) -> Option<Reading> {
        Some(Reading {
            date: self.date?,
            id: self.id.clone()?,
            soc: self.soc?,
            voltage: self.voltage?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub date: Timestamp,
    pub id: String,
    pub soc: f64,
    pub voltage: f64,
}

/// One snapshot of a device's status history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusEntry {
    pub date: Option<Timestamp>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatusEntry {
    pub fn from_json(mut map: Map<String, Value>, tz: Tz) -> Result<Self> {
        Ok(Self {
            date: take_timestamp(&mut map, "date", tz)?,
            fields: map,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A device entry from the login response's `monitors` or `chargers` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedDevice {
    pub device_id: String,
    pub date: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub status_history: Vec<StatusEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListedDevice {
    /// Returns `None` for entries without a `deviceId`.
    pub fn from_json(mut map: Map<String, Value>, tz: Tz) -> Result<Option<Self>> {
        let Some(device_id) = take_string(&mut map, "deviceId") else {
            return Ok(None);
        };

        let status_history = match map.remove("statusHistory") {
            Some(Value::Array(items)) => {
                let total = items.len();
                let entries = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(entry) => Some(StatusEntry::from_json(entry, tz)),
                        _ => None,
                    })
                    .collect::<Result<Vec<_>>>()?;
                if entries.len() < total {
                    debug!(
                        device_id = %device_id,
                        dropped = total - entries.len(),
                        "skipping status history items that are not objects"
                    );
                }
                entries
            }
            _ => Vec::new(),
        };

        Ok(Some(Self {
            device_id,
            date: take_timestamp(&mut map, "date", tz)?,
            created_at: take_timestamp(&mut map, "createdAt", tz)?,
            updated_at: take_timestamp(&mut map, "updatedAt", tz)?,
            status_history,
            extra: map,
        }))
    }
}

/// Every device listed under `key` in a login response body.
pub fn listed_devices(body: &Map<String, Value>, key: &str, tz: Tz) -> Result<Vec<ListedDevice>> {
    let Some(Value::Array(items)) = body.get(key) else {
        return Ok(Vec::new());
    };

    let mut devices = Vec::with_capacity(items.len());
    for item in items {
        if let Value::Object(map) = item {
            if let Some(device) = ListedDevice::from_json(map.clone(), tz)? {
                devices.push(device);
            }
        }
    }
    Ok(devices)
}
