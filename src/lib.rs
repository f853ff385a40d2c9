//! Client for the Battery Tender connected power service.
//!
//! Logs in with an email and password, reads monitor and charger status and
//! history, and keeps responses in memory for a configurable time (600 seconds
//! by default) to avoid repeated calls.
//!
//! Authentication is token based. The first request that comes back 401
//! triggers a login; the token from the login response is added to every later
//! request, and the device lists carried by that login response fill the
//! client's caches.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> batterytender::Result<()> {
//! let config = batterytender::Config::new("me@example.com", "secret")?;
//! let client = batterytender::BatteryTender::new(config)?;
//! for monitor in client.monitors()? {
//!     println!("{monitor}: {:?}% {:?}V", monitor.soc()?, monitor.voltage()?);
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod config;
mod device;
mod error;
mod model;
mod request;
mod session;
mod state;

pub use cache::TtlCache;
pub use client::BatteryTender;
pub use config::{Config, DEFAULT_CACHE_TTL, HOST};
pub use device::{Charger, Monitor};
pub use error::{Error, Result};
pub use model::{DeviceInfo, DeviceStatus, ListedDevice, Reading, StatusEntry, Timestamp, parse_timestamp};
pub use request::{HttpTransport, Request, Response, TOKEN_PARAM, Transport};
pub use session::{Credentials, LOGIN_PATH, LoginHandler, Session};
pub use state::{CHARGER_PATH, MONITOR_PATH};

pub use chrono_tz::Tz;
pub use reqwest::{Method, StatusCode, Url};
