//! Time source and gateway timestamp format.
//!
//! The gateway reads every timestamp as `yyyyMMddHHmmss` wall time in
//! UTC+07:00, independent of where the merchant server runs.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::{Result, VnpayError};

/// Offset of gateway wall time from UTC, in seconds.
const GATEWAY_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Format of `vnp_CreateDate`, `vnp_ExpireDate`, `vnp_PayDate`.
pub const GATEWAY_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of the current time, injected so request building is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn gateway_offset() -> FixedOffset {
    FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS).expect("UTC+7 is a valid offset")
}

/// Render an instant in gateway wall time.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vnpay_lib::clock::gateway_timestamp;
///
/// let instant = Utc.with_ymd_and_hms(2024, 1, 31, 20, 5, 9).unwrap();
/// assert_eq!(gateway_timestamp(instant), "20240201030509");
/// ```
pub fn gateway_timestamp(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&gateway_offset())
        .format(GATEWAY_TIME_FORMAT)
        .to_string()
}

/// Parse a gateway wall-time timestamp back into UTC.
pub fn parse_gateway_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, GATEWAY_TIME_FORMAT)
        .map_err(|e| VnpayError::validation("timestamp", format!("'{}': {}", raw, e)))?;
    gateway_offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| VnpayError::validation("timestamp", format!("'{}' is ambiguous", raw)))
}
