//! Sending window — prevents dispatch outside a campaign's configured
//! local-time window.
//!
//! The window is a set of allowed weekdays plus a half-open `[start, end)`
//! hour range, evaluated in the campaign's local time via a fixed UTC
//! offset. The engine applies it once per campaign sweep since every
//! enrollment in a campaign shares one window.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use coldreach_core::types::{Campaign, SendingDay};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendingWindow {
    pub utc_offset_minutes: i32,
    pub days: Vec<SendingDay>,
    /// Local hour (inclusive) from which sending is allowed.
    pub start_hour: u32,
    /// Local hour (exclusive) until which sending is allowed.
    pub end_hour: u32,
}

impl SendingWindow {
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            utc_offset_minutes: campaign.utc_offset_minutes,
            days: campaign.sending_days.clone(),
            start_hour: campaign.sending_start_hour,
            end_hour: campaign.sending_end_hour,
        }
    }

    /// Whether sending is allowed at the given instant.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now + Duration::minutes(self.utc_offset_minutes as i64);
        let day = SendingDay::from(local.weekday());
        if !self.days.contains(&day) {
            return false;
        }
        let hour = local.hour();
        hour >= self.start_hour && hour < self.end_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coldreach_core::types::business_days;

    fn window() -> SendingWindow {
        SendingWindow {
            utc_offset_minutes: 0,
            days: business_days(),
            start_hour: 9,
            end_hour: 17,
        }
    }

    // 2024-01-02 is a Tuesday.
    fn tuesday_at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_open_within_hours_on_allowed_day() {
        assert!(window().is_open(tuesday_at(9)));
        assert!(window().is_open(tuesday_at(16)));
    }

    #[test]
    fn test_end_hour_exclusive() {
        assert!(!window().is_open(tuesday_at(17)));
    }

    #[test]
    fn test_closed_before_start() {
        assert!(!window().is_open(tuesday_at(8)));
    }

    #[test]
    fn test_closed_on_disallowed_day() {
        let mut w = window();
        w.days = vec![SendingDay::Monday];
        // Tuesday is not in the allowed set, regardless of hour.
        assert!(!w.is_open(tuesday_at(10)));
    }

    #[test]
    fn test_utc_offset_shifts_local_day() {
        let mut w = window();
        w.utc_offset_minutes = -300; // UTC-5
        // 13:30 UTC is 08:30 local, before the window opens.
        assert!(!w.is_open(tuesday_at(13)));
        // 15:30 UTC is 10:30 local.
        assert!(w.is_open(tuesday_at(15)));
    }

    #[test]
    fn test_offset_can_cross_midnight() {
        let mut w = window();
        w.days = vec![SendingDay::Wednesday];
        w.utc_offset_minutes = 600; // UTC+10
        // Tuesday 22:30 UTC is Wednesday 08:30 local — right day, too early.
        assert!(!w.is_open(tuesday_at(22)));
        let tuesday_2330 = Utc.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap();
        // Wednesday 09:30 local.
        assert!(w.is_open(tuesday_2330));
    }
}
