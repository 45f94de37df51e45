//! Service-calendar selection: which service_id operates at a given instant.

use chrono::{DateTime, Datelike, FixedOffset, Weekday};

use crate::model::ServiceId;

/// Strategy for picking the active service calendar.
///
/// Injected into schedule queries so the index itself carries no
/// agency-specific service ids.
pub trait ServiceCalendar {
    fn service_for(&self, now: &DateTime<FixedOffset>) -> ServiceId;
}

/// Two-service calendar matching the NYC Ferry schedule: one service id on
/// weekdays, another on Saturday and Sunday. Holidays are not modelled.
#[derive(Debug, Clone)]
pub struct WeekdayWeekendCalendar {
    weekday: ServiceId,
    weekend: ServiceId,
}

impl WeekdayWeekendCalendar {
    pub fn new(weekday: ServiceId, weekend: ServiceId) -> Self {
        Self { weekday, weekend }
    }
}

impl Default for WeekdayWeekendCalendar {
    fn default() -> Self {
        Self::new(ServiceId::new("1"), ServiceId::new("2"))
    }
}

impl ServiceCalendar for WeekdayWeekendCalendar {
    fn service_for(&self, now: &DateTime<FixedOffset>) -> ServiceId {
        match now.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend.clone(),
            _ => self.weekday.clone(),
        }
    }
}
