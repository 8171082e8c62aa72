//! Record builders shared by the unit tests in this crate.

use chrono::{DateTime, NaiveDate, TimeZone as _, Utc};
use uuid::Uuid;

use crate::{
  attendance::{Attendance, AttendanceStatus},
  event::Event,
  message::{Message, MessageType, Service},
};

pub fn message(service: Service, kind: MessageType) -> Message {
  let at = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
  Message {
    id:             Uuid::new_v4(),
    user_id:        Uuid::nil(),
    service,
    message_type:   kind,
    recipient_type: None,
    external_id:    None,
    thread_id:      None,
    subject:        None,
    body:           None,
    from_address:   None,
    to_addresses:   Vec::new(),
    cc_addresses:   Vec::new(),
    bcc_addresses:  Vec::new(),
    is_read:        false,
    is_starred:     false,
    is_spam:        false,
    is_trash:       false,
    attachments:    Vec::new(),
    received_at:    None,
    created_at:     at,
    updated_at:     at,
    deleted_at:     None,
  }
}

pub fn attendance(date: &str, minutes: Option<i64>, status: AttendanceStatus) -> Attendance {
  let work_date: NaiveDate = date.parse().unwrap();
  let at = work_date.and_hms_opt(9, 0, 0).unwrap().and_utc();
  Attendance {
    id: Uuid::new_v4(),
    user_id: Uuid::nil(),
    work_date,
    clock_in: Some(at),
    clock_out: None,
    work_minutes: minutes,
    status,
    note: None,
    created_at: at,
    updated_at: at,
  }
}

pub fn event(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Event {
  Event {
    id: Uuid::new_v4(),
    user_id: Uuid::nil(),
    title: "Sync".into(),
    description: None,
    start_at,
    end_at,
    is_all_day: false,
    color: "#3B82F6".into(),
    recurrence: None,
    created_at: start_at,
    updated_at: start_at,
    deleted_at: None,
  }
}
