use chrono::FixedOffset;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::handlers::reservations::get_reservation_by_id;
use crate::handlers::slots::format_time_range;
use crate::handlers::{AppContext, HandlerError};
use crate::logging::{log_error, log_info};
use crate::runtime::contract::{require_identifier, DEFAULT_CUSTOMER_NAME};
use crate::runtime::normalizer::{
    date_prefix, resolve_text, FieldPath, DATE_FIELDS, END_FIELDS, NAME_FIELDS, NOTE_FIELDS,
    SLOT_ID_FIELDS, START_FIELDS,
};

const COMPONENT: &str = "reservation_notifier";

const MENU_FIELDS: &[FieldPath] = &[FieldPath::Key("menuId"), FieldPath::Key("menu_id")];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub ok: bool,
    pub id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sends the rendered reservation summary through the configured notifier.
///
/// A delivery failure does not fail the request: it is logged and reported
/// as `ok: false`. The stored record is never modified.
pub fn notify_reservation(
    ctx: &AppContext<'_>,
    id: Option<&str>,
) -> Result<NotifyOutcome, HandlerError> {
    let id = require_identifier(id)?;
    let record = get_reservation_by_id(ctx.store, Some(&id))?.ok_or_else(|| {
        HandlerError::NotFound {
            what: "reservation",
            id: id.clone(),
        }
    })?;

    let message = format_notification_message(&record, &ctx.schedule.offset);
    match ctx.notifier.notify(&message) {
        Ok(()) => {
            log_info(COMPONENT, "notification_sent", json!({ "id": id.clone() }));
            Ok(NotifyOutcome {
                ok: true,
                id,
                message,
                error: None,
            })
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "notification_failed",
                json!({ "id": id.clone(), "error": error.to_string() }),
            );
            Ok(NotifyOutcome {
                ok: false,
                id,
                message,
                error: Some(error.to_string()),
            })
        }
    }
}

/// Multi-line summary of a stored reservation.
///
/// The date comes from the record itself, or the prefix of its start
/// timestamp; it is never recovered from the slot identifier.
pub fn format_notification_message(record: &Value, offset: &FixedOffset) -> String {
    let empty = Map::new();
    let object = record.as_object().unwrap_or(&empty);
    let text = |paths: &[FieldPath]| resolve_text(object, paths).filter(|value| !value.is_empty());

    let start = text(START_FIELDS).unwrap_or_default();
    let end = text(END_FIELDS).unwrap_or_default();

    let name = text(NAME_FIELDS).unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string());
    let date = text(DATE_FIELDS)
        .or_else(|| date_prefix(&start))
        .unwrap_or_else(|| "-".to_string());
    let time = format_time_range(&start, &end, offset).unwrap_or_else(|| {
        if start.is_empty() {
            "-".to_string()
        } else {
            format!("{start}〜{end}")
        }
    });
    let slot = text(SLOT_ID_FIELDS).unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        "New reservation".to_string(),
        format!("Name: {name}"),
        format!("Date: {date}"),
        format!("Time: {time}"),
        format!("Slot: {slot}"),
    ];
    if let Some(menu) = text(MENU_FIELDS) {
        lines.push(format!("Menu: {menu}"));
    }
    if let Some(note) = text(NOTE_FIELDS) {
        lines.push(format!("Note: {note}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::adapters::clock::{FixedClock, SequenceIdGenerator};
    use crate::adapters::kv_store::KvStore;
    use crate::adapters::memory_store::MemoryKvStore;
    use crate::adapters::notifier::{Notifier, NotifyError};
    use crate::runtime::slots::DailySchedule;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().expect("lock").clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) -> Result<(), NotifyError> {
            self.messages.lock().expect("lock").push(message.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _message: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected {
                status: 401,
                body: "invalid token".to_string(),
            })
        }
    }

    fn run<R>(
        store: &dyn KvStore,
        notifier: &dyn Notifier,
        call: impl FnOnce(&AppContext<'_>) -> R,
    ) -> R {
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0)
                .single()
                .expect("valid instant"),
        );
        let ids = SequenceIdGenerator::new("rsv");
        let schedule = DailySchedule::default();
        let ctx = AppContext {
            store,
            notifier,
            clock: &clock,
            ids: &ids,
            schedule: &schedule,
        };
        call(&ctx)
    }

    fn stored_record() -> Value {
        json!({
            "id": "rsv-1",
            "slotId": "S-2025-01-10-2",
            "date": "2025-01-10",
            "start": "2025-01-10T03:00:00.000Z",
            "end": "2025-01-10T04:00:00.000Z",
            "menuId": "cut",
            "source": "web",
            "name": "Aoi",
            "note": "first visit",
            "createdAt": "2025-01-05T00:00:00.000Z",
            "status": "reserved"
        })
    }

    #[test]
    fn renders_local_time_range_and_optional_lines() {
        let offset = DailySchedule::default().offset;
        let message = format_notification_message(&stored_record(), &offset);

        assert_eq!(
            message,
            "New reservation\nName: Aoi\nDate: 2025-01-10\nTime: 12:00〜13:00\nSlot: S-2025-01-10-2\nMenu: cut\nNote: first visit"
        );
    }

    #[test]
    fn renders_sparse_records_with_placeholders() {
        let offset = DailySchedule::default().offset;
        let message = format_notification_message(&json!({"slotId": "walk-in"}), &offset);

        assert_eq!(
            message,
            "New reservation\nName: ゲスト\nDate: -\nTime: -\nSlot: walk-in"
        );
    }

    #[test]
    fn date_falls_back_to_first_ten_characters_of_start() {
        let offset = DailySchedule::default().offset;
        let message = format_notification_message(
            &json!({"slotId": "walk-in", "start": "2025-01-1０ 12:00"}),
            &offset,
        );

        assert!(message.contains("Date: 2025-01-1０\n"));
        assert!(message.contains("Time: 2025-01-1０ 12:00〜\n"));
    }

    #[test]
    fn delivers_message_for_stored_reservation() {
        let store = MemoryKvStore::new();
        store.seed("reservation:rsv-1", &stored_record());
        let notifier = RecordingNotifier::default();

        let outcome = run(&store, &notifier, |ctx| {
            notify_reservation(ctx, Some(" rsv-1 ")).expect("notify should succeed")
        });

        assert!(outcome.ok);
        assert_eq!(outcome.id, "rsv-1");
        assert_eq!(notifier.messages(), vec![outcome.message]);
    }

    #[test]
    fn delivery_failure_is_reported_softly() {
        let store = MemoryKvStore::new();
        store.seed("reservation:rsv-1", &stored_record());

        let outcome = run(&store, &FailingNotifier, |ctx| {
            notify_reservation(ctx, Some("rsv-1")).expect("failure should be soft")
        });

        assert!(!outcome.ok);
        assert!(outcome
            .error
            .as_deref()
            .is_some_and(|error| error.contains("401")));
        assert_eq!(
            store.get_json("reservation:rsv-1").expect("read"),
            Some(stored_record())
        );
    }

    #[test]
    fn missing_id_and_unknown_reservation_are_errors() {
        let store = MemoryKvStore::new();
        let notifier = RecordingNotifier::default();

        let missing = run(&store, &notifier, |ctx| {
            notify_reservation(ctx, Some("  ")).expect_err("blank id")
        });
        let unknown = run(&store, &notifier, |ctx| {
            notify_reservation(ctx, Some("nope")).expect_err("unknown id")
        });

        assert_eq!(missing.status_code(), 400);
        assert_eq!(unknown.status_code(), 404);
        assert!(notifier.messages().is_empty());
    }
}
