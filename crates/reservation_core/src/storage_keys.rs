#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Reservation,
    SlotList,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Reservation => "reservation",
            Self::SlotList => "slots",
        }
    }

    pub fn key_prefix(self) -> String {
        format!("{}:", self.as_str())
    }
}

pub fn reservation_key(id: &str) -> String {
    format!("{}{id}", RecordKind::Reservation.key_prefix())
}

pub fn slots_key(date: &str) -> String {
    format!("{}{date}", RecordKind::SlotList.key_prefix())
}

/// Joins the store-wide prefix and a logical key into an object key.
pub fn object_key(base_prefix: &str, key: &str) -> String {
    let trimmed = base_prefix.trim_matches('/');
    if trimmed.is_empty() {
        key.to_string()
    } else {
        format!("{trimmed}/{key}")
    }
}

/// Inverse of [`object_key`]; `None` for objects outside the prefix.
pub fn logical_key<'a>(base_prefix: &str, object_key: &'a str) -> Option<&'a str> {
    let trimmed = base_prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Some(object_key);
    }
    object_key.strip_prefix(trimmed)?.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_reservation_key() {
        assert_eq!(reservation_key("abc-123"), "reservation:abc-123");
    }

    #[test]
    fn builds_date_scoped_slot_key() {
        assert_eq!(slots_key("2026-02-14"), "slots:2026-02-14");
    }

    #[test]
    fn object_key_trims_prefix_slashes() {
        assert_eq!(
            object_key("/bookings/kv/", "reservation:1"),
            "bookings/kv/reservation:1"
        );
        assert_eq!(object_key("", "reservation:1"), "reservation:1");
    }

    #[test]
    fn logical_key_strips_store_prefix() {
        assert_eq!(
            logical_key("bookings/kv", "bookings/kv/slots:2026-02-14"),
            Some("slots:2026-02-14")
        );
        assert_eq!(logical_key("bookings/kv", "other/slots:2026-02-14"), None);
        assert_eq!(logical_key("bookings/kv", "bookings/kvx/slots"), None);
        assert_eq!(logical_key("", "slots:x"), Some("slots:x"));
    }
}
