use crate::models::{Reservation, ReservationStatus, Triggers};

use super::{ReservationStore, StoreError};

/// Outcome of an append attempt made inside the store lock.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Created(Reservation),
    SlotTaken,
}

// ── Reads ──

pub fn is_slot_taken<'a>(
    reservations: impl IntoIterator<Item = &'a Reservation>,
    triggers: &Triggers,
    slot: &str,
) -> bool {
    let key = triggers.normalize(slot);
    reservations
        .into_iter()
        .any(|r| triggers.normalize(&r.time) == key)
}

pub fn reserved_keys(reservations: &[Reservation], triggers: &Triggers) -> Vec<String> {
    reservations
        .iter()
        .map(|r| triggers.normalize(&r.time))
        .collect()
}

// ── Writes ──

/// Appends `reservation` unless its slot is already held. The check and the
/// append share one critical section.
pub fn insert_if_free(
    store: &ReservationStore,
    triggers: &Triggers,
    reservation: Reservation,
) -> Result<Insert, StoreError> {
    store.update(
        |doc| {
            if is_slot_taken(doc.reservations(), triggers, &reservation.time) {
                Insert::SlotTaken
            } else {
                doc.push(reservation.clone());
                Insert::Created(reservation)
            }
        },
        |outcome| matches!(outcome, Insert::Created(_)),
    )
}

/// Removes every record held by `user_id` for `time`. Returns how many went.
pub fn delete_reservation(
    store: &ReservationStore,
    triggers: &Triggers,
    user_id: &str,
    time: &str,
) -> Result<usize, StoreError> {
    let key = triggers.normalize(time);
    store.update(
        |doc| {
            let mut removed = 0;
            doc.retain(|r| {
                let hit = r.user_id == user_id && triggers.normalize(&r.time) == key;
                removed += usize::from(hit);
                !hit
            });
            removed
        },
        |removed| *removed > 0,
    )
}

/// Renames every record matching (`old_name`, `time`). Matching is by value,
/// so two records sharing name and slot are both renamed.
pub fn rename_reservations(
    store: &ReservationStore,
    triggers: &Triggers,
    old_name: &str,
    time: &str,
    new_name: &str,
) -> Result<usize, StoreError> {
    let key = triggers.normalize(time);
    store.update(
        |doc| {
            let mut count = 0;
            for r in doc
                .reservations_mut()
                .filter(|r| r.display_name == old_name && triggers.normalize(&r.time) == key)
            {
                r.display_name = new_name.to_string();
                count += 1;
            }
            count
        },
        |count| *count > 0,
    )
}

pub fn update_phone(
    store: &ReservationStore,
    triggers: &Triggers,
    user_id: &str,
    time: &str,
    phone: &str,
) -> Result<usize, StoreError> {
    let key = triggers.normalize(time);
    store.update(
        |doc| {
            let mut count = 0;
            for r in doc
                .reservations_mut()
                .filter(|r| r.user_id == user_id && triggers.normalize(&r.time) == key)
            {
                r.set_phone(phone.trim());
                count += 1;
            }
            count
        },
        |count| *count > 0,
    )
}

pub fn update_status(
    store: &ReservationStore,
    triggers: &Triggers,
    user_id: &str,
    time: &str,
    status: &ReservationStatus,
) -> Result<usize, StoreError> {
    let key = triggers.normalize(time);
    store.update(
        |doc| {
            let mut count = 0;
            for r in doc
                .reservations_mut()
                .filter(|r| r.user_id == user_id && triggers.normalize(&r.time) == key)
            {
                r.set_status(status.clone());
                count += 1;
            }
            count
        },
        |count| *count > 0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(list: &[Reservation]) -> (TempDir, ReservationStore) {
        let dir = TempDir::new().unwrap();
        let store = ReservationStore::open(dir.path().join("reserved.json")).unwrap();
        store.save(list).unwrap();
        (dir, store)
    }

    fn legacy(user_id: &str, name: &str, time: &str) -> Reservation {
        serde_json::from_value(serde_json::json!({
            "userId": user_id,
            "displayName": name,
            "time": time,
        }))
        .unwrap()
    }

    #[test]
    fn test_slot_taken_uses_normalized_key() {
        let t = Triggers::default();
        let list = vec![legacy("U1", "Amy", "我想預約 04/25 13:00")];
        assert!(is_slot_taken(&list, &t, "04/25  13:00"));
        assert!(!is_slot_taken(&list, &t, "04/26 13:00"));
    }

    #[test]
    fn test_insert_if_free() {
        let t = Triggers::default();
        let (_dir, store) = setup(&[legacy("U1", "Amy", "04/25 13:00")]);

        let taken = insert_if_free(&store, &t, Reservation::new("U2", "Bob", "04/25 13:00")).unwrap();
        assert_eq!(taken, Insert::SlotTaken);
        assert_eq!(store.load().unwrap().len(), 1);

        let created = insert_if_free(&store, &t, Reservation::new("U2", "Bob", "04/26 10:00")).unwrap();
        assert!(matches!(created, Insert::Created(_)));
        let list = store.load().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(t.normalize(&list[1].time), "04/26 10:00");
    }

    #[test]
    fn test_delete_only_matching() {
        let t = Triggers::default();
        let (_dir, store) = setup(&[
            legacy("U1", "Amy", "04/25 13:00"),
            legacy("U2", "Bob", "04/25 13:00"),
            legacy("U1", "Amy", "04/26 10:00"),
        ]);
        let removed = delete_reservation(&store, &t, "U1", " 04/25 13:00").unwrap();
        assert_eq!(removed, 1);

        let list = store.load().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], legacy("U2", "Bob", "04/25 13:00"));
        assert_eq!(list[1], legacy("U1", "Amy", "04/26 10:00"));
        // Untouched records keep their exact serialized form.
        let after = std::fs::read_to_string(store.path()).unwrap();
        assert!(!after.contains("\"status\""));
        assert_eq!(after, serde_json::to_string_pretty(&list).unwrap());
    }

    #[test]
    fn test_delete_no_match_leaves_file() {
        let t = Triggers::default();
        let (_dir, store) = setup(&[legacy("U1", "Amy", "04/25 13:00")]);
        std::fs::write(store.path(), r#"[{"userId":"U1","displayName":"Amy","time":"04/25 13:00"}]"#).unwrap();

        assert_eq!(delete_reservation(&store, &t, "U9", "04/25 13:00").unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            r#"[{"userId":"U1","displayName":"Amy","time":"04/25 13:00"}]"#
        );
    }

    #[test]
    fn test_rename_matches_every_duplicate() {
        let t = Triggers::default();
        let (_dir, store) = setup(&[
            legacy("U1", "Amy", "04/25 13:00"),
            legacy("U2", "Amy", "04/25 13:00"),
            legacy("U3", "Amy", "04/26 13:00"),
        ]);

        let renamed = rename_reservations(&store, &t, "Amy", "04/25 13:00", "Amelia").unwrap();
        assert_eq!(renamed, 2);
        let list = store.load().unwrap();
        assert_eq!(list[0].display_name, "Amelia");
        assert_eq!(list[1].display_name, "Amelia");
        assert_eq!(list[2].display_name, "Amy");
    }

    #[test]
    fn test_update_phone_and_status() {
        let t = Triggers::default();
        let (_dir, store) = setup(&[legacy("U1", "Amy", "04/25 13:00")]);

        assert_eq!(update_phone(&store, &t, "U1", "04/25 13:00", " 0912-345-678 ").unwrap(), 1);
        assert_eq!(
            update_status(&store, &t, "U1", "04/25 13:00", &ReservationStatus::Done).unwrap(),
            1
        );

        let list = store.load().unwrap();
        assert_eq!(list[0].phone(), "0912-345-678");
        assert_eq!(list[0].status(), ReservationStatus::Done);
    }
}
