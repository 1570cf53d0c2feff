use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::models::{Reservation, SlotGroup, SlotTemplate, Triggers};
use crate::store::queries;

/// Parses a group's date header. `MM/DD` headers are placed in `today`'s year.
pub fn parse_group_date(header: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = header.split_whitespace().next()?;

    for fmt in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(token, fmt) {
            return Some(date);
        }
    }

    let (month, day) = token.split_once('/')?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(today.year(), month, day)
}

/// Prunes the slot menu for presentation: groups dated before `today` or with
/// an unreadable date are dropped, and every button whose slot is already
/// reserved is removed. The result keeps the template's shape.
pub fn filter_template(
    template: &SlotTemplate,
    reservations: &[Reservation],
    triggers: &Triggers,
    today: NaiveDate,
) -> SlotTemplate {
    let reserved: HashSet<String> = queries::reserved_keys(reservations, triggers)
        .into_iter()
        .collect();

    let groups = template
        .groups
        .iter()
        .filter(|group| match parse_group_date(&group.date, today) {
            Some(date) => date >= today,
            None => {
                tracing::debug!(date = %group.date, "skipping slot group with unreadable date");
                false
            }
        })
        .map(|group| SlotGroup {
            date: group.date.clone(),
            title: group.title.clone(),
            buttons: group
                .buttons
                .iter()
                .filter(|b| !reserved.contains(&triggers.normalize(b.slot_label())))
                .cloned()
                .collect(),
        })
        .collect();

    SlotTemplate {
        alt_text: template.alt_text.clone(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotButton;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn button(slot: &str) -> SlotButton {
        SlotButton {
            label: slot.split_whitespace().last().unwrap_or(slot).to_string(),
            slot: Some(slot.to_string()),
        }
    }

    fn group(date: &str, slots: &[&str]) -> SlotGroup {
        SlotGroup {
            date: date.to_string(),
            title: None,
            buttons: slots.iter().map(|s| button(s)).collect(),
        }
    }

    fn template() -> SlotTemplate {
        SlotTemplate {
            alt_text: "pick".to_string(),
            groups: vec![
                group("04/24", &["04/24 13:00"]),
                group("04/25", &["04/25 13:00", "04/25 14:00"]),
                group("04/26", &["04/26 13:00", "04/26 14:00"]),
            ],
        }
    }

    fn booked(time: &str) -> Reservation {
        Reservation::new("U1", "Amy", time)
    }

    fn labels(t: &SlotTemplate) -> Vec<String> {
        t.groups
            .iter()
            .flat_map(|g| g.buttons.iter().map(|b| b.slot_label().to_string()))
            .collect()
    }

    #[test]
    fn test_parse_group_date_formats() {
        let today = day("2025-04-25");
        assert_eq!(parse_group_date("04/26", today), Some(day("2025-04-26")));
        assert_eq!(parse_group_date("4/6 (Sun)", today), Some(day("2025-04-06")));
        assert_eq!(parse_group_date("2026/01/02", today), Some(day("2026-01-02")));
        assert_eq!(parse_group_date("2026-01-02", today), Some(day("2026-01-02")));
    }

    #[test]
    fn test_parse_group_date_rejects_garbage() {
        let today = day("2025-04-25");
        assert_eq!(parse_group_date("", today), None);
        assert_eq!(parse_group_date("Friday", today), None);
        assert_eq!(parse_group_date("13/40", today), None);
        assert_eq!(parse_group_date("02/30", today), None);
    }

    #[test]
    fn test_drops_past_groups_keeps_today() {
        let out = filter_template(&template(), &[], &Triggers::default(), day("2025-04-25"));
        let dates: Vec<_> = out.groups.iter().map(|g| g.date.as_str()).collect();
        assert_eq!(dates, vec!["04/25", "04/26"]);
        assert_eq!(out.alt_text, "pick");
    }

    #[test]
    fn test_drops_unparseable_groups() {
        let mut t = template();
        t.groups.push(group("someday", &["someday 10:00"]));
        let out = filter_template(&t, &[], &Triggers::default(), day("2025-04-01"));
        assert_eq!(out.groups.len(), 3);
        assert!(out.groups.iter().all(|g| g.date != "someday"));
    }

    #[test]
    fn test_removes_reserved_buttons() {
        let reservations = vec![booked("04/25 13:00"), booked("我想預約 04/26 14:00")];
        let out = filter_template(
            &template(),
            &reservations,
            &Triggers::default(),
            day("2025-04-25"),
        );
        assert_eq!(labels(&out), vec!["04/25 14:00", "04/26 13:00"]);
    }

    #[test]
    fn test_same_clock_time_on_other_day_is_kept() {
        let reservations = vec![booked("04/25 13:00")];
        let out = filter_template(
            &template(),
            &reservations,
            &Triggers::default(),
            day("2025-04-25"),
        );
        assert!(labels(&out).contains(&"04/26 13:00".to_string()));
    }

    #[test]
    fn test_fully_booked_group_keeps_its_place() {
        let reservations = vec![booked("04/25 13:00"), booked("04/25 14:00")];
        let out = filter_template(
            &template(),
            &reservations,
            &Triggers::default(),
            day("2025-04-25"),
        );
        assert_eq!(out.groups.len(), 2);
        assert!(out.groups[0].buttons.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let reservations = vec![booked("04/25 13:00"), booked("04/26 14:00")];
        let t = Triggers::default();
        let today = day("2025-04-25");
        let once = filter_template(&template(), &reservations, &t, today);
        let twice = filter_template(&once, &reservations, &t, today);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_button_matches_a_reservation() {
        let reservations = vec![booked(" 04/25   14:00 "), booked("04/26 13:00")];
        let t = Triggers::default();
        let out = filter_template(&template(), &reservations, &t, day("2025-04-20"));
        for label in labels(&out) {
            assert!(reservations
                .iter()
                .all(|r| t.normalize(&r.time) != t.normalize(&label)));
        }
    }
}
