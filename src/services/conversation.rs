use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::errors::AppError;
use crate::models::{Reservation, SlotTemplate, Triggers};
use crate::services::audit::AuditEntry;
use crate::services::flex::render_slot_menu;
use crate::services::messaging::OutboundMessage;
use crate::services::slots::filter_template;
use crate::state::AppState;
use crate::store::queries::{self, Insert};

pub const SLOT_TAKEN: &str = "這個時段已經被預約囉～請選擇其他時段 💔";
pub const TRY_AGAIN_LATER: &str = "讀取預約資訊時發生錯誤，請稍後再試。";
pub const OWNER_ONLY: &str = "抱歉，目前僅開放指定帳號使用預約功能 🙏";
pub const NO_OPEN_SLOTS: &str = "目前沒有可預約的時段，請稍後再來看看 🙏";
pub const PLACEHOLDER_NAME: &str = "unknown";

const GREETINGS: &[&str] = &["hi", "hello", "你好", "哈囉", "嗨"];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Reserve the given normalized slot.
    Book(String),
    ShowAvailability,
    Greeting,
    Unknown,
}

/// Matches inbound text against the triggers, in priority order: booking
/// prefix, availability phrase, greetings.
pub fn route(text: &str, triggers: &Triggers) -> Command {
    let text = text.trim();

    if !triggers.booking.is_empty() {
        if let Some(rest) = text.strip_prefix(triggers.booking.as_str()) {
            let slot = triggers.normalize(rest);
            if slot.is_empty() {
                return Command::ShowAvailability;
            }
            return Command::Book(slot);
        }
    }

    if !triggers.availability.is_empty() && text.contains(triggers.availability.as_str()) {
        return Command::ShowAvailability;
    }

    let lowered = text.to_lowercase();
    if GREETINGS.contains(&lowered.as_str()) {
        return Command::Greeting;
    }

    Command::Unknown
}

pub fn greeting_reply(triggers: &Triggers) -> String {
    format!(
        "哈囉！歡迎使用預約小幫手 😊\n輸入『{}』即可查看可預約的時段。",
        triggers.availability
    )
}

pub fn fallback_reply(triggers: &Triggers) -> String {
    format!("請輸入『{}』開始選擇時段 🕰️", triggers.availability)
}

pub fn confirmation_reply(slot: &str, display_name: &str) -> String {
    format!("預約成功 🎉\n妳預約的時間是：{slot}\n我們會記得妳的名字喔，{display_name}！")
}

/// Handles one text message and returns the reply, or `None` to stay silent.
///
/// Malformed reservation or template files are answered with a generic
/// "try again later" text. Transient store failures are returned as errors
/// so the webhook can ask the platform to retry.
pub async fn process_message(
    state: &Arc<AppState>,
    user_id: &str,
    text: &str,
) -> Result<Option<OutboundMessage>, AppError> {
    let triggers = &state.config.triggers;
    let command = route(text, triggers);

    tracing::info!(user_id, command = ?command, "processing message");

    let result = match command {
        Command::Book(_) | Command::ShowAvailability if !may_book(state, user_id) => {
            tracing::info!(user_id, "owner-only mode, refusing");
            Ok(Some(OutboundMessage::text(OWNER_ONLY)))
        }
        Command::Book(slot) => book_slot(state, user_id, &slot).await.map(Some),
        Command::ShowAvailability => {
            show_availability(state, Local::now().date_naive()).map(Some)
        }
        Command::Greeting => Ok(Some(OutboundMessage::text(greeting_reply(triggers)))),
        Command::Unknown if state.config.fallback_reply => {
            Ok(Some(OutboundMessage::text(fallback_reply(triggers))))
        }
        Command::Unknown => Ok(None),
    };

    match result {
        Err(e) if !e.is_transient() => {
            tracing::error!(error = %e, user_id, "message handling failed");
            Ok(Some(OutboundMessage::text(TRY_AGAIN_LATER)))
        }
        other => other,
    }
}

fn may_book(state: &AppState, user_id: &str) -> bool {
    match &state.config.owner_user_id {
        Some(owner) => owner == user_id,
        None => true,
    }
}

/// Reserves `slot` for `user_id` unless someone already holds it.
pub async fn book_slot(
    state: &Arc<AppState>,
    user_id: &str,
    slot: &str,
) -> Result<OutboundMessage, AppError> {
    let triggers = &state.config.triggers;

    let current = state.store.snapshot()?;
    if queries::is_slot_taken(&current, triggers, slot) {
        tracing::info!(user_id, slot, "slot already reserved");
        return Ok(OutboundMessage::text(SLOT_TAKEN));
    }

    let display_name = match state.messaging.display_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "profile lookup failed, using placeholder name");
            PLACEHOLDER_NAME.to_string()
        }
    };

    // The slot may have been taken while the profile lookup was in flight.
    let reservation = Reservation::new(user_id, &display_name, slot);
    match queries::insert_if_free(&state.store, triggers, reservation)? {
        Insert::SlotTaken => {
            tracing::info!(user_id, slot, "slot taken by a concurrent booking");
            Ok(OutboundMessage::text(SLOT_TAKEN))
        }
        Insert::Created(_) => {
            tracing::info!(user_id, slot, display_name = %display_name, "reservation created");

            let entry = AuditEntry::new(&display_name, user_id, slot, Local::now().naive_local());
            if let Err(e) = state.audit.log_reservation(&entry).await {
                tracing::warn!(error = %e, slot, "failed to write audit log");
            }

            Ok(OutboundMessage::text(confirmation_reply(slot, &display_name)))
        }
    }
}

/// Builds the slot menu with reserved and past slots removed.
pub fn show_availability(state: &AppState, today: NaiveDate) -> Result<OutboundMessage, AppError> {
    let triggers = &state.config.triggers;

    let template = SlotTemplate::load(Path::new(&state.config.slot_template_path))
        .map_err(|e| AppError::Template(format!("{e:#}")))?;
    let reservations = state.store.snapshot()?;

    let filtered = filter_template(&template, &reservations, triggers, today);
    tracing::debug!(
        offered = template.button_count(),
        open = filtered.button_count(),
        "filtered slot menu"
    );

    Ok(render_slot_menu(&filtered, triggers)
        .unwrap_or_else(|| OutboundMessage::text(NO_OPEN_SLOTS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_booking() {
        let t = Triggers::default();
        assert_eq!(
            route("我想預約 04/25 13:00", &t),
            Command::Book("04/25 13:00".to_string())
        );
        assert_eq!(
            route("  我想預約   04/25  13:00 ", &t),
            Command::Book("04/25 13:00".to_string())
        );
    }

    #[test]
    fn test_route_bare_booking_trigger_shows_menu() {
        let t = Triggers::default();
        assert_eq!(route("我想預約", &t), Command::ShowAvailability);
    }

    #[test]
    fn test_route_availability() {
        let t = Triggers::default();
        assert_eq!(route("我要預約", &t), Command::ShowAvailability);
        assert_eq!(route("請問我要預約怎麼做", &t), Command::ShowAvailability);
    }

    #[test]
    fn test_route_greeting() {
        let t = Triggers::default();
        assert_eq!(route("Hello", &t), Command::Greeting);
        assert_eq!(route(" 你好 ", &t), Command::Greeting);
        assert_eq!(route("hello there", &t), Command::Unknown);
    }

    #[test]
    fn test_route_unknown() {
        assert_eq!(route("what?", &Triggers::default()), Command::Unknown);
    }

    #[test]
    fn test_route_custom_triggers() {
        let t = Triggers {
            booking: "book".to_string(),
            availability: "slots".to_string(),
        };
        assert_eq!(route("book 05/01 09:00", &t), Command::Book("05/01 09:00".to_string()));
        assert_eq!(route("show slots", &t), Command::ShowAvailability);
        assert_eq!(route("我想預約 05/01 09:00", &t), Command::Unknown);
    }

    #[test]
    fn test_replies_mention_trigger() {
        let t = Triggers::default();
        assert!(fallback_reply(&t).contains("我要預約"));
        assert!(greeting_reply(&t).contains("我要預約"));
        let confirmation = confirmation_reply("04/26 10:00", "Amy");
        assert!(confirmation.contains("04/26 10:00"));
        assert!(confirmation.contains("Amy"));
    }
}
