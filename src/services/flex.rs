use serde_json::{json, Value};

use crate::models::{SlotGroup, SlotTemplate, Triggers};
use crate::services::messaging::OutboundMessage;

pub const FULLY_BOOKED: &str = "本日已額滿";

/// LINE rejects carousels with more bubbles than this.
pub const MAX_BUBBLES: usize = 12;

/// Renders the slot menu as a Flex carousel, one bubble per day, keeping the
/// first `MAX_BUBBLES` days. Returns `None` when there is no day left to show.
pub fn render_slot_menu(template: &SlotTemplate, triggers: &Triggers) -> Option<OutboundMessage> {
    if template.groups.is_empty() {
        return None;
    }

    if template.groups.len() > MAX_BUBBLES {
        tracing::warn!(
            groups = template.groups.len(),
            shown = MAX_BUBBLES,
            "slot menu has more days than a carousel holds, truncating"
        );
    }

    let bubbles: Vec<Value> = template
        .groups
        .iter()
        .take(MAX_BUBBLES)
        .map(|group| render_bubble(group, triggers))
        .collect();

    Some(OutboundMessage::Flex {
        alt_text: template.alt_text.clone(),
        contents: json!({ "type": "carousel", "contents": bubbles }),
    })
}

fn render_bubble(group: &SlotGroup, triggers: &Triggers) -> Value {
    let buttons: Vec<Value> = if group.buttons.is_empty() {
        vec![json!({
            "type": "text",
            "text": FULLY_BOOKED,
            "color": "#999999",
            "align": "center",
        })]
    } else {
        group
            .buttons
            .iter()
            .map(|b| {
                json!({
                    "type": "button",
                    "style": "primary",
                    "height": "sm",
                    "action": {
                        "type": "message",
                        "label": b.label,
                        "text": triggers.booking_text(b.slot_label()),
                    },
                })
            })
            .collect()
    };

    json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "md",
            "contents": [
                { "type": "text", "text": group.heading(), "weight": "bold", "size": "lg" },
                { "type": "separator" },
                { "type": "box", "layout": "vertical", "spacing": "sm", "contents": buttons },
            ],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotButton;

    fn template(buttons: Vec<SlotButton>) -> SlotTemplate {
        SlotTemplate {
            alt_text: "請選擇預約時段".to_string(),
            groups: vec![SlotGroup {
                date: "04/25".to_string(),
                title: Some("4/25 (Fri)".to_string()),
                buttons,
            }],
        }
    }

    #[test]
    fn test_render_button_sends_booking_text() {
        let t = template(vec![SlotButton {
            label: "13:00".to_string(),
            slot: Some("04/25 13:00".to_string()),
        }]);
        let msg = render_slot_menu(&t, &Triggers::default()).unwrap();
        let OutboundMessage::Flex { alt_text, contents } = msg else {
            panic!("expected flex message");
        };
        assert_eq!(alt_text, "請選擇預約時段");
        assert_eq!(contents["type"], "carousel");
        let bubble = &contents["contents"][0];
        assert_eq!(bubble["body"]["contents"][0]["text"], "4/25 (Fri)");
        let action = &bubble["body"]["contents"][2]["contents"][0]["action"];
        assert_eq!(action["label"], "13:00");
        assert_eq!(action["text"], "我想預約 04/25 13:00");
    }

    #[test]
    fn test_render_fully_booked_group() {
        let msg = render_slot_menu(&template(vec![]), &Triggers::default()).unwrap();
        let OutboundMessage::Flex { contents, .. } = msg else {
            panic!("expected flex message");
        };
        assert_eq!(
            contents["contents"][0]["body"]["contents"][2]["contents"][0]["text"],
            FULLY_BOOKED
        );
    }

    #[test]
    fn test_render_empty_template() {
        let t = SlotTemplate {
            alt_text: "x".to_string(),
            groups: vec![],
        };
        assert!(render_slot_menu(&t, &Triggers::default()).is_none());
    }

    #[test]
    fn test_render_caps_carousel_size() {
        let t = SlotTemplate {
            alt_text: "x".to_string(),
            groups: (1..=15)
                .map(|d| SlotGroup {
                    date: format!("05/{d:02}"),
                    title: None,
                    buttons: vec![],
                })
                .collect(),
        };
        let OutboundMessage::Flex { contents, .. } = render_slot_menu(&t, &Triggers::default()).unwrap() else {
            panic!("expected flex message");
        };
        let bubbles = contents["contents"].as_array().unwrap();
        assert_eq!(bubbles.len(), MAX_BUBBLES);
        assert_eq!(bubbles[0]["body"]["contents"][0]["text"], "05/01");
        assert_eq!(bubbles[11]["body"]["contents"][0]["text"], "05/12");
    }
}
