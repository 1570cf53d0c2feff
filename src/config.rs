use std::env;

use crate::models::Triggers;
use crate::models::slot_key::{DEFAULT_AVAILABILITY_TRIGGER, DEFAULT_BOOKING_TRIGGER};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub reservations_path: String,
    pub slot_template_path: String,
    pub admin_password: String,
    pub line_channel_secret: String,
    pub line_channel_access_token: String,
    /// When set, only this user may book or browse slots.
    pub owner_user_id: Option<String>,
    pub fallback_reply: bool,
    pub triggers: Triggers,
    pub sheets_spreadsheet_id: String,
    pub sheets_sheet_name: String,
    /// Service account key file content used to append audit rows.
    pub google_service_account_json: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            reservations_path: env::var("RESERVATIONS_FILE")
                .unwrap_or_else(|_| "reserved.json".to_string()),
            slot_template_path: env::var("SLOT_TEMPLATE_FILE")
                .unwrap_or_else(|_| "slots.json".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string()),
            line_channel_secret: env::var("LINE_CHANNEL_SECRET").unwrap_or_default(),
            line_channel_access_token: env::var("LINE_CHANNEL_ACCESS_TOKEN").unwrap_or_default(),
            owner_user_id: env::var("OWNER_USER_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            fallback_reply: env::var("FALLBACK_REPLY")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            triggers: Triggers {
                booking: env::var("BOOKING_TRIGGER")
                    .unwrap_or_else(|_| DEFAULT_BOOKING_TRIGGER.to_string()),
                availability: env::var("AVAILABILITY_TRIGGER")
                    .unwrap_or_else(|_| DEFAULT_AVAILABILITY_TRIGGER.to_string()),
            },
            sheets_spreadsheet_id: env::var("SHEETS_SPREADSHEET_ID").unwrap_or_default(),
            sheets_sheet_name: env::var("SHEETS_SHEET_NAME")
                .unwrap_or_else(|_| "LineBot預約記錄".to_string()),
            google_service_account_json: env::var("GOOGLE_SERVICE_ACCOUNT_JSON").unwrap_or_default(),
        }
    }

    pub fn sheets_enabled(&self) -> bool {
        !self.sheets_spreadsheet_id.is_empty() && !self.google_service_account_json.trim().is_empty()
    }
}

fn parse_flag(v: &str) -> bool {
    !matches!(
        v.trim().to_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
    }
}
