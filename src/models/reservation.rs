use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub time: String,
    /// Outer `None` means the key is absent, `Some(None)` a stored `null`.
    /// Both survive a rewrite as they were read.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<ReservationStatus>>,
    /// Keys written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Reservation {
    pub fn new(user_id: &str, display_name: &str, time: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            time: time.to_string(),
            phone: Some(Some(String::new())),
            status: Some(Some(ReservationStatus::Active)),
            extra: serde_json::Map::new(),
        }
    }

    pub fn phone(&self) -> &str {
        self.phone.as_ref().and_then(|p| p.as_deref()).unwrap_or("")
    }

    pub fn set_phone(&mut self, phone: &str) {
        self.phone = Some(Some(phone.to_string()));
    }

    /// Effective status. Absent, `null` and unrecognized values all read as
    /// active; the stored value is left as it was.
    pub fn status(&self) -> ReservationStatus {
        match self.status.as_ref().and_then(|s| s.as_ref()) {
            Some(ReservationStatus::Unrecognized(_)) | None => ReservationStatus::Active,
            Some(known) => known.clone(),
        }
    }

    pub fn set_status(&mut self, status: ReservationStatus) {
        self.status = Some(Some(status));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ReservationStatus {
    #[default]
    Active,
    Done,
    Missed,
    /// A value written by something else, kept verbatim.
    Unrecognized(String),
}

impl ReservationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Done => "done",
            ReservationStatus::Missed => "missed",
            ReservationStatus::Unrecognized(raw) => raw,
        }
    }

    /// Parses an admin-supplied status. Only the three lifecycle states are
    /// accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ReservationStatus::Active),
            "done" => Some(ReservationStatus::Done),
            "missed" => Some(ReservationStatus::Missed),
            _ => None,
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "active" => ReservationStatus::Active,
            "done" => ReservationStatus::Done,
            "missed" => ReservationStatus::Missed,
            _ => ReservationStatus::Unrecognized(raw),
        }
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}
