use std::collections::{BTreeMap, BTreeSet};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Available times keyed by date, both as the backend formats them.
pub type SlotMap = BTreeMap<String, BTreeSet<String>>;

/// Tokens returned by `auth/login`.
#[derive(Clone)]
pub struct AuthTokens {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
}

impl AuthTokens {
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginAuth {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// The backend's user document, kept as raw JSON so it can be handed to the
/// language model verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord(pub Value);

impl UserRecord {
    /// Numeric id at `user.id`, if present.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        let id = &self.0["user"]["id"];
        id.as_u64()
            .or_else(|| id.as_str().and_then(|s| s.trim().parse().ok()))
    }
}

/// Registration payload for `POST users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    #[serde(rename = "groupId")]
    pub group_id: u64,
    pub name: String,
    pub surname: String,
    pub alias: String,
    pub phone_number: String,
    pub email: String,
}

/// Booking payload for `POST appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub group_id: u64,
    pub professional_id: u64,
    pub user_id: u64,
    /// `YYYY-MM-DD`
    pub date_start: String,
    /// `HH:MM`
    pub time_start: String,
}

/// An `info/<endpoint>` page.
///
/// `status` mirrors an HTTP status inside the body; only `200` carries a
/// usable message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InfoPage {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InfoPage {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|status| status.as_u64() == Some(200) || status.as_str() == Some("200"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfessionalsResponse {
    #[serde(default)]
    pub professionals: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppointmentsResponse {
    #[serde(default)]
    pub appointments: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlotsResponse {
    #[serde(default)]
    pub slots: BTreeMap<String, Vec<String>>,
}

impl SlotsResponse {
    pub(crate) fn into_slot_map(self) -> SlotMap {
        self.slots
            .into_iter()
            .map(|(date, times)| (date, times.into_iter().collect()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn user_id_reads_nested_number_or_string() {
        assert_eq!(UserRecord(json!({"user": {"id": 42}})).id(), Some(42));
        assert_eq!(UserRecord(json!({"user": {"id": "7"}})).id(), Some(7));
        assert_eq!(UserRecord(json!({"user": {}})).id(), None);
        assert_eq!(UserRecord(json!({})).id(), None);
    }

    #[test]
    fn booking_request_uses_camel_case() {
        let body = serde_json::to_value(BookingRequest {
            group_id: 3,
            professional_id: 13,
            user_id: 42,
            date_start: "2025-04-15".into(),
            time_start: "12:00".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "groupId": 3,
                "professionalId": 13,
                "userId": 42,
                "dateStart": "2025-04-15",
                "timeStart": "12:00"
            })
        );
    }

    #[test]
    fn new_user_keeps_snake_case_phone_number() {
        let body = serde_json::to_value(NewUser {
            group_id: 3,
            name: "Ada".into(),
            surname: "Lovelace".into(),
            alias: "ada".into(),
            phone_number: "+391234".into(),
            email: "ada@example.com".into(),
        })
        .unwrap();
        assert_eq!(body["groupId"], 3);
        assert_eq!(body["phone_number"], "+391234");
    }

    #[test]
    fn info_status_accepts_number_or_string() {
        let page: InfoPage = serde_json::from_value(json!({"status": 200, "message": "x"})).unwrap();
        assert!(page.is_ok());
        let page: InfoPage = serde_json::from_value(json!({"status": "200"})).unwrap();
        assert!(page.is_ok());
        let page: InfoPage = serde_json::from_value(json!({"status": 404})).unwrap();
        assert!(!page.is_ok());
    }

    #[test]
    fn slots_are_deduplicated_and_sorted() {
        let resp: SlotsResponse = serde_json::from_value(json!({
            "slots": {"2025-04-16": ["10:10", "10:00", "10:00"], "2025-04-15": []}
        }))
        .unwrap();
        let map = resp.into_slot_map();
        let dates: Vec<_> = map.keys().cloned().collect();
        assert_eq!(dates, vec!["2025-04-15", "2025-04-16"]);
        let times: Vec<_> = map["2025-04-16"].iter().cloned().collect();
        assert_eq!(times, vec!["10:00", "10:10"]);
    }

    #[test]
    fn tokens_debug_is_redacted() {
        let tokens = AuthTokens {
            access_token: Secret::new("abc".into()),
            refresh_token: Secret::new("def".into()),
        };
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("abc"));
        assert_eq!(tokens.access_token(), "abc");
    }
}
