//! In-progress registration records.

use {dashmap::DashMap, receptionist_common::SenderKey, tracing::debug};

/// Where a sender is in the registration conversation.
///
/// Only [`Prompted`](Self::Prompted) and [`AwaitingForm`](Self::AwaitingForm)
/// are ever stored; the other states describe a sender without a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Not yet classified.
    Unknown,
    /// Asked whether they want to register.
    Prompted,
    /// Sent the form template, waiting for the filled-in fields.
    AwaitingForm,
    /// Registration succeeded.
    Registered,
    /// Declined, or the registration attempt ended.
    Abandoned,
}

impl RegistrationState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Registered | Self::Abandoned)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Prompted => "prompted",
            Self::AwaitingForm => "awaiting_form",
            Self::Registered => "registered",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Fields collected from the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub alias: Option<String>,
    pub email: Option<String>,
}

impl RegistrationForm {
    /// Names of the required fields that are missing or blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("surname", &self.surname),
            ("alias", &self.alias),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(field, _)| field)
        .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub state: RegistrationState,
    pub form: RegistrationForm,
}

/// Concurrent map of in-progress registrations.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    records: DashMap<SenderKey, RegistrationRecord>,
}

impl RegistrationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, sender: &str) -> Option<RegistrationRecord> {
        self.records.get(sender).map(|record| record.clone())
    }

    /// Current state; senders without a record are [`RegistrationState::Unknown`].
    #[must_use]
    pub fn state(&self, sender: &str) -> RegistrationState {
        self.records
            .get(sender)
            .map_or(RegistrationState::Unknown, |record| record.state)
    }

    /// Move `sender` to `state`.
    ///
    /// Terminal states and `Unknown` destroy the record. Collected form fields
    /// survive non-terminal transitions.
    pub fn transition(&self, sender: &SenderKey, state: RegistrationState) {
        let from = self.state(sender.as_str());
        if state.is_terminal() || state == RegistrationState::Unknown {
            self.records.remove(sender.as_str());
        } else {
            self.records
                .entry(sender.clone())
                .and_modify(|record| record.state = state)
                .or_insert_with(|| RegistrationRecord {
                    state,
                    form: RegistrationForm::default(),
                });
        }
        debug!(
            sender = %sender,
            from = from.as_str(),
            to = state.as_str(),
            "registration transition"
        );
    }

    /// Remember the latest form submission. No-op without a record.
    pub fn record_form(&self, sender: &str, form: RegistrationForm) {
        if let Some(mut record) = self.records.get_mut(sender) {
            record.form = form;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn full_form() -> RegistrationForm {
        RegistrationForm {
            name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
            alias: Some("ada".into()),
            email: Some("ada@example.com".into()),
        }
    }

    #[test]
    fn unknown_sender_has_no_record() {
        let store = RegistrationStore::new();
        assert_eq!(store.state("+1"), RegistrationState::Unknown);
        assert!(store.get("+1").is_none());
    }

    #[test]
    fn walks_through_non_terminal_states() {
        let store = RegistrationStore::new();
        let key = SenderKey::new("+1");

        store.transition(&key, RegistrationState::Prompted);
        assert_eq!(store.state("+1"), RegistrationState::Prompted);

        store.transition(&key, RegistrationState::AwaitingForm);
        assert_eq!(store.state("+1"), RegistrationState::AwaitingForm);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn terminal_states_destroy_the_record() {
        let store = RegistrationStore::new();
        let key = SenderKey::new("+1");

        store.transition(&key, RegistrationState::Prompted);
        store.transition(&key, RegistrationState::Abandoned);
        assert!(store.is_empty());

        store.transition(&key, RegistrationState::AwaitingForm);
        store.transition(&key, RegistrationState::Registered);
        assert!(store.get("+1").is_none());
    }

    #[test]
    fn form_survives_state_change() {
        let store = RegistrationStore::new();
        let key = SenderKey::new("+1");
        store.transition(&key, RegistrationState::AwaitingForm);
        store.record_form("+1", full_form());
        store.transition(&key, RegistrationState::AwaitingForm);
        assert_eq!(store.get("+1").unwrap().form, full_form());
    }

    #[test]
    fn record_form_without_record_is_ignored() {
        let store = RegistrationStore::new();
        store.record_form("+1", full_form());
        assert!(store.is_empty());
    }

    #[test]
    fn missing_fields_treats_blank_as_missing() {
        let mut form = full_form();
        assert!(form.is_complete());

        form.alias = Some("   ".into());
        form.email = None;
        assert_eq!(form.missing_fields(), vec!["alias", "email"]);
        assert!(!form.is_complete());
    }
}
