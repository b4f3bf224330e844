//! Registration sub-flow for senders the backend does not know.
//!
//! ```text
//! Unknown ──(non-INFO model reply)──▶ Prompted ──("yes…")──▶ AwaitingForm ──(complete form)──▶ Registered
//!    │                                   │                        │  ▲
//!    └─(INFO reply: answer, stay)        └─(anything else)─▶ Abandoned   └─┘ (incomplete form)
//! ```
//!
//! `Registered` and `Abandoned` are terminal and leave no record behind.

use std::sync::Arc;

use {
    receptionist_common::InboundMessage,
    receptionist_directory::{DirectoryService, NewUser},
    receptionist_providers::LanguageModel,
    receptionist_sessions::{RegistrationForm, RegistrationState, RegistrationStore},
    tracing::{debug, info, warn},
};

use crate::{
    directives::Directive, dispatch::ActionDispatcher, prompt::render_unregistered_prompt,
};

pub const NOT_REGISTERED_REPLY: &str = "YOU ARE NOT REGISTERED. WANT TO REGISTER AS A NEW USER ?";
pub const DECLINED_REPLY: &str = "Okay, if you change your mind, just let me know.";
pub const INCOMPLETE_FORM_REPLY: &str = "Please provide all fields: Name, Surname, Alias, Email.";
pub const REGISTRATION_FAILED_REPLY: &str = "Registration failed. Please try again later.";

/// The blank form sent after the sender agrees to register.
#[must_use]
pub fn form_template(phone: &str) -> String {
    format!("Please fill out this form:\nName:\nSurname:\nAlias:\nEmail:\nPhone number: {phone}")
}

/// Parse `key: value` lines. Keys are matched case-insensitively; lines
/// without a colon and unknown keys are ignored. Later lines win.
#[must_use]
pub fn parse_form(text: &str) -> RegistrationForm {
    let mut form = RegistrationForm::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = Some(value.trim().to_string());
        match key.trim().to_lowercase().as_str() {
            "name" => form.name = value,
            "surname" => form.surname = value,
            "alias" => form.alias = value,
            "email" => form.email = value,
            _ => {},
        }
    }
    form
}

/// Guides an unregistered sender from first contact to a backend account.
pub struct RegistrationFlow {
    store: Arc<RegistrationStore>,
    directory: Arc<dyn DirectoryService>,
    model: Arc<dyn LanguageModel>,
    dispatcher: Arc<ActionDispatcher>,
    group_id: u64,
    instruction: String,
}

impl RegistrationFlow {
    pub fn new(
        store: Arc<RegistrationStore>,
        directory: Arc<dyn DirectoryService>,
        model: Arc<dyn LanguageModel>,
        dispatcher: Arc<ActionDispatcher>,
        group_id: u64,
        instruction: String,
    ) -> Self {
        Self {
            store,
            directory,
            model,
            dispatcher,
            group_id,
            instruction,
        }
    }

    /// Handle one message from a sender the backend reported as unknown.
    pub async fn handle(&self, token: &str, msg: &InboundMessage) -> String {
        match self.store.state(msg.sender.as_str()) {
            RegistrationState::Prompted => self.on_prompted(msg),
            RegistrationState::AwaitingForm => self.on_form(token, msg).await,
            RegistrationState::Unknown
            | RegistrationState::Registered
            | RegistrationState::Abandoned => self.on_first_contact(token, msg).await,
        }
    }

    async fn on_first_contact(&self, token: &str, msg: &InboundMessage) -> String {
        let prompt = render_unregistered_prompt(&self.instruction, &msg.body);
        match self.model.generate(&prompt).await {
            Ok(raw) => {
                if let Directive::InfoRequest { endpoint } = Directive::parse(&raw) {
                    return self.dispatcher.fetch_info(token, &endpoint).await;
                }
            },
            Err(e) => {
                warn!(sender = %msg.sender, error = %e, "model call failed for unregistered sender");
            },
        }
        self.store.transition(&msg.sender, RegistrationState::Prompted);
        NOT_REGISTERED_REPLY.to_string()
    }

    fn on_prompted(&self, msg: &InboundMessage) -> String {
        if msg.body.trim().to_lowercase().starts_with("yes") {
            self.store.transition(&msg.sender, RegistrationState::AwaitingForm);
            form_template(msg.sender.as_str())
        } else {
            self.store.transition(&msg.sender, RegistrationState::Abandoned);
            DECLINED_REPLY.to_string()
        }
    }

    async fn on_form(&self, token: &str, msg: &InboundMessage) -> String {
        let form = parse_form(&msg.body);
        self.store.record_form(msg.sender.as_str(), form.clone());

        if !form.is_complete() {
            debug!(
                sender = %msg.sender,
                missing = ?form.missing_fields(),
                "incomplete registration form"
            );
            return INCOMPLETE_FORM_REPLY.to_string();
        }
        let (Some(name), Some(surname), Some(alias), Some(email)) =
            (form.name, form.surname, form.alias, form.email)
        else {
            return INCOMPLETE_FORM_REPLY.to_string();
        };

        let user = NewUser {
            group_id: self.group_id,
            name,
            surname,
            alias,
            phone_number: msg.sender.to_string(),
            email,
        };
        match self.directory.register_user(token, &user).await {
            Ok(_) => {
                info!(sender = %msg.sender, "user registered");
                self.store.transition(&msg.sender, RegistrationState::Registered);
                format!("Registration successful! Welcome, {}.", user.name)
            },
            Err(e) => {
                warn!(sender = %msg.sender, error = %e, "registration failed");
                self.store.transition(&msg.sender, RegistrationState::Abandoned);
                REGISTRATION_FAILED_REPLY.to_string()
            },
        }
    }
}
