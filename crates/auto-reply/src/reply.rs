//! Per-message orchestration: lock, authenticate, route and reply.

use std::{collections::HashMap, panic::AssertUnwindSafe, sync::Arc};

use {
    futures::FutureExt,
    receptionist_common::{InboundMessage, SenderKey},
    receptionist_config::{BookingIdentity, ReceptionistConfig},
    receptionist_directory::{DirectoryService, UserRecord},
    receptionist_providers::LanguageModel,
    receptionist_sessions::{
        Credentials, RegistrationState, RegistrationStore, SenderLocks, SessionStore,
    },
    secrecy::ExposeSecret,
    tracing::{debug, error, info, warn},
};

use crate::{
    directives::Directive,
    dispatch::ActionDispatcher,
    error::{Error, FALLBACK_REPLY, Result},
    prompt::{ConversationContext, default_instruction, render_prompt},
    registration::RegistrationFlow,
};

/// Conversation behaviour knobs.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Group every backend call is scoped to.
    pub group_id: u64,
    /// System instruction used when a sender has no override.
    pub instruction: String,
    /// Per-sender instruction overrides, keyed by sender key.
    pub instruction_overrides: HashMap<String, String>,
    pub booking_identity: BookingIdentity,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            group_id: 3,
            instruction: default_instruction(),
            instruction_overrides: HashMap::new(),
            booking_identity: BookingIdentity::default(),
        }
    }
}

impl ChatSettings {
    #[must_use]
    pub fn from_config(config: &ReceptionistConfig) -> Self {
        let instruction = config
            .chat
            .system_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(default_instruction, str::to_string);
        Self {
            group_id: config.directory.group_id,
            instruction,
            instruction_overrides: config.chat.instruction_overrides.clone(),
            booking_identity: config.chat.booking_identity,
        }
    }
}

/// Top-level coordinator for inbound messages.
///
/// One message at a time per sender: the sender's lock is held from session
/// lookup until the reply text is ready.
pub struct ConversationOrchestrator {
    sessions: Arc<SessionStore>,
    registrations: Arc<RegistrationStore>,
    locks: SenderLocks,
    directory: Arc<dyn DirectoryService>,
    model: Arc<dyn LanguageModel>,
    dispatcher: Arc<ActionDispatcher>,
    registration: RegistrationFlow,
    group_id: u64,
    instruction: String,
}

impl ConversationOrchestrator {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        model: Arc<dyn LanguageModel>,
        settings: ChatSettings,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new());
        for (sender, instruction) in &settings.instruction_overrides {
            sessions.set_instruction(&SenderKey::from_channel_address(sender), instruction.as_str());
        }

        let registrations = Arc::new(RegistrationStore::new());
        let dispatcher = Arc::new(ActionDispatcher::new(
            Arc::clone(&directory),
            settings.group_id,
            settings.booking_identity,
        ));
        let registration = RegistrationFlow::new(
            Arc::clone(&registrations),
            Arc::clone(&directory),
            Arc::clone(&model),
            Arc::clone(&dispatcher),
            settings.group_id,
            settings.instruction.clone(),
        );

        info!(
            model = model.id(),
            provider = model.name(),
            group_id = settings.group_id,
            booking_identity = ?settings.booking_identity,
            overrides = settings.instruction_overrides.len(),
            "conversation orchestrator ready"
        );

        Self {
            sessions,
            registrations,
            locks: SenderLocks::new(),
            directory,
            model,
            dispatcher,
            registration,
            group_id: settings.group_id,
            instruction: settings.instruction,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn registrations(&self) -> &RegistrationStore {
        &self.registrations
    }

    /// Process an inbound message and produce the reply text.
    ///
    /// Never fails and never returns blank text: errors map to fixed
    /// replies, while a panic or an empty result yields [`FALLBACK_REPLY`].
    pub async fn get_reply(&self, msg: &InboundMessage) -> String {
        info!(
            sender = %msg.sender,
            chars = msg.body.chars().count(),
            "incoming message"
        );

        let _guard = self.locks.acquire(&msg.sender).await;
        match AssertUnwindSafe(self.handle(msg)).catch_unwind().await {
            Ok(Ok(reply)) if reply.trim().is_empty() => {
                warn!(sender = %msg.sender, "pipeline produced an empty reply");
                FALLBACK_REPLY.to_string()
            },
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(sender = %msg.sender, error = %e, "message handling failed");
                e.user_message().to_string()
            },
            Err(_) => {
                error!(sender = %msg.sender, "message handling panicked");
                FALLBACK_REPLY.to_string()
            },
        }
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<String> {
        let credentials = self.credentials(&msg.sender).await?;
        let token = credentials.access_token();

        let user = self
            .directory
            .get_user(token, msg.sender.as_str())
            .await
            .map_err(|e| Error::upstream("user lookup", e))?;

        let Some(user) = user else {
            return Ok(self.registration.handle(token, msg).await);
        };

        if self.registrations.state(msg.sender.as_str()) != RegistrationState::Unknown {
            debug!(sender = %msg.sender, "dropping stale registration record");
            self.registrations.transition(&msg.sender, RegistrationState::Unknown);
        }

        let user_id = user.id();
        let ctx = self.gather_context(token, msg, user).await;
        let instruction = self
            .sessions
            .instruction(msg.sender.as_str())
            .unwrap_or_else(|| self.instruction.clone());

        let raw = self
            .model
            .generate(&render_prompt(&instruction, &ctx))
            .await
            .map_err(Error::Model)?;
        let directive = Directive::parse(&raw);
        debug!(sender = %msg.sender, kind = directive.kind(), "model reply parsed");

        Ok(self.dispatcher.dispatch(token, directive, user_id).await)
    }

    /// Cached credentials, or a fresh login cached for next time.
    async fn credentials(&self, sender: &SenderKey) -> Result<Credentials> {
        if let Some(credentials) = self.sessions.credentials(sender.as_str()) {
            return Ok(credentials);
        }
        let tokens = self
            .directory
            .authenticate()
            .await
            .map_err(Error::AuthFailure)?;
        let credentials = Credentials::new(
            tokens.access_token.expose_secret().as_str(),
            tokens.refresh_token.expose_secret().as_str(),
        );
        self.sessions.put_credentials(sender, credentials.clone());
        info!(sender = %sender, "authenticated new session");
        Ok(credentials)
    }

    /// Fetch group, roster and appointments. Each lookup that fails is
    /// logged and left empty.
    async fn gather_context(
        &self,
        token: &str,
        msg: &InboundMessage,
        user: UserRecord,
    ) -> ConversationContext {
        let user_id = user.id();
        let mut ctx = ConversationContext::new(msg.sender.clone(), msg.body.as_str());

        let (group, professionals, appointments) = tokio::join!(
            self.directory.get_group(token, self.group_id),
            self.directory.list_professionals(token, self.group_id),
            async {
                match user_id {
                    Some(id) => Some(tokio::join!(
                        self.directory.list_appointments(token, id, self.group_id),
                        self.directory
                            .list_personal_appointments(token, id, self.group_id),
                    )),
                    None => None,
                }
            },
        );

        ctx.group = group
            .inspect_err(|e| warn!(error = %e, "group lookup failed"))
            .ok();
        ctx.professionals = professionals
            .inspect_err(|e| warn!(error = %e, "professional roster lookup failed"))
            .unwrap_or_default();

        match appointments {
            Some((appointments, personal)) => {
                ctx.appointments = appointments
                    .inspect_err(|e| warn!(error = %e, "appointment lookup failed"))
                    .unwrap_or_default();
                ctx.personal_appointments = personal
                    .inspect_err(|e| warn!(error = %e, "personal appointment lookup failed"))
                    .unwrap_or_default();
            },
            None => debug!(sender = %msg.sender, "user record has no id, skipping appointments"),
        }

        ctx.user = Some(user.0);
        ctx
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::{
            dispatch::NO_SLOTS_REPLY,
            error::{AUTH_FAILED_REPLY, SLOT_OCCUPIED_REPLY, UPSTREAM_REPLY, VALIDATION_REPLY},
            registration::{
                DECLINED_REPLY, INCOMPLETE_FORM_REPLY, NOT_REGISTERED_REPLY, form_template,
            },
            test_support::{BookingOutcome, FakeDirectory, PanickingModel, ScriptedModel},
        },
        receptionist_directory::InfoPage,
        serde_json::json,
    };

    const SENDER: &str = "+391234";

    fn orchestrator(
        directory: &Arc<FakeDirectory>,
        model: &Arc<ScriptedModel>,
        settings: ChatSettings,
    ) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            Arc::clone(directory) as Arc<dyn DirectoryService>,
            Arc::clone(model) as Arc<dyn LanguageModel>,
            settings,
        )
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            instruction: "INSTRUCTION".into(),
            ..ChatSettings::default()
        }
    }

    fn msg(body: &str) -> InboundMessage {
        InboundMessage::new(SenderKey::new(SENDER), body)
    }

    #[tokio::test]
    async fn registered_sender_gets_model_reply_with_context() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::new(["  Hello Ada!  "]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, "Hello Ada!");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        assert!(prompt.starts_with("INSTRUCTION\n\nUser Info:\n"));
        assert!(prompt.contains("\"id\":42"));
        assert!(prompt.contains("Group Info:\n{\"id\":3,\"name\":\"Test Group\"}"));
        assert!(prompt.contains("\"alias\":\"dr-who\""));
        assert!(prompt.contains("\"kind\":\"group\""));
        assert!(prompt.contains("\"kind\":\"personal\""));
        assert!(prompt.ends_with("User: hi"));
    }

    #[tokio::test]
    async fn failed_context_lookups_degrade_to_empty() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        directory.fail_group();
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, "Hello!");
        assert!(model.prompts()[0].contains("Group Info:\nnull"));
    }

    #[tokio::test]
    async fn session_is_cached_after_first_message() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(&directory, &model, settings());

        orch.get_reply(&msg("one")).await;
        orch.get_reply(&msg("two")).await;
        assert_eq!(directory.auth_calls(), 1);
        assert_eq!(
            orch.sessions().credentials(SENDER).unwrap().access_token(),
            "access"
        );
    }

    #[tokio::test]
    async fn auth_failure_reply() {
        let directory = Arc::new(FakeDirectory::default());
        directory.fail_auth();
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, AUTH_FAILED_REPLY);
        assert!(orch.sessions().credentials(SENDER).is_none());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn user_lookup_failure_reply() {
        let directory = Arc::new(FakeDirectory::default());
        directory.fail_user_lookup();
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, UPSTREAM_REPLY);
    }

    #[tokio::test]
    async fn model_failure_yields_apology() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::default());
        model.push_error("quota exceeded");
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_model_output_yields_apology() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::new(["   \n  "]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hi")).await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn empty_info_message_yields_apology() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        directory.set_info("end_user/welcome", InfoPage {
            status: Some(json!(200)),
            message: Some(String::new()),
        });
        let model = Arc::new(ScriptedModel::new(["INFO: end_user/welcome"]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("welcome?")).await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn panic_yields_apology_and_releases_lock() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let orch = ConversationOrchestrator::new(
            Arc::clone(&directory) as Arc<dyn DirectoryService>,
            Arc::new(PanickingModel),
            settings(),
        );

        assert_eq!(orch.get_reply(&msg("hi")).await, FALLBACK_REPLY);
        let second = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            orch.get_reply(&msg("again")),
        )
        .await
        .unwrap();
        assert_eq!(second, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn booking_directive_is_executed() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::new([
            "APPOINTMENT BOOK PROFESSIONAL ID 13 DATESTART 2025-04-15 TIMESTART 12:00 USERID 42",
        ]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(
            orch.get_reply(&msg("book Dr Who tomorrow at noon")).await,
            "Your appointment has been successfully booked with Professional ID 13 for 2025-04-15 at 12:00."
        );
        assert_eq!(directory.bookings().len(), 1);
    }

    #[tokio::test]
    async fn booking_conflict_reply() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        directory.set_booking_outcome(BookingOutcome::Conflict);
        let model = Arc::new(ScriptedModel::new([
            "APPOINTMENT BOOK PROFESSIONAL ID 13 DATESTART 2025-04-15 TIMESTART 12:00 USERID 42",
        ]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("book")).await, SLOT_OCCUPIED_REPLY);
    }

    #[tokio::test]
    async fn invalid_booking_date_is_rejected_locally() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::new([
            "APPOINTMENT BOOK PROFESSIONAL ID 13 DATESTART 2025-13-40 TIMESTART 12:00 USERID 42",
        ]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("book")).await, VALIDATION_REPLY);
        assert!(directory.bookings().is_empty());
    }

    #[tokio::test]
    async fn slot_query_without_slots() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::new(["PROFESSIONAL SLOT NEEDED 13"]));
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("free slots?")).await, NO_SLOTS_REPLY);
    }

    #[tokio::test]
    async fn instruction_override_replaces_default() {
        let directory = Arc::new(FakeDirectory::default());
        directory.add_user(SENDER, 42);
        let model = Arc::new(ScriptedModel::default());
        let mut settings = settings();
        settings
            .instruction_overrides
            .insert(format!("whatsapp:{SENDER}"), "ANSWER IN ITALIAN".into());
        let orch = orchestrator(&directory, &model, settings);

        orch.get_reply(&msg("ciao")).await;
        assert!(model.prompts()[0].starts_with("ANSWER IN ITALIAN\n\n"));
    }

    #[tokio::test]
    async fn registration_end_to_end() {
        let directory = Arc::new(FakeDirectory::default());
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(&directory, &model, settings());

        assert_eq!(orch.get_reply(&msg("hello")).await, NOT_REGISTERED_REPLY);
        assert_eq!(orch.get_reply(&msg("yes")).await, form_template(SENDER));
        assert_eq!(
            orch.get_reply(&msg("Name: Ada")).await,
            INCOMPLETE_FORM_REPLY
        );
        assert_eq!(
            orch.get_reply(&msg(
                "Name: Ada\nSurname: Lovelace\nAlias: ada\nEmail: ada@example.com"
            ))
            .await,
            "Registration successful! Welcome, Ada."
        );
        assert!(orch.registrations().is_empty());

        // Now known to the backend: goes through the model with context.
        assert_eq!(orch.get_reply(&msg("hi again")).await, "Hello!");
        assert_eq!(directory.auth_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_messages_from_one_sender_authenticate_once() {
        let directory = Arc::new(FakeDirectory::default());
        let model = Arc::new(ScriptedModel::default());
        let orch = Arc::new(orchestrator(&directory, &model, settings()));

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_reply(&msg("hello")).await })
        };
        let second = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_reply(&msg("no")).await })
        };
        let replies = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(directory.auth_calls(), 1);
        // Whichever message runs second sees the Prompted state and declines.
        let mut replies = replies.to_vec();
        replies.sort();
        let mut expected = vec![NOT_REGISTERED_REPLY.to_string(), DECLINED_REPLY.to_string()];
        expected.sort();
        assert_eq!(replies, expected);
    }
}
