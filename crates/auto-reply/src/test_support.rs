//! In-memory fakes of the backend and the language model.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    receptionist_directory::{
        AuthTokens, BookingRequest, DirectoryService, Error as DirectoryError, InfoPage, NewUser,
        Result as DirectoryResult, SlotMap, UserRecord,
    },
    receptionist_providers::LanguageModel,
    secrecy::Secret,
    serde_json::{Value, json},
};

#[derive(Debug, Clone, Copy, Default)]
pub enum BookingOutcome {
    #[default]
    Booked,
    Conflict,
    ServerError,
}

#[derive(Default)]
pub struct FakeDirectory {
    users: Mutex<HashMap<String, Value>>,
    registered: Mutex<Vec<NewUser>>,
    bookings: Mutex<Vec<BookingRequest>>,
    booking_outcome: Mutex<BookingOutcome>,
    info: Mutex<HashMap<String, InfoPage>>,
    slots: Mutex<SlotMap>,
    auth_calls: AtomicUsize,
    auth_fails: AtomicBool,
    user_lookup_fails: AtomicBool,
    register_fails: AtomicBool,
    slots_fail: AtomicBool,
    group_fails: AtomicBool,
}

impl FakeDirectory {
    pub fn add_user(&self, phone: &str, id: u64) {
        self.users
            .lock()
            .unwrap()
            .insert(phone.to_string(), json!({"user": {"id": id, "phone_number": phone}}));
    }

    pub fn registered(&self) -> Vec<NewUser> {
        self.registered.lock().unwrap().clone()
    }

    pub fn bookings(&self) -> Vec<BookingRequest> {
        self.bookings.lock().unwrap().clone()
    }

    pub fn set_booking_outcome(&self, outcome: BookingOutcome) {
        *self.booking_outcome.lock().unwrap() = outcome;
    }

    pub fn set_info(&self, endpoint: &str, page: InfoPage) {
        self.info
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), page);
    }

    pub fn set_slots(&self, slots: SlotMap) {
        *self.slots.lock().unwrap() = slots;
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fail_auth(&self) {
        self.auth_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_user_lookup(&self) {
        self.user_lookup_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_register(&self) {
        self.register_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_slots(&self) {
        self.slots_fail.store(true, Ordering::SeqCst);
    }

    pub fn fail_group(&self) {
        self.group_fails.store(true, Ordering::SeqCst);
    }
}

fn server_error() -> DirectoryError {
    DirectoryError::Status {
        status: 500,
        body: "boom".into(),
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn authenticate(&self) -> DirectoryResult<AuthTokens> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which a second request could race the first.
        tokio::time::sleep(Duration::from_millis(10)).await;
        if self.auth_fails.load(Ordering::SeqCst) {
            return Err(DirectoryError::Auth("rejected".into()));
        }
        Ok(AuthTokens {
            access_token: Secret::new("access".into()),
            refresh_token: Secret::new("refresh".into()),
        })
    }

    async fn get_user(&self, _token: &str, phone: &str) -> DirectoryResult<Option<UserRecord>> {
        if self.user_lookup_fails.load(Ordering::SeqCst) {
            return Err(DirectoryError::Timeout);
        }
        Ok(self.users.lock().unwrap().get(phone).cloned().map(UserRecord))
    }

    async fn register_user(&self, _token: &str, user: &NewUser) -> DirectoryResult<Value> {
        if self.register_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.registered.lock().unwrap().push(user.clone());
        let id = 100 + self.registered.lock().unwrap().len() as u64;
        self.add_user(&user.phone_number, id);
        Ok(json!({"user": {"id": id}}))
    }

    async fn get_group(&self, _token: &str, group_id: u64) -> DirectoryResult<Value> {
        if self.group_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(json!({"id": group_id, "name": "Test Group"}))
    }

    async fn list_professionals(&self, _token: &str, _group_id: u64) -> DirectoryResult<Vec<Value>> {
        Ok(vec![json!({"id": 13, "alias": "dr-who"})])
    }

    async fn list_appointments(
        &self,
        _token: &str,
        user_id: u64,
        _group_id: u64,
    ) -> DirectoryResult<Vec<Value>> {
        Ok(vec![json!({"userId": user_id, "kind": "group"})])
    }

    async fn list_personal_appointments(
        &self,
        _token: &str,
        user_id: u64,
        _group_id: u64,
    ) -> DirectoryResult<Vec<Value>> {
        Ok(vec![json!({"userId": user_id, "kind": "personal"})])
    }

    async fn get_info(&self, _token: &str, endpoint: &str) -> DirectoryResult<InfoPage> {
        self.info
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .ok_or(DirectoryError::Status {
                status: 404,
                body: String::new(),
            })
    }

    async fn book_appointment(&self, _token: &str, booking: &BookingRequest) -> DirectoryResult<()> {
        let outcome = *self.booking_outcome.lock().unwrap();
        match outcome {
            BookingOutcome::Booked => {
                self.bookings.lock().unwrap().push(booking.clone());
                Ok(())
            },
            BookingOutcome::Conflict => Err(DirectoryError::Conflict),
            BookingOutcome::ServerError => Err(server_error()),
        }
    }

    async fn get_slots(
        &self,
        _token: &str,
        _group_id: u64,
        _professional_id: u64,
    ) -> DirectoryResult<SlotMap> {
        if self.slots_fail.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(self.slots.lock().unwrap().clone())
    }
}

/// Replays canned responses in order; answers "Hello!" once they run out.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<'a>(responses: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::default(),
        }
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn id(&self) -> &str {
        "scripted-1"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok("Hello!".to_string()),
        }
    }
}

/// A model whose every call panics.
pub struct PanickingModel;

#[async_trait]
impl LanguageModel for PanickingModel {
    fn name(&self) -> &str {
        "panicking"
    }

    fn id(&self) -> &str {
        "panicking-1"
    }

    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        panic!("model exploded");
    }
}
