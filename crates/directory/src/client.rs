//! Directory service trait and `reqwest`-backed implementation.

use std::time::Duration;

use {
    async_trait::async_trait,
    receptionist_common::text::truncate_chars,
    receptionist_config::DirectoryConfig,
    reqwest::{Response, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde_json::{Value, json},
    tracing::{debug, warn},
};

use crate::{
    error::{Context, Error, Result},
    types::{
        AppointmentsResponse, AuthTokens, BookingRequest, InfoPage, LoginResponse, NewUser,
        ProfessionalsResponse, SlotMap, SlotsResponse, UserRecord,
    },
};

/// Body message the backend sends with a 404 for unknown phone numbers.
const USER_NOT_FOUND_MESSAGE: &str = "USER NOT FOUND.";

/// Trait for scheduling backend interactions.
///
/// This allows faking the backend in tests without a real server. Every call
/// except [`authenticate`](Self::authenticate) takes the bearer token obtained
/// from it.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Log in with the service account.
    async fn authenticate(&self) -> Result<AuthTokens>;

    /// Look up a user by phone number. `Ok(None)` when the backend does not
    /// know the number.
    async fn get_user(&self, token: &str, phone: &str) -> Result<Option<UserRecord>>;

    async fn register_user(&self, token: &str, user: &NewUser) -> Result<Value>;

    async fn get_group(&self, token: &str, group_id: u64) -> Result<Value>;

    async fn list_professionals(&self, token: &str, group_id: u64) -> Result<Vec<Value>>;

    async fn list_appointments(&self, token: &str, user_id: u64, group_id: u64)
    -> Result<Vec<Value>>;

    async fn list_personal_appointments(
        &self,
        token: &str,
        user_id: u64,
        group_id: u64,
    ) -> Result<Vec<Value>>;

    /// Fetch an `info/<endpoint>` page.
    async fn get_info(&self, token: &str, endpoint: &str) -> Result<InfoPage>;

    /// Book a slot. [`Error::Conflict`] when the slot is already taken.
    async fn book_appointment(&self, token: &str, booking: &BookingRequest) -> Result<()>;

    async fn get_slots(&self, token: &str, group_id: u64, professional_id: u64)
    -> Result<SlotMap>;
}

/// Validate an info endpoint before it is spliced into a URL path.
///
/// Only ASCII letters, digits, `_`, `-` and `/` are allowed, which also rules
/// out `..` traversal and query strings.
pub fn validate_info_endpoint(endpoint: &str) -> Result<&str> {
    let endpoint = endpoint.trim();
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/');
    if endpoint.is_empty() || !endpoint.chars().all(allowed) || endpoint.contains("..") {
        return Err(Error::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(endpoint)
}

/// JSON-over-HTTP scheduling backend client.
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: Secret<String>,
}

impl HttpDirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn fetch_appointments(
        &self,
        token: &str,
        user_id: u64,
        group_id: u64,
        kind: &'static str,
    ) -> Result<Vec<Value>> {
        debug!(user_id, group_id, kind, "fetching appointments");
        let resp = self
            .client
            .get(self.url(&format!("appointments/{user_id}")))
            .bearer_auth(token)
            .json(&json!({ "groupId": group_id }))
            .send()
            .await?;
        let body: AppointmentsResponse = ensure_success(resp).await?.json().await?;
        debug!(kind, count = body.appointments.len(), "appointments fetched");
        Ok(body.appointments)
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryClient {
    async fn authenticate(&self) -> Result<AuthTokens> {
        debug!(username = %self.username, "logging in to directory");
        let resp = self
            .client
            .post(self.url("auth/login"))
            .json(&json!({
                "username": self.username,
                "password": self.password.expose_secret(),
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Auth(format!("login returned HTTP {status}")));
        }

        let login: LoginResponse = resp.json().await?;
        let auth = login
            .auth
            .ok_or_else(|| Error::Auth("login response has no auth object".into()))?;
        match (auth.access_token, auth.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(AuthTokens {
                    access_token: Secret::new(access),
                    refresh_token: Secret::new(refresh),
                })
            },
            _ => Err(Error::Auth("login response is missing tokens".into())),
        }
    }

    async fn get_user(&self, token: &str, phone: &str) -> Result<Option<UserRecord>> {
        let url = self.url(&format!("users/{}", urlencoding::encode(phone)));
        let resp = self.client.get(url).bearer_auth(token).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_owned));
            if message.as_deref() == Some(USER_NOT_FOUND_MESSAGE) {
                debug!(phone, "user not found");
                return Ok(None);
            }
            return Err(Error::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                body,
            });
        }

        let user: Value = ensure_success(resp).await?.json().await?;
        debug!(phone, "user fetched");
        Ok(Some(UserRecord(user)))
    }

    async fn register_user(&self, token: &str, user: &NewUser) -> Result<Value> {
        debug!(phone = %user.phone_number, group_id = user.group_id, "registering user");
        let resp = self
            .client
            .post(self.url("users"))
            .bearer_auth(token)
            .json(user)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn get_group(&self, token: &str, group_id: u64) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(&format!("groups/{group_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn list_professionals(&self, token: &str, group_id: u64) -> Result<Vec<Value>> {
        let resp = self
            .client
            .get(self.url("professionals"))
            .bearer_auth(token)
            .json(&json!({ "groupId": group_id }))
            .send()
            .await?;
        let body: ProfessionalsResponse = ensure_success(resp).await?.json().await?;
        debug!(count = body.professionals.len(), "professionals fetched");
        Ok(body.professionals)
    }

    async fn list_appointments(
        &self,
        token: &str,
        user_id: u64,
        group_id: u64,
    ) -> Result<Vec<Value>> {
        self.fetch_appointments(token, user_id, group_id, "group")
            .await
    }

    async fn list_personal_appointments(
        &self,
        token: &str,
        user_id: u64,
        group_id: u64,
    ) -> Result<Vec<Value>> {
        self.fetch_appointments(token, user_id, group_id, "personal")
            .await
    }

    async fn get_info(&self, token: &str, endpoint: &str) -> Result<InfoPage> {
        let endpoint = validate_info_endpoint(endpoint)?;
        debug!(endpoint, "fetching info page");
        let resp = self
            .client
            .get(self.url(&format!("info/{endpoint}")))
            .bearer_auth(token)
            .send()
            .await?;
        let page: InfoPage = ensure_success(resp).await?.json().await?;
        page.status
            .as_ref()
            .with_context(|| format!("info page {endpoint} has no status"))?;
        Ok(page)
    }

    async fn book_appointment(&self, token: &str, booking: &BookingRequest) -> Result<()> {
        debug!(
            professional_id = booking.professional_id,
            user_id = booking.user_id,
            date = %booking.date_start,
            time = %booking.time_start,
            "booking appointment"
        );
        let resp = self
            .client
            .post(self.url("appointments"))
            .bearer_auth(token)
            .json(booking)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            warn!(
                professional_id = booking.professional_id,
                "booking rejected, slot taken"
            );
            return Err(Error::Conflict);
        }
        ensure_success(resp).await?;
        Ok(())
    }

    async fn get_slots(
        &self,
        token: &str,
        group_id: u64,
        professional_id: u64,
    ) -> Result<SlotMap> {
        let resp = self
            .client
            .get(self.url(&format!("slots/{group_id}")))
            .query(&[("professionalId", professional_id)])
            .bearer_auth(token)
            .send()
            .await?;
        let body: SlotsResponse = ensure_success(resp).await?.json().await?;
        Ok(body.into_slot_map())
    }
}

/// Turn a non-success response into [`Error::Status`].
async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = %status, body = %truncate_chars(&body, 200), "directory request failed");
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}
