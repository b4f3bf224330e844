//! Directive execution.

use std::sync::Arc;

use {
    chrono::{NaiveDate, NaiveTime},
    receptionist_config::BookingIdentity,
    receptionist_directory::{BookingRequest, DirectoryService},
    tracing::{debug, info, warn},
};

use crate::{
    directives::Directive,
    error::{Error, Result},
    slots::format_slots,
};

pub const BOOKING_FAILED_REPLY: &str =
    "Sorry, I couldn't book the appointment. Please try again later.";
pub const INFO_UNAVAILABLE_REPLY: &str =
    "Sorry, I couldn't retrieve the information. Please try again later.";
pub const INFO_FETCH_FAILED_REPLY: &str =
    "There was an issue fetching the information. Please try again later.";
pub const NO_INFO_MESSAGE_REPLY: &str = "No message available.";
pub const NO_SLOTS_REPLY: &str = "No available slots found for the selected professional.";
pub const SLOTS_FAILED_REPLY: &str =
    "Sorry, there was an error fetching available slots. Please try again later.";

/// Executes directives against the scheduling backend.
pub struct ActionDispatcher {
    directory: Arc<dyn DirectoryService>,
    group_id: u64,
    booking_identity: BookingIdentity,
}

impl ActionDispatcher {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        group_id: u64,
        booking_identity: BookingIdentity,
    ) -> Self {
        Self {
            directory,
            group_id,
            booking_identity,
        }
    }

    /// Run `directive` and return the reply text.
    ///
    /// `sender_user_id` is the backend id of the sender, when known. Backend
    /// failures never escape; each maps to its own reply.
    pub async fn dispatch(
        &self,
        token: &str,
        directive: Directive,
        sender_user_id: Option<u64>,
    ) -> String {
        debug!(kind = directive.kind(), "dispatching directive");
        match directive {
            Directive::BookAppointment {
                professional_id,
                date_start,
                time_start,
                user_id,
            } => {
                let user_id = self.booking_user_id(user_id, sender_user_id);
                match self
                    .book(token, professional_id, &date_start, &time_start, user_id)
                    .await
                {
                    Ok(reply) => reply,
                    Err(e @ (Error::Validation(_) | Error::BookingConflict)) => {
                        warn!(error = %e, professional_id, "booking not made");
                        e.user_message().to_string()
                    },
                    Err(e) => {
                        warn!(error = %e, professional_id, "booking failed");
                        BOOKING_FAILED_REPLY.to_string()
                    },
                }
            },
            Directive::InfoRequest { endpoint } => self.fetch_info(token, &endpoint).await,
            Directive::SlotQuery { professional_id } => {
                self.fetch_slots(token, professional_id).await
            },
            Directive::PlainReply { text } => text,
        }
    }

    /// Look up an info page and turn it into reply text.
    pub async fn fetch_info(&self, token: &str, endpoint: &str) -> String {
        match self.directory.get_info(token, endpoint).await {
            Ok(page) if page.is_ok() => page
                .message
                .unwrap_or_else(|| NO_INFO_MESSAGE_REPLY.to_string()),
            Ok(page) => {
                warn!(endpoint, status = ?page.status, "info page not available");
                INFO_UNAVAILABLE_REPLY.to_string()
            },
            Err(e) => {
                warn!(endpoint, error = %e, "info lookup failed");
                INFO_FETCH_FAILED_REPLY.to_string()
            },
        }
    }

    fn booking_user_id(&self, directive_user_id: u64, sender_user_id: Option<u64>) -> u64 {
        if let Some(sender_id) = sender_user_id
            && sender_id != directive_user_id
        {
            warn!(
                directive_user_id,
                sender_user_id = sender_id,
                identity = ?self.booking_identity,
                "booking directive names a different user than the sender"
            );
        }
        match (self.booking_identity, sender_user_id) {
            (BookingIdentity::Session, Some(sender_id)) => sender_id,
            _ => directive_user_id,
        }
    }

    async fn book(
        &self,
        token: &str,
        professional_id: u64,
        date: &str,
        time: &str,
        user_id: u64,
    ) -> Result<String> {
        let (date, time) = validate_date_time(date, time)?;
        let booking = BookingRequest {
            group_id: self.group_id,
            professional_id,
            user_id,
            date_start: date,
            time_start: time,
        };
        self.directory
            .book_appointment(token, &booking)
            .await
            .map_err(|e| Error::upstream("booking", e))?;
        info!(professional_id, user_id, date = %booking.date_start, time = %booking.time_start, "appointment booked");
        Ok(format!(
            "Your appointment has been successfully booked with Professional ID {professional_id} \
             for {} at {}.",
            booking.date_start, booking.time_start
        ))
    }

    async fn fetch_slots(&self, token: &str, professional_id: u64) -> String {
        match self
            .directory
            .get_slots(token, self.group_id, professional_id)
            .await
        {
            Ok(slots) => {
                let formatted = format_slots(&slots);
                if formatted.is_empty() {
                    NO_SLOTS_REPLY.to_string()
                } else {
                    format!(
                        "Here are the available slots for Professional ID {professional_id}:\n{formatted}"
                    )
                }
            },
            Err(e) => {
                warn!(professional_id, error = %e, "slot lookup failed");
                SLOTS_FAILED_REPLY.to_string()
            },
        }
    }
}

/// Check `YYYY-MM-DD` / `HH:MM` against the calendar and normalize them.
pub fn validate_date_time(date: &str, time: &str) -> Result<(String, String)> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("date {date:?}: {e}")))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| Error::Validation(format!("time {time:?}: {e}")))?;
    Ok((
        date.format("%Y-%m-%d").to_string(),
        time.format("%H:%M").to_string(),
    ))
}
