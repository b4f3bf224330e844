//! Prompt assembly.

use {receptionist_common::SenderKey, serde_json::Value};

/// Info pages the model may request with `INFO: <endpoint>`.
pub const INFO_ENDPOINTS: &[&str] = &[
    "payments/security",
    "payments/topupsure",
    "payments/debit_card",
    "payments/postepay",
    "payments/my_balance",
    "payments/contact_info",
    "payments/statement_info",
    "reviews/make",
    "reviews/read",
    "professionals/bio",
    "payment_method/paypal",
    "payment_method/debit_card",
    "payment_method/phone_credit",
    "899/cant_call",
    "debit_card/top_up",
    "debit_card/technical_problems",
    "end_user/welcome",
    "end_user/professional_disabled",
    "end_user/professional_changed_group",
    "end_user/cant_topup",
    "end_user/courses",
    "end_user/send_messages_academy",
    "end_user/is_service_free",
    "error/generic",
];

const INSTRUCTION_BODY: &str = "\
You are a chatbot used for booking appointments and for customers to ask about the company.
When returning the list of professionals or appointments, present them in a professional and organized way, not as raw JSON.
If user info is provided, use it to answer the user's request. If the user asks about their own information, answer from the provided user info; do not ask for it again.
If the user asks about the FRP or anything else, use the group and user info provided to answer correctly.
You will be given a list of professionals (ID, alias and other available fields). If the user asks about any professional (by name, ID or alias), use this list to answer.
If the professional is not in the list, reply: 'Professional isn't a part of this group. Please refer to this list and enlist all the professionals.'
You will also receive appointment details if available. Use them to answer appointment-related queries.
No need to greet the user again after the first time, just answer the question.
If the user wants to book an appointment, ask for the required details in this format:
Provide the Following Details
Professional ID : <id>
Date start : <date>
Time Start : <time>
IMPORTANT: Once you have the Professional ID, date and time, reply exclusively with: APPOINTMENT BOOK PROFESSIONAL ID <professional id> DATESTART <year-month-day> TIMESTART <hour:minute> USERID <the user's id>. Add no other text to this reply.
IMPORTANT: If the user directly provides booking details (e.g. Professional ID : 13, Date start : 2025-04-15, Time Start : 12:00), do NOT show professional schedules; respond immediately in the exact format above.
If the user asks for the free slots of a professional, reply exclusively with: PROFESSIONAL SLOT NEEDED <professional id>.
If the user asks about one of the following topics, reply only with 'INFO: <endpoint>' and nothing else:";

/// The built-in system instruction.
#[must_use]
pub fn default_instruction() -> String {
    let mut instruction = INSTRUCTION_BODY.to_string();
    for endpoint in INFO_ENDPOINTS {
        instruction.push_str("\nINFO: ");
        instruction.push_str(endpoint);
    }
    instruction
}

/// Everything known about a registered sender for one request.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub sender: SenderKey,
    pub text: String,
    pub user: Option<Value>,
    pub group: Option<Value>,
    pub professionals: Vec<Value>,
    pub appointments: Vec<Value>,
    pub personal_appointments: Vec<Value>,
}

impl ConversationContext {
    pub fn new(sender: SenderKey, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            user: None,
            group: None,
            professionals: Vec::new(),
            appointments: Vec::new(),
            personal_appointments: Vec::new(),
        }
    }
}

fn render_optional(value: Option<&Value>) -> String {
    value.map_or_else(|| Value::Null.to_string(), Value::to_string)
}

fn render_list(values: &[Value]) -> String {
    Value::Array(values.to_vec()).to_string()
}

/// Prompt for a registered sender, with the backend context rendered as JSON.
#[must_use]
pub fn render_prompt(instruction: &str, ctx: &ConversationContext) -> String {
    format!(
        "{instruction}\n\n\
         User Info:\n{}\n\n\
         Group Info:\n{}\n\n\
         Professionals List:\n{}\n\n\
         Appointments:\n{}\n\n\
         Personal Appointments:\n{}\n\n\
         User: {}",
        render_optional(ctx.user.as_ref()),
        render_optional(ctx.group.as_ref()),
        render_list(&ctx.professionals),
        render_list(&ctx.appointments),
        render_list(&ctx.personal_appointments),
        ctx.text,
    )
}

/// Prompt for a sender the backend does not know yet.
#[must_use]
pub fn render_unregistered_prompt(instruction: &str, text: &str) -> String {
    format!("{instruction}\n\nUser: {text}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn default_instruction_lists_every_endpoint() {
        let instruction = default_instruction();
        for endpoint in INFO_ENDPOINTS {
            assert!(instruction.contains(&format!("INFO: {endpoint}")));
        }
        assert!(instruction.contains("APPOINTMENT BOOK PROFESSIONAL ID"));
        assert!(instruction.contains("PROFESSIONAL SLOT NEEDED"));
    }

    #[test]
    fn registered_prompt_layout() {
        let mut ctx = ConversationContext::new(SenderKey::new("+1"), "who is Dr. Who?");
        ctx.user = Some(json!({"user": {"id": 42}}));
        ctx.professionals = vec![json!({"id": 13})];

        let prompt = render_prompt("BE NICE", &ctx);
        assert_eq!(
            prompt,
            "BE NICE\n\n\
             User Info:\n{\"user\":{\"id\":42}}\n\n\
             Group Info:\nnull\n\n\
             Professionals List:\n[{\"id\":13}]\n\n\
             Appointments:\n[]\n\n\
             Personal Appointments:\n[]\n\n\
             User: who is Dr. Who?"
        );
    }

    #[test]
    fn unregistered_prompt_layout() {
        assert_eq!(
            render_unregistered_prompt("BE NICE", "hi"),
            "BE NICE\n\nUser: hi"
        );
    }
}
