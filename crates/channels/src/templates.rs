//! Template variable substitution for outreach copy.
//!
//! Supports the standard contact placeholders (`{{firstName}}`,
//! `{{lastName}}`, `{{email}}`, `{{jobTitle}}`, `{{company}}`,
//! `{{companyName}}`) plus per-enrollment custom variables. Unknown standard
//! fields render as the empty string so a half-filled contact never leaks a
//! raw placeholder into a sent message.

use std::collections::HashMap;

use coldreach_core::types::Contact;

/// Render `text` against a contact and optional custom variables.
pub fn render(text: &str, contact: &Contact, custom_variables: &HashMap<String, String>) -> String {
    let company_name = contact
        .company
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("");

    let mut result = text.to_string();
    result = result.replace("{{firstName}}", &contact.first_name);
    result = result.replace("{{lastName}}", &contact.last_name);
    result = result.replace("{{email}}", contact.email.as_deref().unwrap_or(""));
    result = result.replace("{{jobTitle}}", contact.job_title.as_deref().unwrap_or(""));
    result = result.replace("{{company}}", company_name);
    result = result.replace("{{companyName}}", company_name);

    for (key, value) in custom_variables {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }

    result
}
