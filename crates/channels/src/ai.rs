//! AI content generation for outreach copy.
//!
//! Prompt assembly mirrors a production LLM integration: a fixed system
//! persona for B2B prospecting plus a user prompt built from contact and
//! campaign context. Generation failures are ordinary values — the node
//! processors fall back to template text and never abort on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use coldreach_core::config::AiConfig;

/// Writing tone requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Formal,
    Casual,
    Friendly,
    #[default]
    Professional,
}

impl Tone {
    fn label(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
        }
    }
}

/// A prior message in the conversation, for follow-up context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorMessage {
    pub outbound: bool,
    pub body: String,
}

/// Everything the generator needs to write one message body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_industry: Option<String>,
    /// What the message is trying to achieve.
    pub purpose: String,
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub is_follow_up: bool,
    pub step_number: Option<u32>,
    #[serde(default)]
    pub prior_messages: Vec<PriorMessage>,
}

#[derive(Error, Debug, Clone)]
#[error("generation failed: {0}")]
pub struct GenerationError(pub String);

/// Content generation boundary consumed by the action node processors.
pub trait AiGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// The fixed system persona sent with every generation request.
pub fn system_prompt(tone: Tone, max_words: usize) -> String {
    format!(
        "You are an expert B2B sales email writer for outbound prospecting.\n\
         Your goal is to write personalized, concise, effective messages that get replies.\n\
         \n\
         Rules:\n\
         - Keep the message short ({max_words} words maximum)\n\
         - Use a {} but approachable tone\n\
         - Skip generic openers like \"I hope this finds you well\"\n\
         - Lead with the value point\n\
         - Close with one clear, simple call to action\n\
         - Personalize with the contact details provided\n\
         - Output only the message body, never a subject line\n\
         - Use {{{{firstName}}}}, {{{{lastName}}}}, {{{{company}}}}, {{{{jobTitle}}}} \
           placeholders where personalization fits",
        tone.label()
    )
}

/// Assemble the per-request user prompt from the available context.
pub fn user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();

    if request.is_follow_up {
        prompt.push_str(&format!(
            "This is a FOLLOW-UP message (step {} of the sequence).\n\
             It must be shorter than the opener and reference the prior touch.\n\n",
            request.step_number.unwrap_or(2)
        ));
    } else {
        prompt.push_str("This is the OPENING message of the prospecting sequence.\n\n");
    }

    prompt.push_str(&format!("Message purpose: {}\n", request.purpose));

    if let Some(name) = &request.contact_first_name {
        prompt.push_str(&format!("Contact first name: {name}\n"));
    }
    if let Some(name) = &request.contact_last_name {
        prompt.push_str(&format!("Contact last name: {name}\n"));
    }
    if let Some(title) = &request.contact_job_title {
        prompt.push_str(&format!("Job title: {title}\n"));
    }
    if let Some(company) = &request.company_name {
        prompt.push_str(&format!("Company: {company}\n"));
    }
    if let Some(industry) = &request.company_industry {
        prompt.push_str(&format!("Industry: {industry}\n"));
    }

    if !request.prior_messages.is_empty() {
        prompt.push_str("\nConversation history:\n");
        for msg in &request.prior_messages {
            let who = if msg.outbound { "Me" } else { "Contact" };
            let excerpt: String = msg.body.chars().take(200).collect();
            prompt.push_str(&format!("{who}: {excerpt}...\n"));
        }
    }

    if let Some(instructions) = &request.custom_instructions {
        prompt.push_str(&format!("\nAdditional instructions: {instructions}\n"));
    }

    prompt.push_str("\nWrite the message body:");
    prompt
}

/// Deterministic generator standing in for an LLM provider.
/// In production: POST the system + user prompts to the configured model,
/// bounded by the AI timeout; the prompts produced by [`system_prompt`] and
/// [`user_prompt`] are exactly what would go on the wire.
pub struct ScriptedGenerator {
    config: AiConfig,
}

impl ScriptedGenerator {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}

impl AiGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let _system = system_prompt(request.tone, self.config.max_words);
        let _user = user_prompt(request);

        debug!(
            model = %self.config.model,
            purpose = %request.purpose,
            follow_up = request.is_follow_up,
            "Generating outreach copy"
        );
        metrics::counter!("ai.generations").increment(1);

        let greeting = match &request.contact_first_name {
            Some(name) => format!("Hi {name},"),
            None => "Hi,".to_string(),
        };
        let hook = match (&request.company_name, &request.contact_job_title) {
            (Some(company), Some(title)) => {
                format!("As {title} at {company}, this should land close to home:")
            }
            (Some(company), None) => format!("I noticed what {company} is building."),
            _ => "I'll keep this short.".to_string(),
        };
        let reference = if request.is_follow_up {
            " Circling back on my last note —"
        } else {
            ""
        };

        let body = format!(
            "{greeting}\n\n{hook}{reference} {}\n\nWorth a quick call this week?",
            request.purpose
        );
        Ok(clamp_words(&body, self.config.max_words))
    }
}

/// Cut a body to the configured word budget, keeping whole words. Bodies
/// already under budget come back untouched.
fn clamp_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        text.to_string()
    } else {
        kept.join(" ")
    }
}
