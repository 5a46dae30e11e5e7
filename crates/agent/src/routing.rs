//! Lexical routing over model output.
//!
//! The support pipeline lets the model steer it with plain-text markers
//! (`escalate_to_returns`, `escalate_to_human`) and with call-like tokens such
//! as `search_faq("delivery time")`. All of that string matching lives here,
//! behind [`inspect`], which turns free text into a typed [`RouteDecision`].
//!
//! Every function in this module is pure. Not finding a marker is not an
//! error; it yields [`RouteDecision::NoAction`] and the caller keeps the text
//! it already has.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Name of the local FAQ lookup the Inquiry agent may "call".
pub const FAQ_LOOKUP_CALL: &str = "search_faq";

static FAQ_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"search_faq\(["'](.+?)["']\)"#).expect("FAQ call pattern is a valid regex")
});

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").expect("link pattern is a valid regex")
});

/// Fixed control tokens a model may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    EscalateToReturns,
    EscalateToHuman,
}

impl Marker {
    pub fn token(&self) -> &'static str {
        match self {
            Marker::EscalateToReturns => "escalate_to_returns",
            Marker::EscalateToHuman => "escalate_to_human",
        }
    }
}

/// Where an escalation marker sends the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTarget {
    Returns,
    Human,
}

/// What the orchestrator should do with a stage's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Keep the text as it is.
    NoAction,
    /// Answer from the local FAQ with this query.
    FaqLookup(String),
    /// Hand over to another stage.
    Escalate(EscalationTarget),
}

impl RouteDecision {
    pub fn matched(&self) -> bool {
        !matches!(self, RouteDecision::NoAction)
    }

    /// The substring pulled out of the text, if the decision carries one.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            RouteDecision::FaqLookup(query) => Some(query.as_str()),
            _ => None,
        }
    }

    /// Key of the stage to run next, if any.
    pub fn next_stage(&self) -> Option<&'static str> {
        match self {
            RouteDecision::NoAction => None,
            RouteDecision::FaqLookup(_) => Some("faq_lookup"),
            RouteDecision::Escalate(EscalationTarget::Returns) => Some("returns"),
            RouteDecision::Escalate(EscalationTarget::Human) => Some("escalation"),
        }
    }
}

/// Case-sensitive substring check for a control token.
pub fn contains_marker(text: &str, marker: Marker) -> bool {
    text.contains(marker.token())
}

/// The quoted argument of the first `search_faq("...")` or `search_faq('...')`.
pub fn extract_faq_query(text: &str) -> Option<&str> {
    FAQ_CALL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The quoted argument of the first `name("...")` call in `text`.
pub fn extract_call_argument<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    if name == FAQ_LOOKUP_CALL {
        return extract_faq_query(text);
    }
    let pattern = format!(r#"{}\(["'](.+?)["']\)"#, regex_lite::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Route one piece of model output.
///
/// Precedence: FAQ call token, then the returns marker, then the human
/// marker.
pub fn inspect(text: &str) -> RouteDecision {
    if let Some(query) = extract_faq_query(text) {
        return RouteDecision::FaqLookup(query.to_string());
    }
    if contains_marker(text, Marker::EscalateToReturns) {
        return RouteDecision::Escalate(EscalationTarget::Returns);
    }
    if contains_marker(text, Marker::EscalateToHuman) {
        return RouteDecision::Escalate(EscalationTarget::Human);
    }
    RouteDecision::NoAction
}

/// A `[title](url)` pair found in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

/// All well-formed markdown links with an http(s) target, in source order.
///
/// Malformed or partial links are skipped.
pub fn extract_links(text: &str) -> Vec<ResourceLink> {
    MARKDOWN_LINK
        .captures_iter(text)
        .map(|caps| ResourceLink {
            title: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}

/// Render links as a markdown bullet list, one `- [title](url)` per line.
pub fn render_links(links: &[ResourceLink]) -> String {
    links
        .iter()
        .map(|l| format!("- [{}]({})", l.title, l.url))
        .collect::<Vec<_>>()
        .join("\n")
}
