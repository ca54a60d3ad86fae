//! Terminal rendering of flow events.

pub mod qr;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use crossterm::style::{StyledContent, Stylize};
use tracing::warn;

use crate::auth::{ExpiryReason, FlowEvent, FlowEventSink, FlowOutcome, TokenSet};

/// Turns [`FlowEvent`]s and the final outcome into terminal lines.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPresenter {
    pub styled: bool,
    pub show_qr: bool,
    pub json: bool,
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self {
            styled: true,
            show_qr: true,
            json: false,
        }
    }
}

/// `ABCD-EFGH` becomes `A B C D - E F G H`.
pub fn space_user_code(user_code: &str) -> String {
    user_code
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole minutes when exact, otherwise one decimal place.
pub fn format_minutes(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs % 60 == 0 {
        format!("{}", secs / 60)
    } else {
        format!("{:.1}", secs as f64 / 60.0)
    }
}

impl TerminalPresenter {
    pub fn plain() -> Self {
        Self {
            styled: false,
            ..Self::default()
        }
    }

    fn paint(&self, text: &str, f: fn(StyledContent<String>) -> StyledContent<String>) -> String {
        if self.styled {
            f(text.to_string().stylize()).to_string()
        } else {
            text.to_string()
        }
    }

    fn italic(&self, text: &str) -> String {
        self.paint(text, |s| s.italic())
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    fn failure(&self, text: &str) -> String {
        self.paint(text, |s| s.red().bold().italic())
    }

    pub fn starting(&self) -> String {
        self.italic("Starting...")
    }

    /// Lines for one event; empty when the event has no visible form.
    pub fn render_event(&self, event: &FlowEvent) -> Vec<String> {
        match event {
            FlowEvent::UserCode {
                verification_uri,
                user_code,
                qr_payload,
                expires_in,
            } => {
                let mut lines = vec![
                    format!("Open {} and enter", self.bold(verification_uri)),
                    "\n\n".to_string(),
                    format!(
                        "=======>       {}       <=======",
                        self.bold(&space_user_code(user_code))
                    ),
                    self.italic("note: you may omit whitespace and special characters"),
                    self.italic("      like dashes. You may also enter lowercase."),
                ];
                if self.show_qr {
                    match qr::render(qr_payload) {
                        Ok(code) => {
                            lines.push(
                                "\n\nor scan this code with your Camera app to skip entering the code"
                                    .to_string(),
                            );
                            lines.push(code);
                        }
                        Err(e) => warn!(error = %e, "could not encode verification URL as QR code"),
                    }
                }
                lines.push(self.italic(&format!(
                    "note: this code expires in {} minutes",
                    format_minutes(*expires_in)
                )));
                lines
            }
            FlowEvent::PollingStarted { interval } => vec![self.paint(
                &format!(
                    "\n\nDevice is starting to poll for results every {} seconds",
                    interval.as_secs()
                ),
                |s| s.bold().italic(),
            )],
            FlowEvent::Pending { .. } => vec![self.italic("End-User authorization Pending ...")],
            FlowEvent::SlowDown { interval } => vec![self.italic(&format!(
                "Server asked to slow down, polling every {} seconds",
                interval.as_secs()
            ))],
            FlowEvent::Authorized => Vec::new(),
            FlowEvent::Denied => vec![self.failure("End-User cancelled the flow")],
            FlowEvent::Expired { reason } => {
                let text = match reason {
                    ExpiryReason::Server => "The flow has expired",
                    ExpiryReason::LocalDeadline => {
                        "The flow has expired (the code's validity window elapsed)"
                    }
                };
                vec![self.failure(text)]
            }
            FlowEvent::ProtocolError { error, description } => vec![self.failure(&format!(
                "error = {error}; error_description = {}",
                description.as_deref().unwrap_or("none")
            ))],
        }
    }

    /// Final output; only a successful outcome prints anything here because
    /// the other outcomes were already reported as events.
    pub fn render_outcome(&self, outcome: &FlowOutcome) -> Vec<String> {
        match outcome.tokens() {
            Some(tokens) => self.render_tokens(tokens),
            None => Vec::new(),
        }
    }

    pub fn render_tokens(&self, tokens: &TokenSet) -> Vec<String> {
        self.render_tokens_at(tokens, Utc::now())
    }

    /// Token output for a response received at `issued_at`.
    pub fn render_tokens_at(&self, tokens: &TokenSet, issued_at: DateTime<Utc>) -> Vec<String> {
        if self.json {
            return match serde_json::to_string_pretty(tokens) {
                Ok(json) => vec![json],
                Err(e) => {
                    warn!(error = %e, "could not serialize token set");
                    vec![tokens.access_token.clone()]
                }
            };
        }
        let mut lines = vec![
            self.bold("\n\nSuccessful Token Response"),
            "\nAccess Token:\n".to_string(),
            tokens.access_token.clone(),
        ];
        if let Some(expires_at) = tokens.expires_at(issued_at) {
            lines.push(format!(
                "\nExpires at: {}",
                expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        lines
    }

    /// Event sink printing every rendered line to stdout.
    pub fn sink(self) -> FlowEventSink {
        Arc::new(move |event: FlowEvent| {
            for line in self.render_event(&event) {
                println!("{line}");
            }
        })
    }
}
