//! Execution event tracking.
//!
//! Warnings and fatals raised during a run accumulate in a [`Tracker`];
//! the driver writes the report once the run ends. Warnings never stop
//! execution, fatals do, and a clean run reports `No Events.`

use std::fmt;
use std::io;

use crate::message::{Code, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "Warning"),
            Severity::Fatal => write!(f, "Fatal"),
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone)]
pub struct Event {
    pub severity: Severity,
    pub detail: String,
}

/// Ordered event log for one run.
#[derive(Default)]
pub struct Tracker {
    events: Vec<Event>,
}

impl Tracker {
    pub fn new() -> Tracker {
        Tracker::default()
    }

    pub fn record_warning(&mut self, detail: impl Into<String>) {
        self.events.push(Event {
            severity: Severity::Warning,
            detail: detail.into(),
        });
    }

    pub fn record_fatal(&mut self, detail: impl Into<String>) {
        self.events.push(Event {
            severity: Severity::Fatal,
            detail: detail.into(),
        });
    }

    /// Record a finished statement's message if it carries an event.
    /// Success and control codes leave no trace.
    pub fn record_message(&mut self, message: &Message) {
        match message.code {
            Code::Warning => self.record_warning(message.detail.clone()),
            Code::Fatal(kind) => self.record_fatal(format!("{kind}: {}", message.detail)),
            _ => {}
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Render the report: one `Severity:detail` line per event, or
    /// `No Events.` for a clean run.
    pub fn report(&self) -> String {
        if self.events.is_empty() {
            return "No Events.\n".to_string();
        }
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&format!("{}:{}\n", event.severity, event.detail));
        }
        out
    }

    pub fn write_report(&self, w: &mut impl io::Write) -> io::Result<()> {
        w.write_all(self.report().as_bytes())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
