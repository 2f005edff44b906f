// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Training lifecycle events reported on the system stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started,
    Succeeded,
    Failed,
    Completed,
}

impl LifecycleEvent {
    /// Checked in this order; the first match wins
    pub const PRECEDENCE: [LifecycleEvent; 4] = [
        LifecycleEvent::Started,
        LifecycleEvent::Succeeded,
        LifecycleEvent::Failed,
        LifecycleEvent::Completed,
    ];

    /// Name as it appears at the end of a stream field
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Started => "Started",
            LifecycleEvent::Succeeded => "Succeeded",
            LifecycleEvent::Failed => "Failed",
            LifecycleEvent::Completed => "Completed",
        }
    }

    /// Line shown to the operator when this event arrives for `action`
    pub fn announcement(&self, action: &str) -> Option<String> {
        match self {
            LifecycleEvent::Started => Some(format!(
                "Please, focus on the action {} for a few seconds.",
                action.to_uppercase()
            )),
            LifecycleEvent::Completed => Some(format!("Well done! You successfully trained {}", action)),
            LifecycleEvent::Succeeded | LifecycleEvent::Failed => None,
        }
    }

    /// First lifecycle event found in the message fields, if any
    pub fn classify<S: AsRef<str>>(fields: &[S]) -> Option<LifecycleEvent> {
        Self::PRECEDENCE
            .into_iter()
            .find(|event| is_event(fields, event.name()))
    }
}

/// True iff some field ends with `event` (case-sensitive suffix match)
pub fn is_event<S: AsRef<str>>(fields: &[S], event: &str) -> bool {
    fields.iter().any(|field| field.as_ref().ends_with(event))
}
