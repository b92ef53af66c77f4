// File: sonequabot-common/src/models/overlay.rs

use serde_json::{json, Value};

/// A named push for the overlay hub.
///
/// Every task is delivered as an invocation of the hub method `SendTask`
/// whose first argument is the task name and whose second is the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayTask {
    /// Raw per-message sentiment label, lower-case.
    SendSentiment(String),
    /// Smoothed chat mood gauge.
    SendGaugeSentiment(f64),
    /// A user joined the channel.
    SendUserAppear(String),
    /// A visual command fired; the event name is the task name, the payload is empty.
    Visual(String),
}

impl OverlayTask {
    pub fn task_name(&self) -> &str {
        match self {
            OverlayTask::SendSentiment(_) => "SendSentiment",
            OverlayTask::SendGaugeSentiment(_) => "SendGaugeSentiment",
            OverlayTask::SendUserAppear(_) => "SendUserAppear",
            OverlayTask::Visual(event) => event.as_str(),
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OverlayTask::SendSentiment(label) => json!(label),
            OverlayTask::SendGaugeSentiment(value) => json!(value),
            OverlayTask::SendUserAppear(user) => json!(user),
            OverlayTask::Visual(_) => json!(""),
        }
    }

    /// Arguments of the `SendTask` hub invocation.
    pub fn arguments(&self) -> Vec<Value> {
        vec![json!(self.task_name()), self.payload()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_events_carry_an_empty_payload() {
        let task = OverlayTask::Visual("SendDevastante".into());
        assert_eq!(task.arguments(), vec![json!("SendDevastante"), json!("")]);
    }

    #[test]
    fn gauge_is_sent_as_a_number() {
        let task = OverlayTask::SendGaugeSentiment(0.25);
        assert_eq!(task.task_name(), "SendGaugeSentiment");
        assert_eq!(task.payload(), json!(0.25));
    }
}
