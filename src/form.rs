//! The question form: input text, whether a request is in flight, and the
//! last thing the server told us.
//!
//! Every submission gets a generation number. A completion is only applied
//! if it belongs to the latest submission, so a slow earlier reply can never
//! overwrite the state of a newer one.

use crate::client::{resolve, AskService};
use crate::drug::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Answered,
    Failed,
}

/// A question that has been accepted and needs to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub generation: u64,
    pub question: String,
}

#[derive(Debug, Default)]
pub struct QueryForm {
    pub input: String,
    in_flight: bool,
    outcome: Option<Outcome>,
    generation: u64,
}

impl QueryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn phase(&self) -> Phase {
        match (&self.outcome, self.in_flight) {
            (_, true) => Phase::Loading,
            (Some(o), false) if o.is_error() => Phase::Failed,
            (Some(_), false) => Phase::Answered,
            (None, false) => Phase::Idle,
        }
    }

    /// Start a new cycle. Returns None (and touches nothing) for blank input.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        let question = self.input.trim();
        if question.is_empty() {
            return None;
        }
        let question = question.to_string();

        self.generation += 1;
        self.outcome = None;
        self.in_flight = true;

        Some(Submission {
            generation: self.generation,
            question,
        })
    }

    /// Apply a finished request. Stale generations are dropped; returns whether it was applied.
    pub fn complete(&mut self, generation: u64, outcome: Outcome) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Ignoring stale reply for request {} (latest is {})",
                generation,
                self.generation
            );
            return false;
        }

        self.in_flight = false;
        self.outcome = Some(outcome);
        true
    }

    /// Submit and wait for the reply in one go
    pub async fn submit(&mut self, service: &dyn AskService) -> bool {
        let Some(submission) = self.begin_submit() else {
            return false;
        };

        let outcome = resolve(service.ask(&submission.question).await);
        self.complete(submission.generation, outcome)
    }
}
