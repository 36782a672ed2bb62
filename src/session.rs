//! Conversation session: an append-only message list plus the in-flight flag
//! that admits one outbound request at a time.

use crate::llm::chat::{ ChatClient, ClientError };
use crate::models::chat::{ GenerateResponse, Message };

use log::{ debug, info, warn };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    InFlightChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Blank,
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Answered(Message),
    Failed(Message),
}

impl SubmitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SubmitOutcome::Failed(_))
    }
}

enum Resolution {
    Reply(GenerateResponse),
    Failure(String),
}

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    in_flight: bool,
    last_id: u64,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn append(&mut self, message: Message) {
        self.messages.push(message.clone());
        self.emit(SessionEvent::MessageAppended(message));
    }

    fn set_in_flight(&mut self, value: bool) {
        self.in_flight = value;
        self.emit(SessionEvent::InFlightChanged(value));
    }
}

pub struct ConversationSession {
    id: String,
    client: Arc<dyn ChatClient>,
    state: Mutex<SessionState>,
}

impl ConversationSession {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        let id = Uuid::new_v4().to_string();
        info!("Conversation session {} talking to {}", id, client.endpoint());
        Self {
            id,
            client,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Sends `text` (trimmed) as one request and records the outcome.
    ///
    /// Blank text, or text submitted while another request is pending, is
    /// dropped without touching the conversation.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let prompt = text.trim();
        if prompt.is_empty() {
            debug!("[{}] Ignoring blank submission", self.id);
            return SubmitOutcome::Ignored(IgnoreReason::Blank);
        }

        let Some(guard) = self.begin(prompt) else {
            debug!("[{}] Ignoring submission while a request is in flight", self.id);
            return SubmitOutcome::Ignored(IgnoreReason::InFlight);
        };

        let result = self.client.generate(prompt).await;
        guard.finish(result)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state().in_flight
    }

    pub fn len(&self) -> usize {
        self.state().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().messages.is_empty()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().subscribers.push(tx);
        rx
    }

    // A panic elsewhere while holding the lock leaves the list and flag
    // consistent, so the poisoned state is still usable.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, prompt: &str) -> Option<InFlightGuard<'_>> {
        let mut state = self.state();
        if state.in_flight {
            return None;
        }
        let id = state.next_id();
        debug!("[{}] Submitting message {} ({} chars)", self.id, id, prompt.chars().count());
        state.append(Message::user(id, prompt));
        state.set_in_flight(true);
        Some(InFlightGuard {
            session: self,
            resolved: false,
        })
    }

    fn resolve(&self, resolution: Resolution) -> Message {
        let mut state = self.state();
        let id = state.next_id();
        let message = match resolution {
            Resolution::Reply(reply) => {
                debug!(
                    "[{}] Message {} answered by {}",
                    self.id,
                    id,
                    reply.model_used.as_deref().unwrap_or("unknown model")
                );
                Message::assistant(id, reply.response, reply.model_used)
            }
            Resolution::Failure(text) => {
                warn!("[{}] Message {} failed: {}", self.id, id, text);
                Message::error(id, text)
            }
        };
        state.append(message.clone());
        state.set_in_flight(false);
        message
    }

    fn failure_text(&self, err: &ClientError) -> String {
        format!(
            "Connection error: {}. Check that the API is running at {}",
            err,
            self.client.endpoint()
        )
    }
}

/// Clears the in-flight flag exactly once: through `finish`, or on drop if the
/// submitting future is dropped or the client panics first.
struct InFlightGuard<'a> {
    session: &'a ConversationSession,
    resolved: bool,
}

impl InFlightGuard<'_> {
    fn finish(mut self, result: Result<GenerateResponse, ClientError>) -> SubmitOutcome {
        self.resolved = true;
        match result {
            Ok(reply) => SubmitOutcome::Answered(self.session.resolve(Resolution::Reply(reply))),
            Err(e) => {
                let text = self.session.failure_text(&e);
                SubmitOutcome::Failed(self.session.resolve(Resolution::Failure(text)))
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            let text = format!(
                "Request abandoned before {} answered",
                self.session.client.endpoint()
            );
            self.session.resolve(Resolution::Failure(text));
        }
    }
}
