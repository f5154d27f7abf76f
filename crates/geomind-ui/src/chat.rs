//! Chat transcript and turn orchestration.
//!
//! A turn appends the user message, asks the backend, then appends exactly
//! one model message: the reply, or an apology marked as an error. `loading`
//! is true only between those two appends, and a submit during that gap is
//! ignored.

use std::sync::Arc;

use geomind_ai::{ChatBackend, ChatRequest, Message, Mode};
use tokio::sync::watch;

use crate::state::AppState;

/// Shown in place of a reply when the backend fails.
pub const APOLOGY: &str =
    "Sorry, I encountered an error connecting to the AI service. Please try again.";

/// A canned prompt behind a short label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub prompt: &'static str,
}

/// Offered while the transcript is empty.
pub const SUGGESTIONS: [QuickAction; 3] = [
    QuickAction {
        label: "Find coffee shops nearby",
        prompt: "Find the best coffee shops within walking distance",
    },
    QuickAction {
        label: "Check current weather",
        prompt: "What is the weather like at this location right now?",
    },
    QuickAction {
        label: "Plan a 3-day trip to Tokyo",
        prompt: "Plan a 3-day itinerary for a cultural trip to Tokyo",
    },
];

/// Offered in location search mode while no turn is in flight.
pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        label: "Explore Area",
        prompt: "What are the most interesting landmarks or attractions in this area?",
    },
    QuickAction {
        label: "Restaurants",
        prompt: "Recommend some highly rated restaurants nearby.",
    },
    QuickAction {
        label: "Coffee",
        prompt: "Where can I find good coffee nearby?",
    },
    QuickAction {
        label: "Landmarks",
        prompt: "What are some historical landmarks nearby?",
    },
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub loading: bool,
}

/// How a call to [`ChatSession::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The model replied and the reply was appended.
    Replied,
    /// The backend failed and the apology was appended.
    Failed,
    /// A turn was already in flight; nothing changed.
    Busy,
    /// The input was blank; nothing changed.
    Empty,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    app: Arc<AppState>,
    state: watch::Sender<ChatState>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, app: Arc<AppState>) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            backend,
            app,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn input_enabled(&self) -> bool {
        !self.is_loading()
    }

    pub fn placeholder(&self) -> &'static str {
        self.app.mode().placeholder()
    }

    /// Welcome suggestions, only while nothing has been said yet.
    pub fn suggestions(&self) -> &'static [QuickAction] {
        if self.state.borrow().messages.is_empty() {
            &SUGGESTIONS
        } else {
            &[]
        }
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        if self.app.mode() == Mode::LocationSearch && !self.is_loading() {
            &QUICK_ACTIONS
        } else {
            &[]
        }
    }

    /// Everything currently on offer, suggestions first.
    pub fn shortcuts(&self) -> Vec<QuickAction> {
        self.suggestions()
            .iter()
            .chain(self.quick_actions())
            .copied()
            .collect()
    }

    /// Run one turn. The request carries the transcript as it was before
    /// this turn's user message, the mode at submit time and the current
    /// location context.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Empty;
        }

        let mut history = None;
        self.state.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            history = Some(s.messages.clone());
            s.messages.push(Message::user(text));
            s.loading = true;
            true
        });
        let Some(history) = history else {
            tracing::debug!("Ignoring submit while a reply is pending");
            return SubmitOutcome::Busy;
        };
        let turn = PendingTurn {
            state: &self.state,
            finished: false,
        };

        let request = ChatRequest {
            prompt: text.to_string(),
            history,
            mode: self.app.mode(),
            location: self.app.location_context(),
        };
        tracing::info!(
            "Sending prompt in {} mode ({} prior messages)",
            request.mode.label(),
            request.history.len()
        );

        let (message, outcome) = match self.backend.send(request).await {
            Ok(reply) => (Message::model(reply), SubmitOutcome::Replied),
            Err(e) => {
                tracing::error!("Chat request failed: {}", e.message());
                (Message::error(APOLOGY), SubmitOutcome::Failed)
            }
        };

        turn.finish(message);
        outcome
    }
}

/// Closes a turn that was opened by `submit`. If the turn is abandoned
/// (the submit future dropped mid-request) the apology is appended on drop.
struct PendingTurn<'a> {
    state: &'a watch::Sender<ChatState>,
    finished: bool,
}

impl PendingTurn<'_> {
    fn finish(mut self, message: Message) {
        self.finished = true;
        close_turn(self.state, message);
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Chat turn abandoned before the reply arrived");
            close_turn(self.state, Message::error(APOLOGY));
        }
    }
}

fn close_turn(state: &watch::Sender<ChatState>, message: Message) {
    state.send_modify(|s| {
        s.messages.push(message);
        s.loading = false;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geomind_ai::{ChatReply, GroundingChunk, ServiceError};
    use geomind_core::Coordinates;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockBackend {
        requests: Mutex<Vec<ChatRequest>>,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn send(&self, request: ChatRequest) -> Result<ChatReply, ServiceError> {
            self.requests.lock().push(request);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(ServiceError::Provider {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(ChatReply {
                text: "Try Blue Bottle.".into(),
                grounding_chunks: Some(vec![GroundingChunk::Maps {
                    uri: "https://maps.google.com/?cid=1".into(),
                    title: "Blue Bottle".into(),
                    place_id: None,
                }]),
            })
        }
    }

    fn session(backend: Arc<MockBackend>) -> (ChatSession, Arc<AppState>) {
        let app = Arc::new(AppState::new(Coordinates::DEFAULT));
        (ChatSession::new(backend, Arc::clone(&app)), app)
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let backend = Arc::new(MockBackend::default());
        let (chat, _app) = session(Arc::clone(&backend));

        assert_eq!(chat.submit("coffee near me").await, SubmitOutcome::Replied);

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user());
        assert_eq!(messages[0].text, "coffee near me");
        assert!(!messages[1].is_error);
        assert_eq!(messages[1].sources().len(), 1);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let backend = Arc::new(MockBackend {
            fail: true,
            ..Default::default()
        });
        let (chat, _app) = session(backend);

        assert_eq!(chat.submit("hello").await, SubmitOutcome::Failed);

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hello");
        assert!(messages[1].is_error);
        assert_eq!(messages[1].text, APOLOGY);
        assert!(chat.input_enabled());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = Arc::new(MockBackend::default());
        let (chat, _app) = session(Arc::clone(&backend));

        assert_eq!(chat.submit("   ").await, SubmitOutcome::Empty);
        assert!(chat.messages().is_empty());
        assert!(backend.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_busy() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(MockBackend {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let (chat, _app) = session(Arc::clone(&backend));
        let chat = Arc::new(chat);

        let mut rx = chat.subscribe();
        let first = tokio::spawn({
            let chat = Arc::clone(&chat);
            async move { chat.submit("first").await }
        });
        rx.wait_for(|s| s.loading).await.unwrap();

        assert!(!chat.input_enabled());
        assert_eq!(chat.submit("second").await, SubmitOutcome::Busy);
        assert_eq!(chat.messages().len(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Replied);
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(backend.requests.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_turn_is_closed() {
        let backend = Arc::new(MockBackend {
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        });
        let (chat, _app) = session(Arc::clone(&backend));

        let result =
            tokio::time::timeout(Duration::from_secs(1), chat.submit("hello")).await;
        assert!(result.is_err());

        assert!(!chat.is_loading());
        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_error);
        assert_eq!(messages[1].text, APOLOGY);

        // The session accepts the next turn instead of reporting busy
        let next = tokio::time::timeout(Duration::from_secs(1), chat.submit("again")).await;
        assert!(next.is_err());
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(backend.requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_request_context() {
        let backend = Arc::new(MockBackend::default());
        let (chat, app) = session(Arc::clone(&backend));

        chat.submit("first").await;
        let panned = Coordinates::new(40.71, -74.0);
        app.set_focus(panned);
        chat.submit("second").await;

        let requests = backend.requests.lock();
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[0].location, Some(Coordinates::DEFAULT));

        let second = &requests[1];
        assert_eq!(second.prompt, "second");
        assert_eq!(second.mode, Mode::LocationSearch);
        assert_eq!(second.location, Some(panned));
        let history: Vec<_> = second.history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(history, vec!["first", "Try Blue Bottle."]);
    }

    #[tokio::test]
    async fn test_mode_at_submit_time_is_used() {
        let backend = Arc::new(MockBackend::default());
        let (chat, app) = session(Arc::clone(&backend));

        app.set_mode(Mode::DeepChat);
        chat.submit("Explain quantum tunneling").await;

        assert_eq!(backend.requests.lock()[0].mode, Mode::DeepChat);
    }

    #[tokio::test]
    async fn test_shortcut_visibility() {
        let backend = Arc::new(MockBackend::default());
        let (chat, app) = session(backend);

        assert_eq!(chat.suggestions().len(), 3);
        assert_eq!(chat.quick_actions().len(), 4);
        assert_eq!(chat.shortcuts().len(), 7);
        assert_eq!(chat.shortcuts()[0].label, "Find coffee shops nearby");

        app.set_mode(Mode::DeepChat);
        assert!(chat.quick_actions().is_empty());
        assert_eq!(chat.placeholder(), "Ask complex questions...");

        chat.submit("hi").await;
        assert!(chat.suggestions().is_empty());
        assert!(chat.shortcuts().is_empty());
    }
}
