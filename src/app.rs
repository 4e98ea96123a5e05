use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::client::{resolve, AskService};
use crate::drug::Outcome;
use crate::form::QueryForm;
use crate::ui::card::bundle_cards;

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// A finished request, sent back from the spawned task
#[derive(Debug)]
pub struct Completion {
    pub generation: u64,
    pub outcome: Outcome,
}

pub struct App {
    pub form: QueryForm,
    pub popup: Popup,
    pub endpoint: String,

    // Rows scrolled off the top of the results area. The limits are
    // recorded by the renderer, which knows the wrapped height.
    pub results_scroll: u16,
    pub results_max_scroll: u16,
    pub results_page: u16,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub should_quit: bool,

    service: Arc<dyn AskService>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl App {
    pub fn new(service: Arc<dyn AskService>, endpoint: impl Into<String>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            form: QueryForm::new(),
            popup: Popup::None,
            endpoint: endpoint.into(),
            results_scroll: 0,
            results_max_scroll: 0,
            results_page: 1,
            status_message: None,
            status_message_time: None,
            should_quit: false,
            service,
            completions_tx,
            completions_rx,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Number of cards the current outcome renders
    pub fn card_count(&self) -> usize {
        match self.form.outcome() {
            Some(Outcome::Bundle(bundle)) => bundle_cards(bundle).len(),
            _ => 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.popup != Popup::None {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter) {
                self.popup = Popup::None;
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.form.input.pop();
            }
            // Esc clears the question; on an empty question it quits
            KeyCode::Esc => {
                if self.form.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.form.input.clear();
                }
            }
            KeyCode::F(1) => self.popup = Popup::Help,

            // Scroll the results area by rows
            KeyCode::Down => self.scroll_by(1),
            KeyCode::Up => self.scroll_back(1),
            KeyCode::PageDown => self.scroll_by(self.results_page),
            KeyCode::PageUp => self.scroll_back(self.results_page),
            KeyCode::Home => self.results_scroll = 0,
            KeyCode::End => self.results_scroll = self.results_max_scroll,

            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.input.push(c);
            }
            _ => {}
        }
    }

    fn scroll_by(&mut self, n: u16) {
        self.results_scroll = self
            .results_scroll
            .saturating_add(n)
            .min(self.results_max_scroll);
    }

    fn scroll_back(&mut self, n: u16) {
        self.results_scroll = self.results_scroll.saturating_sub(n);
    }

    /// Start a new request cycle in the background
    fn submit(&mut self) {
        let Some(submission) = self.form.begin_submit() else {
            return;
        };
        self.results_scroll = 0;
        self.status_message = None;

        let service = Arc::clone(&self.service);
        let tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = resolve(service.ask(&submission.question).await);
            // Receiver only goes away when the app is shutting down
            let _ = tx.send(Completion {
                generation: submission.generation,
                outcome,
            });
        });
    }

    fn apply(&mut self, completion: Completion) {
        if self.form.complete(completion.generation, completion.outcome) {
            self.results_scroll = 0;
            let cards = self.card_count();
            if cards > 0 {
                self.set_status(format!("{} result{}", cards, if cards == 1 { "" } else { "s" }));
            }
        }
    }

    /// Pick up finished requests and expire old status messages
    pub fn tick(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
        }

        if let Some(shown_at) = self.status_message_time {
            if shown_at.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Wait for the next finished request
    #[cfg(test)]
    pub async fn settle(&mut self) {
        if let Some(completion) = self.completions_rx.recv().await {
            self.apply(completion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeService;
    use crate::form::Phase;

    const BUNDLE: &str = r#"{"brand": {"name": "Pepto-Bismol"},
        "generic": {"name": "Bismuth subsalicylate"},
        "alternatives": [{"name": "Kaopectate"}, {"name": "Imodium"}]}"#;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app_with(service: FakeService) -> (App, Arc<FakeService>) {
        let service = Arc::new(service);
        let app = App::new(service.clone(), "http://localhost:5050/ask");
        (app, service)
    }

    #[tokio::test]
    async fn test_enter_submits_and_renders_cards() {
        let (mut app, service) = app_with(FakeService::default().reply(Some(BUNDLE)));

        type_text(&mut app, "Pepto?");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.form.phase(), Phase::Loading);

        app.settle().await;

        assert_eq!(service.calls(), 1);
        assert_eq!(app.form.phase(), Phase::Answered);
        assert_eq!(app.card_count(), 4);
        assert_eq!(app.status_message.as_deref(), Some("4 results"));
    }

    #[tokio::test]
    async fn test_blank_enter_does_nothing() {
        let (mut app, service) = app_with(FakeService::default());

        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.form.phase(), Phase::Idle);
        tokio::task::yield_now().await;
        assert_eq!(service.calls(), 0);
    }

    #[test]
    fn test_editing_keys() {
        let (mut app, _) = app_with(FakeService::default());

        type_text(&mut app, "Advill");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.form.input, "Advil");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.form.input, "");
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_and_is_not_typed() {
        let (mut app, _) = app_with(FakeService::default());

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert!(app.should_quit);
        assert!(app.form.input.is_empty());
    }

    #[test]
    fn test_help_popup_swallows_keys() {
        let (mut app, _) = app_with(FakeService::default());

        app.handle_key(key(KeyCode::F(1)));
        assert_eq!(app.popup, Popup::Help);

        type_text(&mut app, "x");
        assert!(app.form.input.is_empty());

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.popup, Popup::None);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_scroll_is_clamped_to_rendered_rows() {
        let (mut app, _) = app_with(FakeService::default().reply(Some(BUNDLE)));
        type_text(&mut app, "Pepto");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;

        // What the renderer would record for a 10-row viewport over 25 rows
        app.results_max_scroll = 15;
        app.results_page = 10;

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.results_scroll, 1);

        app.handle_key(key(KeyCode::PageDown));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.results_scroll, 15);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.results_scroll, 14);

        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.results_scroll, 0);

        app.handle_key(key(KeyCode::End));
        assert_eq!(app.results_scroll, 15);
    }

    #[tokio::test]
    async fn test_new_outcome_resets_scroll() {
        let (mut app, _) = app_with(
            FakeService::default()
                .reply(Some(BUNDLE))
                .reply(Some(BUNDLE)),
        );
        type_text(&mut app, "Pepto");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;

        app.results_max_scroll = 5;
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.results_scroll, 5);

        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        assert_eq!(app.results_scroll, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_via_tick() {
        let (mut app, _) = app_with(FakeService::default().reply(None));
        type_text(&mut app, "Benadryl");
        app.handle_key(key(KeyCode::Enter));

        // Poll the way the event loop does
        for _ in 0..200 {
            app.tick();
            if !app.form.is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(app.form.phase(), Phase::Failed);
        assert_eq!(app.card_count(), 0);
    }
}
