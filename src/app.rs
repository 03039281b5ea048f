use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError, LoginOk, ReportOk};

pub const CHAT_ERROR_REPLY: &str = "Sorry, there was an error.";
pub const NETWORK_ERROR_REPLY: &str = "Network error.";
pub const REPORT_ERROR_REPLY: &str = "Error generating report.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const REPORT_MARKER: &str = "📊 Generate Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    /// Spelling the backend uses in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Role::Patient => "Hello! How can I help you today?",
            Role::Doctor => "Hello Doctor! How can I assist you today?",
        }
    }
}

/// Who the current session belongs to. Lives only inside the active route;
/// nothing outlives a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub login_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat(Identity),
}

impl Route {
    /// Path → route dispatch. Any id string is accepted: there is no check
    /// that the id belongs to a session that actually logged in, so opening
    /// `/doctor/xyz` directly works. That matches the product as shipped.
    pub fn parse(path: &str) -> Option<Route> {
        let mut parts = path.strip_prefix('/')?.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(""), None, None) | (Some("login"), None, None) => Some(Route::Login),
            (Some("patient"), Some(id), None) if !id.is_empty() => Some(Route::Chat(Identity {
                login_id: id.to_string(),
                role: Role::Patient,
            })),
            (Some("doctor"), Some(id), None) if !id.is_empty() => Some(Route::Chat(Identity {
                login_id: id.to_string(),
                role: Role::Doctor,
            })),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Chat(identity) => match identity.role {
                Role::Patient => format!("/patient/{}", identity.login_id),
                Role::Doctor => format!("/doctor/{}", identity.login_id),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// A single-line text input with a character-based cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    pub text: String,
    pub cursor: usize,
}

impl InputField {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    LoginId,
    Password,
}

pub struct LoginState {
    pub login_id: InputField,
    pub password: InputField,
    pub tab: Role,
    pub focus: LoginField,
    pub message: String,
    pub submitting: bool,
    pub pending: Option<JoinHandle<Result<LoginOk, ApiError>>>,
}

impl LoginState {
    pub fn new() -> Self {
        Self {
            login_id: InputField::default(),
            password: InputField::default(),
            tab: Role::Patient,
            focus: LoginField::LoginId,
            message: String::new(),
            submitting: false,
            pending: None,
        }
    }

    pub fn focused_field(&mut self) -> &mut InputField {
        match self.focus {
            LoginField::LoginId => &mut self.login_id,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::LoginId => LoginField::Password,
            LoginField::Password => LoginField::LoginId,
        };
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            Role::Patient => Role::Doctor,
            Role::Doctor => Role::Patient,
        };
    }
}

pub enum Pending {
    Chat(JoinHandle<Result<String, ApiError>>),
    Report(JoinHandle<Result<ReportOk, ApiError>>),
}

impl Pending {
    fn is_finished(&self) -> bool {
        match self {
            Pending::Chat(task) => task.is_finished(),
            Pending::Report(task) => task.is_finished(),
        }
    }
}

pub struct ChatState {
    pub identity: Identity,
    pub transcript: Vec<ChatMessage>,
    pub input: InputField,
    pub loading: bool,
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub pending: Option<Pending>,
}

impl ChatState {
    pub fn new(identity: Identity) -> Self {
        let greeting = ChatMessage::bot(identity.role.greeting());
        Self {
            identity,
            transcript: vec![greeting],
            input: InputField::default(),
            loading: false,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            pending: None,
        }
    }

    /// Apply a resolved `send`. The reply is already the final bot text, so
    /// every outcome lands here; the input and loading resets are
    /// unconditional.
    pub fn resolve_chat(&mut self, reply: String) {
        self.transcript.push(ChatMessage::bot(reply));
        self.input.clear();
        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Apply a resolved report. Unlike `resolve_chat` the input field is
    /// left alone.
    pub fn resolve_report(&mut self, reply: String) {
        self.transcript.push(ChatMessage::bot(reply));
        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Number of display lines the transcript occupies at the given wrap
    /// width: a sender label, the wrapped content, and a blank separator per
    /// message, plus the typing indicator while loading.
    pub fn transcript_line_count(&self, width: u16) -> u16 {
        let wrap_width = if width > 0 { width as usize } else { 50 };
        let mut total: u16 = 0;

        for msg in &self.transcript {
            total += 1; // sender label
            for line in msg.text.lines() {
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += (char_count / wrap_width + 1) as u16;
                }
            }
            if msg.text.is_empty() {
                total += 1;
            }
            total += 1; // blank separator
        }

        if self.loading {
            total += 2; // label + typing indicator
        }

        total
    }

    pub fn scroll_to_bottom(&mut self) {
        let total = self.transcript_line_count(self.chat_width);
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.scroll = total.saturating_sub(visible);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let total = self.transcript_line_count(self.chat_width);
        let max = total.saturating_sub(self.chat_height);
        self.scroll = self.scroll.saturating_add(1).min(max);
    }
}

pub enum View {
    Login(LoginState),
    Chat(ChatState),
}

impl View {
    fn for_route(route: Route) -> Self {
        match route {
            Route::Login => View::Login(LoginState::new()),
            Route::Chat(identity) => View::Chat(ChatState::new(identity)),
        }
    }
}

/// Final bot text for a resolved `send`.
pub fn chat_reply_text(result: Result<String, ApiError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(ApiError::Status(_)) => CHAT_ERROR_REPLY.to_string(),
        Err(ApiError::Network(_)) => NETWORK_ERROR_REPLY.to_string(),
    }
}

/// Final bot text for a resolved report request.
pub fn report_reply_text(result: Result<ReportOk, ApiError>) -> String {
    match result {
        Ok(ok) => format!("{}\n\n📤 {}", ok.report, ok.slack_status),
        Err(ApiError::Status(_)) => REPORT_ERROR_REPLY.to_string(),
        Err(ApiError::Network(_)) => NETWORK_ERROR_REPLY.to_string(),
    }
}

/// Message line and navigation target for a resolved login. Navigation
/// follows the `type` the backend returned, not the tab the user picked, and
/// any other `type` value goes nowhere: the user stays on the login screen
/// with the welcome message. A transport failure reads as rejected
/// credentials here; only the chat views tell the two apart.
pub fn login_outcome(result: Result<LoginOk, ApiError>) -> (String, Option<Route>) {
    match result {
        Ok(ok) => {
            let message = format!("Welcome, {}! Type: {}", ok.login_id, ok.user_type);
            let role = match ok.user_type.as_str() {
                "Patient" => Some(Role::Patient),
                "Doctor" => Some(Role::Doctor),
                _ => None,
            };
            let route = role.map(|role| {
                Route::Chat(Identity {
                    login_id: ok.login_id,
                    role,
                })
            });
            (message, route)
        }
        Err(_) => (INVALID_CREDENTIALS.to_string(), None),
    }
}

pub struct App {
    pub should_quit: bool,
    pub view: View,
    pub api: ApiClient,
    pub animation_frame: u8,
}

impl App {
    pub fn new(api: ApiClient, route: Route) -> Self {
        Self {
            should_quit: false,
            view: View::for_route(route),
            api,
            animation_frame: 0,
        }
    }

    /// Replace the active view. The old view's state drops here, including
    /// any pending request handle; the detached task still runs to
    /// completion and its response is discarded.
    pub fn navigate(&mut self, route: Route) {
        tracing::info!(path = %route.path(), "navigate");
        self.view = View::for_route(route);
    }

    pub fn tick_animation(&mut self) {
        let busy = match &self.view {
            View::Login(state) => state.submitting,
            View::Chat(state) => state.loading,
        };
        if busy {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Submit the login form. Both fields are required; the role comes from
    /// the active tab.
    pub fn submit_login(&mut self) {
        let api = self.api.clone();
        let View::Login(state) = &mut self.view else {
            return;
        };
        if state.login_id.text.is_empty() || state.password.text.is_empty() {
            return;
        }

        let login_id = state.login_id.text.clone();
        let password = state.password.text.clone();
        let role = state.tab;
        state.submitting = true;
        state.pending = Some(tokio::spawn(async move {
            api.login(&login_id, &password, role.as_str()).await
        }));
    }

    /// Submit the chat input. Whitespace-only input is a no-op. The user
    /// message is appended immediately; the input field stays as typed until
    /// the request resolves. Nothing here checks `loading` — the disabled
    /// input while a request is in flight is the handler's (advisory)
    /// concern.
    pub fn submit_message(&mut self) {
        let api = self.api.clone();
        let View::Chat(state) = &mut self.view else {
            return;
        };
        if state.input.text.trim().is_empty() {
            return;
        }

        let text = state.input.text.clone();
        state.transcript.push(ChatMessage::user(text.clone()));
        state.loading = true;
        state.scroll_to_bottom();

        let login_id = state.identity.login_id.clone();
        let role = state.identity.role;
        state.pending = Some(Pending::Chat(tokio::spawn(async move {
            match role {
                Role::Patient => api.patient_chat(&login_id, &text).await,
                Role::Doctor => api.doctor_chat(&login_id, &text).await,
            }
        })));
    }

    /// Doctor-only report action. Appends the fixed marker message and posts
    /// the report request; the input field is not involved.
    pub fn submit_report(&mut self) {
        let api = self.api.clone();
        let View::Chat(state) = &mut self.view else {
            return;
        };
        if state.identity.role != Role::Doctor {
            return;
        }

        state.transcript.push(ChatMessage::user(REPORT_MARKER));
        state.loading = true;
        state.scroll_to_bottom();

        let login_id = state.identity.login_id.clone();
        state.pending = Some(Pending::Report(tokio::spawn(async move {
            api.generate_report(&login_id).await
        })));
    }

    /// Apply the outcome of a finished request, if any. Called from the main
    /// loop on every event and tick, so resolution lags completion by at
    /// most one tick.
    pub async fn poll_pending(&mut self) {
        let mut next_route = None;

        match &mut self.view {
            View::Login(state) => {
                if !state.pending.as_ref().is_some_and(|t| t.is_finished()) {
                    return;
                }
                let task = state.pending.take().expect("checked above");
                let result = match task.await {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::error!(%err, "login task failed");
                        state.submitting = false;
                        state.message = INVALID_CREDENTIALS.to_string();
                        return;
                    }
                };
                let (message, route) = login_outcome(result);
                tracing::debug!(%message, "login resolved");
                state.message = message;
                state.submitting = false;
                next_route = route;
            }
            View::Chat(state) => {
                if !state.pending.as_ref().is_some_and(|p| p.is_finished()) {
                    return;
                }
                match state.pending.take().expect("checked above") {
                    Pending::Chat(task) => {
                        let reply = match task.await {
                            Ok(result) => chat_reply_text(result),
                            Err(_) => NETWORK_ERROR_REPLY.to_string(),
                        };
                        state.resolve_chat(reply);
                    }
                    Pending::Report(task) => {
                        let reply = match task.await {
                            Ok(result) => report_reply_text(result),
                            Err(_) => NETWORK_ERROR_REPLY.to_string(),
                        };
                        state.resolve_report(reply);
                    }
                }
            }
        }

        if let Some(route) = next_route {
            self.navigate(route);
        }
    }
}
