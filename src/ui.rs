use crate::client::Client;
use crate::conversation::{ChatMessage, Conversation, Role, StreamId};
use crate::documents::{Document, Library};
use crate::preview::{self, Preview};
use crate::protocol::{DocumentList, StreamEvent};
use crate::theme::{self, Palette};
use crossterm::cursor::MoveTo;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

const INPUT_HEIGHT: u16 = 5;
const VIEWPORT_HEIGHT: u16 = 20;

const HELP: &[(&str, &str)] = &[
    ("/upload <path>", "upload a document (or paste/drop a file path)"),
    ("/select <n>", "select document n for questions"),
    ("/remove <n>", "delete document n from the server"),
    ("/preview", "print the full preview of the selected document"),
    ("/docs", "list documents known to the server"),
    ("/clear", "clear the server's chat memory for this session"),
    ("/theme", "toggle dark mode"),
    ("/focus", "toggle the document panel"),
    ("/quit", "exit (also Esc or Ctrl-C)"),
];

// Restores terminal settings even if the loop exits early.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Self {
        Self
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableBracketedPaste);
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    level: NoticeLevel,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    RemoveDocument(Uuid),
}

#[derive(Debug)]
pub enum UiEvent {
    Uploaded(Document),
    UploadFailed(String),
    PreviewLoaded { id: Uuid, preview: Preview },
    Deleted(Uuid),
    DeleteFailed(String),
    Stream { stream: StreamId, event: StreamEvent },
    StreamFinished(StreamId),
    StreamFailed { stream: StreamId, message: String },
    ServerDocuments(DocumentList),
    HistoryCleared,
    Failed(String),
}

/// Side effects requested by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Upload(PathBuf),
    LoadPreview {
        id: Uuid,
        path: PathBuf,
    },
    Ask {
        stream: StreamId,
        document_id: String,
        question: String,
    },
    Delete {
        id: Uuid,
        backend_id: String,
    },
    ListServerDocuments,
    ClearHistory,
}

struct InputBuffer {
    lines: Vec<String>,
    cursor_x: usize,
    cursor_y: usize,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    fn line_len(&self, y: usize) -> usize {
        self.lines[y].chars().count()
    }

    fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.cursor_y];
        let at = byte_offset(line, self.cursor_x);
        line.insert(at, c);
        self.cursor_x += 1;
    }

    fn insert_str(&mut self, text: &str) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.new_line();
            }
            for c in part.chars().filter(|c| *c != '\r') {
                self.insert_char(c);
            }
        }
    }

    fn delete_char(&mut self) {
        if self.cursor_x > 0 {
            let line = &mut self.lines[self.cursor_y];
            let at = byte_offset(line, self.cursor_x - 1);
            line.remove(at);
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            let prev_line = self.lines.remove(self.cursor_y);
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
            self.lines[self.cursor_y].push_str(&prev_line);
        }
    }

    fn new_line(&mut self) {
        let line = &self.lines[self.cursor_y];
        let remaining: String = line.chars().skip(self.cursor_x).collect();
        self.lines[self.cursor_y] = line.chars().take(self.cursor_x).collect();
        self.lines.insert(self.cursor_y + 1, remaining);
        self.cursor_y += 1;
        self.cursor_x = 0;
    }

    fn move_left(&mut self) {
        if self.cursor_x > 0 {
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
        }
    }

    fn move_right(&mut self) {
        if self.cursor_x < self.line_len(self.cursor_y) {
            self.cursor_x += 1;
        } else if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = 0;
        }
    }

    fn move_up(&mut self) {
        if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn move_down(&mut self) {
        if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn home(&mut self) {
        self.cursor_x = 0;
    }

    fn end(&mut self) {
        self.cursor_x = self.line_len(self.cursor_y);
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    fn render(&self, placeholder: &str) -> Text<'static> {
        if self.is_empty() {
            return Text::from(Span::styled(
                placeholder.to_string(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Text::from(
            self.lines
                .iter()
                .map(|l| Line::from(l.clone()))
                .collect::<Vec<_>>(),
        )
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_offset(line: &str, char_index: usize) -> usize {
    line.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

pub struct App {
    conversation: Conversation,
    library: Library,
    palette: Palette,
    focus_mode: bool,
    uploading: bool,
    confirm: Option<Confirm>,
    notice: Option<Notice>,
    sources: Option<(StreamId, Vec<String>)>,
    committed: usize,
    output: Vec<Text<'static>>,
    input: InputBuffer,
    should_quit: bool,
    client: Client,
    sender: mpsc::Sender<UiEvent>,
    receiver: mpsc::Receiver<UiEvent>,
}

impl App {
    pub fn new(client: Client, dark: bool) -> Self {
        let (sender, receiver) = mpsc::channel(256);

        let mut app = Self {
            conversation: Conversation::with_greeting(),
            library: Library::new(),
            palette: Palette::for_mode(dark),
            focus_mode: false,
            uploading: false,
            confirm: None,
            notice: None,
            sources: None,
            committed: 0,
            output: Vec::new(),
            input: InputBuffer::new(),
            should_quit: false,
            client,
            sender,
            receiver,
        };
        app.sync_transcript();
        app
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let text = text.into();
        if level == NoticeLevel::Error {
            tracing::warn!(%text, "notice");
        }
        self.notice = Some(Notice { level, text });
    }

    /// Moves settled messages to the scrollback queue. The reply that is
    /// still streaming stays in the viewport.
    fn sync_transcript(&mut self) {
        let messages = self.conversation.messages();
        let settled = if self.conversation.is_streaming() {
            messages.len().saturating_sub(1)
        } else {
            messages.len()
        };
        while self.committed < settled {
            self.output
                .push(message_text(&messages[self.committed], &self.palette));
            self.committed += 1;
        }
    }

    fn print_info(&mut self, lines: Vec<String>) {
        let style = Style::default()
            .fg(self.palette.info)
            .add_modifier(Modifier::ITALIC);
        self.output.push(Text::from(
            lines
                .into_iter()
                .map(|line| Line::from(Span::styled(line, style)))
                .collect::<Vec<_>>(),
        ));
    }

    fn submit(&mut self, line: String) -> Action {
        if let Some(confirm) = self.confirm.take() {
            return self.resolve_confirm(confirm, line.trim());
        }
        if line.trim().is_empty() {
            return Action::None;
        }
        if let Some(command) = line.trim().strip_prefix('/') {
            return self.run_command(command);
        }
        self.send_question(line)
    }

    fn send_question(&mut self, question: String) -> Action {
        let Some(document) = self.library.selected() else {
            self.notify(NoticeLevel::Info, "Please upload & select a document first");
            return Action::None;
        };
        if self.conversation.is_streaming() {
            self.notify(
                NoticeLevel::Error,
                "Wait for the current answer to finish before asking again.",
            );
            return Action::None;
        }

        let document_id = document.backend_id.clone();
        self.conversation.push_user(question.clone());
        let stream = self.conversation.begin_reply();
        self.sources = None;
        self.notice = None;
        self.sync_transcript();

        Action::Ask {
            stream,
            document_id,
            question,
        }
    }

    fn run_command(&mut self, command: &str) -> Action {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "upload" if !arg.is_empty() => {
                self.uploading = true;
                self.notify(NoticeLevel::Info, "Processing document...");
                Action::Upload(resolve_path(arg))
            }
            "select" => {
                match arg.parse().ok().and_then(|n| self.library.nth(n)) {
                    Some(document) => {
                        let (id, name) = (document.id, document.name.clone());
                        self.library.select(id);
                        self.notify(NoticeLevel::Info, format!("Selected \"{}\"", name));
                    }
                    None => self.notify(NoticeLevel::Error, "No such document."),
                }
                Action::None
            }
            "remove" => {
                match arg.parse().ok().and_then(|n| self.library.nth(n)) {
                    Some(document) => {
                        let (id, name) = (document.id, document.name.clone());
                        self.confirm = Some(Confirm::RemoveDocument(id));
                        self.notify(
                            NoticeLevel::Info,
                            format!("Are you sure you want to delete \"{}\"? (y/n)", name),
                        );
                    }
                    None => self.notify(NoticeLevel::Error, "No such document."),
                }
                Action::None
            }
            "preview" => {
                let text = self.library.selected().map(|document| {
                    let mut text = Text::from(Line::from(Span::styled(
                        format!("── {} ({}) ──", document.name, document.size_label()),
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                    match document.preview() {
                        Some(preview) => text.extend(preview.to_text(&self.palette)),
                        None => text.extend(Text::from("Loading preview...")),
                    }
                    text
                });
                match text {
                    Some(text) => self.output.push(text),
                    None => self.notify(NoticeLevel::Info, "No document selected."),
                }
                Action::None
            }
            "docs" => Action::ListServerDocuments,
            "clear" => Action::ClearHistory,
            "theme" => {
                self.palette = self.palette.toggled();
                let mode = if self.palette.dark { "dark" } else { "light" };
                self.notify(NoticeLevel::Info, format!("Switched to {} mode", mode));
                Action::None
            }
            "focus" => {
                self.focus_mode = !self.focus_mode;
                Action::None
            }
            "help" => {
                let lines = HELP
                    .iter()
                    .map(|(command, about)| format!("{:<16} {}", command, about))
                    .collect();
                self.print_info(lines);
                Action::None
            }
            "quit" | "exit" => {
                self.should_quit = true;
                Action::None
            }
            _ => {
                self.notify(
                    NoticeLevel::Error,
                    format!("Unknown command /{}. Try /help.", command),
                );
                Action::None
            }
        }
    }

    fn resolve_confirm(&mut self, confirm: Confirm, answer: &str) -> Action {
        let Confirm::RemoveDocument(id) = confirm;
        let accepted = matches!(answer.to_lowercase().as_str(), "y" | "yes");
        match self.library.get(id) {
            Some(document) if accepted => {
                let backend_id = document.backend_id.clone();
                let name = document.name.clone();
                self.notify(NoticeLevel::Info, format!("Removing \"{}\"...", name));
                Action::Delete { id, backend_id }
            }
            _ => {
                self.notify(NoticeLevel::Info, "Cancelled.");
                Action::None
            }
        }
    }

    fn apply(&mut self, event: UiEvent) -> Action {
        match event {
            UiEvent::Uploaded(document) => {
                self.uploading = false;
                let name = document.name.clone();
                let path = document.path.clone();
                let id = self.library.add(document);
                self.notify(NoticeLevel::Success, format!("\"{}\" uploaded", name));
                return Action::LoadPreview { id, path };
            }
            UiEvent::UploadFailed(message) => {
                self.uploading = false;
                self.notify(NoticeLevel::Error, message);
            }
            UiEvent::PreviewLoaded { id, preview } => {
                if let Preview::Error(message) = &preview {
                    self.notify(
                        NoticeLevel::Error,
                        format!("Failed to load document: {}", message),
                    );
                }
                self.library.set_preview(id, preview);
            }
            UiEvent::Deleted(id) => {
                if let Some(document) = self.library.remove(id) {
                    self.notify(
                        NoticeLevel::Success,
                        format!("\"{}\" deleted successfully.", document.name),
                    );
                }
            }
            UiEvent::DeleteFailed(message) | UiEvent::Failed(message) => {
                self.notify(NoticeLevel::Error, message);
            }
            UiEvent::Stream { stream, event } => match event {
                StreamEvent::Token { content } => {
                    self.conversation.apply_token(stream, &content);
                }
                StreamEvent::Sources { sources } => {
                    let names = sources.iter().map(|s| s.label().to_string()).collect();
                    self.sources = Some((stream, names));
                }
                StreamEvent::Done { .. } => {}
            },
            UiEvent::StreamFinished(stream) => {
                self.conversation.finish(stream);
                self.sync_transcript();
                if let Some((source_stream, names)) = self.sources.take() {
                    if source_stream == stream && !names.is_empty() {
                        self.print_info(vec![format!("Sources: {}", names.join(", "))]);
                    }
                }
            }
            UiEvent::StreamFailed { stream, message } => {
                self.conversation.fail(stream, &message);
                self.sync_transcript();
            }
            UiEvent::ServerDocuments(list) => {
                let mut lines = vec![format!("{} document(s) on the server", list.total)];
                lines.extend(list.documents.iter().map(|document| {
                    format!(
                        "  {}  {} ({} chunks)",
                        document.document_id,
                        document.filename.as_deref().unwrap_or("Unknown"),
                        document.total_chunks
                    )
                }));
                self.print_info(lines);
            }
            UiEvent::HistoryCleared => {
                self.notify(NoticeLevel::Success, "Chat memory cleared.");
            }
        }
        Action::None
    }

    fn perform(&self, action: Action) {
        let client = self.client.clone();
        let sender = self.sender.clone();

        match action {
            Action::None => {}
            Action::Upload(path) => {
                tokio::spawn(async move {
                    let event = match client.upload(&path).await {
                        Ok(document) => UiEvent::Uploaded(document),
                        Err(err) => UiEvent::UploadFailed(err.to_string()),
                    };
                    let _ = sender.send(event).await;
                });
            }
            Action::LoadPreview { id, path } => {
                tokio::spawn(async move {
                    let preview = tokio::task::spawn_blocking(move || preview::load(&path))
                        .await
                        .unwrap_or_else(|err| Preview::Error(err.to_string()));
                    let _ = sender.send(UiEvent::PreviewLoaded { id, preview }).await;
                });
            }
            Action::Ask {
                stream,
                document_id,
                question,
            } => {
                tokio::spawn(async move {
                    let events = sender.clone();
                    let result = client
                        .ask(&document_id, &question, |event| {
                            let events = events.clone();
                            async move {
                                let _ = events.send(UiEvent::Stream { stream, event }).await;
                            }
                        })
                        .await;
                    let event = match result {
                        Ok(()) => UiEvent::StreamFinished(stream),
                        Err(err) => {
                            tracing::warn!(%err, "chat stream error");
                            UiEvent::StreamFailed {
                                stream,
                                message: err.to_string(),
                            }
                        }
                    };
                    let _ = sender.send(event).await;
                });
            }
            Action::Delete { id, backend_id } => {
                tokio::spawn(async move {
                    let event = match client.delete(&backend_id).await {
                        Ok(()) => UiEvent::Deleted(id),
                        Err(err) => UiEvent::DeleteFailed(err.to_string()),
                    };
                    let _ = sender.send(event).await;
                });
            }
            Action::ListServerDocuments => {
                tokio::spawn(async move {
                    let event = match client.list_documents().await {
                        Ok(list) => UiEvent::ServerDocuments(list),
                        Err(err) => UiEvent::Failed(err.to_string()),
                    };
                    let _ = sender.send(event).await;
                });
            }
            Action::ClearHistory => {
                tokio::spawn(async move {
                    let event = match client.clear_history().await {
                        Ok(()) => UiEvent::HistoryCleared,
                        Err(err) => UiEvent::Failed(err.to_string()),
                    };
                    let _ = sender.send(event).await;
                });
            }
        }
    }

    fn draw(&self, f: &mut Frame) {
        let [top, status, input] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .areas(f.area());

        let reply_area = if self.focus_mode {
            top
        } else {
            let [documents, reply] =
                Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                    .areas(top);
            self.draw_documents(f, documents);
            reply
        };
        self.draw_reply(f, reply_area);
        self.draw_status(f, status);
        self.draw_input(f, input);
    }

    fn draw_documents(&self, f: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if self.library.is_empty() {
            lines.push(Line::from(Span::styled(
                "No documents yet. /upload <path>",
                Style::default().fg(self.palette.muted),
            )));
        }
        let selected = self.library.selected().map(|d| d.id);
        for (i, document) in self.library.documents().iter().enumerate() {
            let marker = if Some(document.id) == selected { "▶" } else { " " };
            lines.push(Line::from(vec![
                Span::raw(format!("{} {}. ", marker, i + 1)),
                Span::styled(
                    document.name.clone(),
                    Style::default().fg(self.palette.text),
                ),
                Span::styled(
                    format!(" {}", document.size_label()),
                    Style::default().fg(self.palette.muted),
                ),
            ]));
        }
        if let Some(document) = self.library.selected() {
            lines.push(Line::default());
            match document.preview() {
                Some(preview) => lines.extend(preview.to_text(&self.palette).lines),
                None => lines.push(Line::from("Loading preview...")),
            }
        }

        let panel = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Documents ")
                    .border_style(Style::default().fg(self.palette.border)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(panel, area);
    }

    fn draw_reply(&self, f: &mut Frame, area: Rect) {
        let text = match self.conversation.last() {
            Some(message) if self.conversation.is_streaming() => {
                if message.text.is_empty() {
                    Text::from(Span::styled(
                        "Thinking...",
                        Style::default().fg(self.palette.muted),
                    ))
                } else {
                    theme::render_text(&message.text, &self.palette)
                }
            }
            _ => Text::from(Span::styled(
                if self.library.is_empty() {
                    "Upload a document to get started. /help lists commands."
                } else {
                    "Ask about the document..."
                },
                Style::default().fg(self.palette.muted),
            )),
        };

        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2);
        let overflow = text_height(&text, inner_width).saturating_sub(inner_height);
        let reply = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Assistant ")
                    .border_style(Style::default().fg(self.palette.border)),
            )
            .wrap(Wrap { trim: false })
            .scroll((overflow, 0));
        f.render_widget(reply, area);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        if self.uploading {
            spans.push(Span::styled(
                "[Uploading...] ",
                Style::default().fg(self.palette.muted),
            ));
        }
        if let Some(notice) = &self.notice {
            let color = match notice.level {
                NoticeLevel::Info => self.palette.text,
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => self.palette.error,
            };
            spans.push(Span::styled(notice.text.clone(), Style::default().fg(color)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_input(&self, f: &mut Frame, area: Rect) {
        let title = match (self.confirm, self.conversation.is_streaming()) {
            (Some(_), _) => " Confirm (y/n, Enter) ",
            (None, true) => " Input (Enter to send, Esc to quit) [Thinking...] ",
            (None, false) => " Input (Enter to send, Esc to quit) ",
        };

        let input_paragraph = Paragraph::new(self.input.render("Ask about the document..."))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(input_paragraph, area);

        let cursor_x = (self.input.cursor_x + 1) as u16;
        let cursor_y = self.input.cursor_y as u16;
        let x = (area.x + cursor_x).min(area.x + area.width - 2);
        let y = (area.y + 1 + cursor_y).min(area.y + area.height - 2);
        f.set_cursor_position((x, y));
    }

    fn flush_output(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        if self.output.is_empty() {
            return Ok(());
        }
        let width = terminal.size()?.width;
        for mut text in self.output.drain(..) {
            text.push_line(Line::default());
            let height = text_height(&text, width);
            // Insert above the inline viewport so the log stays in scrollback.
            terminal.insert_before(height, |buf| {
                let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
                paragraph.render(buf.area, buf);
            })?;
        }
        Ok(())
    }

    fn handle_events(&mut self) -> anyhow::Result<bool> {
        while let Ok(event) = self.receiver.try_recv() {
            let action = self.apply(event);
            self.perform(action);
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        self.should_quit = true;
                        return Ok(false);
                    }

                    match key.code {
                        KeyCode::Esc => {
                            self.should_quit = true;
                            return Ok(false);
                        }
                        KeyCode::Enter => {
                            if key.modifiers.contains(KeyModifiers::SHIFT) {
                                self.input.new_line();
                            } else {
                                let line = self.input.text();
                                self.input.clear();
                                let action = self.submit(line);
                                self.perform(action);
                            }
                        }
                        KeyCode::Char(c) => self.input.insert_char(c),
                        KeyCode::Backspace => self.input.delete_char(),
                        KeyCode::Left => self.input.move_left(),
                        KeyCode::Right => self.input.move_right(),
                        KeyCode::Up => self.input.move_up(),
                        KeyCode::Down => self.input.move_down(),
                        KeyCode::Home => self.input.home(),
                        KeyCode::End => self.input.end(),
                        _ => {}
                    }
                }
                Event::Paste(text) => {
                    // Dropping a file on most terminals pastes its path.
                    let path = resolve_path(&text);
                    if self.input.is_empty() && path.is_file() {
                        self.uploading = true;
                        self.notify(NoticeLevel::Info, "Processing document...");
                        self.perform(Action::Upload(path));
                    } else {
                        self.input.insert_str(&text);
                    }
                }
                _ => {}
            }
        }

        Ok(!self.should_quit)
    }
}

fn message_text(message: &ChatMessage, palette: &Palette) -> Text<'static> {
    let (label, color) = match message.role {
        Role::User => ("You:", palette.user),
        Role::Assistant => ("Assistant:", palette.assistant),
    };
    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];

    let body: Vec<Line<'static>> = match message.role {
        Role::User => message
            .text
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(color))))
            .collect(),
        Role::Assistant => theme::render_text(&message.text, palette).lines,
    };
    for line in body {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }
    Text::from(lines)
}

fn text_height(text: &Text<'_>, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total = 0usize;
    for line in &text.lines {
        let len = line
            .spans
            .iter()
            .map(|s| s.content.chars().count())
            .sum::<usize>()
            .max(1);
        total += len.div_ceil(width);
    }
    total as u16
}

/// Normalizes a typed or pasted path: quotes, `file://` and `~/`.
fn resolve_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    let trimmed = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    if let Some(rest) = trimmed.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(trimmed)
}

pub fn run_tui(client: Client, dark: bool) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard::new();
    let mut stdout = io::stdout();
    let (_, rows) = size()?;
    if rows > 0 {
        // Push existing screen content into scrollback without clearing it.
        for _ in 0..rows {
            writeln!(stdout)?;
        }
        stdout.flush()?;
    }
    execute!(stdout, MoveTo(0, 0), EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        },
    )?;

    let mut app = App::new(client, dark);

    app.flush_output(&mut terminal)?;
    terminal.draw(|f| app.draw(f))?;

    while !app.should_quit {
        if !app.handle_events()? {
            break;
        }

        app.flush_output(&mut terminal)?;
        terminal.draw(|f| app.draw(f))?;

        std::thread::sleep(Duration::from_millis(10));
    }

    Ok(())
}
