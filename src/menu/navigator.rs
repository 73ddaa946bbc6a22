//! Single-focus menu navigation driven by one key at a time.

use std::time::{Duration, Instant};

use super::{MenuTree, NodeId, NodeKind, Outcome, BACK_TOKEN};

pub const INPUT_CHAR_LIMIT: usize = 156;

const HELP_NAVIGATE: &str = "(↑/↓) Navigate   (Enter) Select   ";
const HELP_BACK: &str = "(Esc) Back   ";
const HELP_QUIT: &str = "(q) Quit";
const HELP_INPUT: &str = "Press Enter to submit, Esc to cancel";

/// Terminal-independent key model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Enter,
    Esc,
    Backspace,
    Char(char),
    /// ctrl-c
    Interrupt,
}

/// Deadline after which the run ends. The final frame is drawn before waiting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownTimer {
    deadline: Instant,
}

impl ShutdownTimer {
    pub fn schedule(now: Instant, delay: Duration) -> Self {
        Self {
            deadline: now + delay,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InputState {
    node: NodeId,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Input(InputState),
    Quitting(ShutdownTimer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewLineKind {
    Title,
    Blank,
    Item { focused: bool },
    Description,
    Prompt,
    Field,
    Notice,
    Help,
    Exiting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub kind: ViewLineKind,
    pub text: String,
}

impl ViewLine {
    fn new(kind: ViewLineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(ViewLineKind::Blank, "")
    }
}

/// What the run ended with: the stored action result and whether it was an abort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub message: Option<String>,
    pub failed: bool,
}

pub struct Navigator {
    tree: MenuTree,
    focus: NodeId,
    cursors: Vec<usize>,
    mode: Mode,
    result: RunResult,
    notice: Option<String>,
    exit_delay: Duration,
}

impl Navigator {
    pub fn new(tree: MenuTree, exit_delay: Duration) -> Self {
        let focus = tree.root();
        let cursors = vec![0; tree.len()];
        Self {
            tree,
            focus,
            cursors,
            mode: Mode::Browse,
            result: RunResult::default(),
            notice: None,
            exit_delay,
        }
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursors[self.focus.index()]
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Input(_))
    }

    pub fn input_text(&self) -> Option<&str> {
        match &self.mode {
            Mode::Input(input) => Some(&input.buffer),
            _ => None,
        }
    }

    pub fn shutdown(&self) -> Option<ShutdownTimer> {
        match self.mode {
            Mode::Quitting(timer) => Some(timer),
            _ => None,
        }
    }

    pub fn is_quitting(&self) -> bool {
        self.shutdown().is_some()
    }

    pub fn result(&self) -> &RunResult {
        &self.result
    }

    pub fn into_result(self) -> RunResult {
        self.result
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) {
        match self.mode {
            Mode::Browse => self.handle_browse_key(key, now),
            Mode::Input(_) => self.handle_input_key(key, now),
            Mode::Quitting(_) => {}
        }
    }

    fn handle_browse_key(&mut self, key: Key, now: Instant) {
        match key {
            Key::Interrupt | Key::Char('q') => self.quit(now),
            Key::Up | Key::Char('k') => {
                let cursor = &mut self.cursors[self.focus.index()];
                *cursor = cursor.saturating_sub(1);
            }
            Key::Down | Key::Char('j') => {
                let count = self.tree.children(self.focus).len();
                let cursor = &mut self.cursors[self.focus.index()];
                if *cursor + 1 < count {
                    *cursor += 1;
                }
            }
            Key::Enter | Key::Char(' ') => self.select(now),
            Key::Backspace | Key::Esc | Key::Left | Key::Char('h') => self.back(),
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: Key, now: Instant) {
        let Mode::Input(input) = &mut self.mode else {
            return;
        };
        match key {
            Key::Interrupt => self.quit(now),
            Key::Enter => {
                let node = input.node;
                let text = std::mem::take(&mut input.buffer);
                self.mode = Mode::Browse;
                if let NodeKind::TextInput(field) = &mut self.tree.node_mut(node).kind {
                    self.notice = (field.on_submit)(&text);
                }
            }
            Key::Esc => self.mode = Mode::Browse,
            Key::Backspace => {
                input.buffer.pop();
            }
            Key::Char(c) => {
                if input.buffer.chars().count() < INPUT_CHAR_LIMIT {
                    input.buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn select(&mut self, now: Instant) {
        let Some(&child) = self.tree.children(self.focus).get(self.cursor()) else {
            return;
        };
        self.notice = None;

        let outcome = match &mut self.tree.node_mut(child).kind {
            NodeKind::Submenu(_) => {
                self.focus = child;
                self.cursors[child.index()] = 0;
                return;
            }
            NodeKind::TextInput(_) => {
                self.mode = Mode::Input(InputState {
                    node: child,
                    buffer: String::new(),
                });
                return;
            }
            NodeKind::Content(action) => action(),
        };

        match outcome {
            Outcome::Back => match self.tree.parent(self.focus) {
                Some(parent) => self.focus = parent,
                None => self.finish(BACK_TOKEN.to_string(), false, now),
            },
            Outcome::Show(text) => self.finish(text, false, now),
            Outcome::Abort(text) => self.finish(text, true, now),
        }
    }

    fn back(&mut self) {
        if let Some(parent) = self.tree.parent(self.focus) {
            self.focus = parent;
            self.notice = None;
        }
    }

    fn finish(&mut self, message: String, failed: bool, now: Instant) {
        self.result = RunResult {
            message: Some(message),
            failed,
        };
        self.quit(now);
    }

    fn quit(&mut self, now: Instant) {
        self.mode = Mode::Quitting(ShutdownTimer::schedule(now, self.exit_delay));
    }

    /// The current frame as styled-by-kind lines.
    pub fn view_lines(&self) -> Vec<ViewLine> {
        match &self.mode {
            Mode::Quitting(_) => vec![ViewLine::new(ViewLineKind::Exiting, "Exiting...")],
            Mode::Input(input) => self.input_lines(input),
            Mode::Browse => self.menu_lines(),
        }
    }

    /// The current frame as plain text.
    pub fn view(&self) -> String {
        let mut out = String::new();
        for line in self.view_lines() {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    fn menu_lines(&self) -> Vec<ViewLine> {
        let mut lines = vec![
            ViewLine::new(ViewLineKind::Title, self.tree.title(self.focus)),
            ViewLine::blank(),
        ];

        let cursor = self.cursor();
        for (i, &child) in self.tree.children(self.focus).iter().enumerate() {
            let node = self.tree.node(child);
            let marker = if i == cursor { ">" } else { " " };
            let suffix = match node.kind {
                NodeKind::Submenu(_) => " ▶",
                NodeKind::TextInput(_) => " ✎",
                NodeKind::Content(_) => "",
            };
            lines.push(ViewLine::new(
                ViewLineKind::Item {
                    focused: i == cursor,
                },
                format!("{marker} [{}]{suffix}", node.title),
            ));
        }

        lines.push(ViewLine::blank());
        let mut help = String::from(HELP_NAVIGATE);
        if self.tree.parent(self.focus).is_some() {
            help.push_str(HELP_BACK);
        }
        help.push_str(HELP_QUIT);
        lines.push(ViewLine::new(ViewLineKind::Help, help));

        if let Some(notice) = &self.notice {
            lines.push(ViewLine::new(ViewLineKind::Notice, notice.clone()));
        }
        lines
    }

    fn input_lines(&self, input: &InputState) -> Vec<ViewLine> {
        let node = self.tree.node(input.node);
        let mut lines = vec![
            ViewLine::new(ViewLineKind::Title, node.title.clone()),
            ViewLine::blank(),
        ];
        if let NodeKind::TextInput(field) = &node.kind {
            let description = (field.describe)();
            if !description.is_empty() {
                lines.extend(
                    description
                        .lines()
                        .map(|l| ViewLine::new(ViewLineKind::Description, l)),
                );
                lines.push(ViewLine::blank());
            }
            lines.push(ViewLine::new(ViewLineKind::Prompt, field.prompt.clone()));
            lines.push(ViewLine::blank());
        }
        lines.push(ViewLine::new(
            ViewLineKind::Field,
            format!("> {}", input.buffer),
        ));
        lines.push(ViewLine::blank());
        lines.push(ViewLine::new(ViewLineKind::Help, HELP_INPUT));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::TextInput;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn three_items() -> MenuTree {
        let mut tree = MenuTree::new("Main");
        let root = tree.root();
        tree.add_content(root, "One", || Outcome::Show("1".into()))
            .unwrap();
        tree.add_content(root, "Two", || Outcome::Show("2".into()))
            .unwrap();
        tree.add_content(root, "Three", || Outcome::Show("3".into()))
            .unwrap();
        tree
    }

    #[test]
    fn cursor_does_not_wrap() {
        let mut nav = Navigator::new(three_items(), Duration::ZERO);
        let now = Instant::now();
        nav.handle_key(Key::Up, now);
        assert_eq!(nav.cursor(), 0);
        for _ in 0..4 {
            nav.handle_key(Key::Down, now);
        }
        assert_eq!(nav.cursor(), 2);
        nav.handle_key(Key::Char('k'), now);
        assert_eq!(nav.cursor(), 1);
    }

    #[test]
    fn content_result_schedules_shutdown() {
        let mut nav = Navigator::new(three_items(), Duration::from_millis(500));
        let now = Instant::now();
        nav.handle_key(Key::Char('j'), now);
        nav.handle_key(Key::Enter, now);

        let timer = nav.shutdown().unwrap();
        assert!(!timer.is_due(now));
        assert!(timer.is_due(now + Duration::from_millis(500)));
        assert_eq!(timer.remaining(now), Duration::from_millis(500));
        assert_eq!(nav.result().message.as_deref(), Some("2"));
        assert!(!nav.result().failed);
        assert_eq!(nav.view(), "Exiting...\n");
    }

    #[test]
    fn keys_after_quitting_are_ignored() {
        let mut nav = Navigator::new(three_items(), Duration::ZERO);
        let now = Instant::now();
        nav.handle_key(Key::Char('q'), now);
        nav.handle_key(Key::Down, now);
        assert!(nav.is_quitting());
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.result().message, None);
    }

    #[test]
    fn back_at_root_is_a_no_op() {
        let mut nav = Navigator::new(three_items(), Duration::ZERO);
        nav.handle_key(Key::Esc, Instant::now());
        assert_eq!(nav.focus(), nav.tree().root());
        assert!(!nav.is_quitting());
    }

    #[test]
    fn back_token_at_root_is_stored_as_a_result() {
        let mut tree = MenuTree::new("Main");
        tree.add_content(tree.root(), "Back?", || Outcome::Back)
            .unwrap();
        let mut nav = Navigator::new(tree, Duration::ZERO);
        nav.handle_key(Key::Enter, Instant::now());
        assert!(nav.is_quitting());
        assert_eq!(nav.result().message.as_deref(), Some(BACK_TOKEN));
    }

    #[test]
    fn text_input_edits_and_submits() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tree = MenuTree::new("Main");
        let sink = Rc::clone(&seen);
        tree.add_content(tree.root(), "Other", || Outcome::Show(String::new()))
            .unwrap();
        tree.add_text_input(
            tree.root(),
            "Set Host",
            TextInput::new(
                "Enter host:",
                || "Current value: [Not Set]".to_string(),
                move |text| {
                    sink.borrow_mut().push(text.to_string());
                    Some(format!("Host set to: {text}"))
                },
            ),
        )
        .unwrap();

        let mut nav = Navigator::new(tree, Duration::ZERO);
        let now = Instant::now();
        nav.handle_key(Key::Down, now);
        nav.handle_key(Key::Enter, now);
        assert!(nav.is_editing());
        for c in "dbx".chars() {
            nav.handle_key(Key::Char(c), now);
        }
        nav.handle_key(Key::Backspace, now);
        nav.handle_key(Key::Char('q'), now);
        assert_eq!(nav.input_text(), Some("dbq"));
        assert!(nav.view().contains("Current value: [Not Set]"));

        nav.handle_key(Key::Enter, now);
        assert!(!nav.is_editing());
        assert_eq!(nav.focus(), nav.tree().root());
        assert_eq!(nav.cursor(), 1);
        assert_eq!(*seen.borrow(), vec!["dbq".to_string()]);
        assert_eq!(nav.notice(), Some("Host set to: dbq"));
    }

    #[test]
    fn cancelled_input_skips_callback() {
        let calls = Rc::new(RefCell::new(0));
        let mut tree = MenuTree::new("Main");
        let counter = Rc::clone(&calls);
        tree.add_text_input(
            tree.root(),
            "Set Port",
            TextInput::new("Port:", String::new, move |_| {
                *counter.borrow_mut() += 1;
                None
            }),
        )
        .unwrap();
        let mut nav = Navigator::new(tree, Duration::ZERO);
        let now = Instant::now();
        nav.handle_key(Key::Enter, now);
        nav.handle_key(Key::Char('1'), now);
        nav.handle_key(Key::Esc, now);
        assert!(!nav.is_editing());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn input_is_capped() {
        let mut tree = MenuTree::new("Main");
        tree.add_text_input(tree.root(), "Set", TextInput::new("", String::new, |_| None))
            .unwrap();
        let mut nav = Navigator::new(tree, Duration::ZERO);
        let now = Instant::now();
        nav.handle_key(Key::Enter, now);
        for _ in 0..INPUT_CHAR_LIMIT + 10 {
            nav.handle_key(Key::Char('x'), now);
        }
        assert_eq!(nav.input_text().map(str::len), Some(INPUT_CHAR_LIMIT));
    }

    #[test]
    fn view_marks_cursor_and_kinds() {
        let mut tree = MenuTree::new("Main");
        let root = tree.root();
        tree.add_submenu(root, "Scripts").unwrap();
        tree.add_text_input(root, "Set Host", TextInput::new("", String::new, |_| None))
            .unwrap();
        tree.add_content(root, "About", || Outcome::Show(String::new()))
            .unwrap();
        let nav = Navigator::new(tree, Duration::ZERO);
        assert_eq!(
            nav.view(),
            "Main\n\n> [Scripts] ▶\n  [Set Host] ✎\n  [About]\n\n\
             (↑/↓) Navigate   (Enter) Select   (q) Quit\n"
        );
    }
}
