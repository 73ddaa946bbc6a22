//! Terminal front end: raw-mode setup, key translation and frame drawing.

use std::io;
use std::time::Instant;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::{
    layout::Margin,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
    Terminal,
};

use crate::menu::{Key, Navigator, RunResult, ViewLine, ViewLineKind};

const COLOR_TITLE: Color = Color::Rgb(250, 250, 250);
const COLOR_ITEM: Color = Color::Rgb(221, 221, 221);
const COLOR_CURSOR: Color = Color::Rgb(255, 135, 95);
const COLOR_INFO: Color = Color::Rgb(142, 142, 147);
const COLOR_GREEN: Color = Color::Rgb(46, 204, 113);

/// Runs the menu until an action result or quit key ends it.
pub fn run_menu(mut navigator: Navigator) -> anyhow::Result<RunResult> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut navigator);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;
    Ok(navigator.into_result())
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    navigator: &mut Navigator,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area().inner(Margin::new(1, 0));
            let lines: Vec<Line> = navigator.view_lines().iter().map(styled_line).collect();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
        })?;

        // The exit frame is already on screen; hold it until the deadline.
        if let Some(timer) = navigator.shutdown() {
            std::thread::sleep(timer.remaining(Instant::now()));
            return Ok(());
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(key) = map_key(key) {
                navigator.handle_key(key, Instant::now());
            }
        }
    }
}

pub(crate) fn map_key(key: KeyEvent) -> Option<Key> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Key::Interrupt),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

fn styled_line(line: &ViewLine) -> Line<'static> {
    let style = match line.kind {
        ViewLineKind::Title => Style::default().fg(COLOR_TITLE).add_modifier(Modifier::BOLD),
        ViewLineKind::Item { focused: true } | ViewLineKind::Field => {
            Style::default().fg(COLOR_CURSOR)
        }
        ViewLineKind::Item { focused: false } | ViewLineKind::Prompt => {
            Style::default().fg(COLOR_ITEM)
        }
        ViewLineKind::Description | ViewLineKind::Help | ViewLineKind::Exiting => {
            Style::default().fg(COLOR_INFO)
        }
        ViewLineKind::Notice => Style::default().fg(COLOR_GREEN),
        ViewLineKind::Blank => Style::default(),
    };
    Line::styled(line.text.clone(), style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{MenuTree, Outcome};
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn keys_map_to_menu_model() {
        assert_eq!(map_key(press(KeyCode::Up, KeyModifiers::NONE)), Some(Key::Up));
        assert_eq!(
            map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Interrupt)
        );
        assert_eq!(
            map_key(press(KeyCode::Char('h'), KeyModifiers::NONE)),
            Some(Key::Char('h'))
        );
        assert_eq!(map_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
        assert_eq!(map_key(press(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn frame_draws_menu_text() {
        let mut tree = MenuTree::new("Server Configuration Tool");
        tree.add_content(tree.root(), "About", || Outcome::Show(String::new()))
            .unwrap();
        let navigator = Navigator::new(tree, Duration::ZERO);

        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| {
                let lines: Vec<Line> = navigator.view_lines().iter().map(styled_line).collect();
                frame.render_widget(Paragraph::new(lines), frame.area());
            })
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let first_row: String = (0..buffer.area.width)
            .map(|x| buffer[(x, 0)].symbol().to_string())
            .collect();
        assert!(first_row.starts_with("Server Configuration Tool"));
    }
}
