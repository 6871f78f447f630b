//! Main TUI application state and logic

use super::panes::{
    render_generations_pane, render_heap_pane, render_source_pane, render_stack_pane,
    render_status_bar, render_transcript_pane, HeapRenderData, HeapScrollState,
    SourceScrollState, StackRenderData, StackScrollState, StatusRenderData,
};
use crate::driver::constants::PLAY_INTERVAL_MS;
use crate::driver::{Session, SessionError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Transcript,
    Generations,
    Stack,
    Heap,
}

impl FocusedPane {
    /// Move focus to the next pane (left column top to bottom, then right column)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Transcript,
            FocusedPane::Transcript => FocusedPane::Generations,
            FocusedPane::Generations => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Heap,
            FocusedPane::Transcript => FocusedPane::Source,
            FocusedPane::Generations => FocusedPane::Transcript,
            FocusedPane::Stack => FocusedPane::Generations,
            FocusedPane::Heap => FocusedPane::Stack,
        }
    }
}

/// The main application state
pub struct App {
    /// The finished script run
    pub session: Session,

    /// The script text
    pub source_code: String,

    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub transcript_scroll: usize,
    pub generations_scroll: usize,
    pub stack_scroll: StackScrollState,
    pub heap_scroll: HeapScrollState,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    pub fn new(session: Session, source_code: String) -> Self {
        let status_message = match session.error() {
            Some(err) => format!("Run stopped: {}", err),
            None => String::from("Ready!"),
        };
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);

        App {
            session,
            source_code,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None,
            },
            transcript_scroll: 0,
            generations_scroll: 0,
            stack_scroll: StackScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            heap_scroll: HeapScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: long_ago,
            last_space_press: long_ago,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing
                && self.last_play_time.elapsed() >= Duration::from_millis(PLAY_INTERVAL_MS)
            {
                if self.session.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                    self.transcript_scroll = usize::MAX;
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_chunks[0]);

        // Left column: Source | Transcript
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[0]);

        // Right column: Generations | Stack | Heap
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(30),
                Constraint::Percentage(45),
            ])
            .split(columns[1]);

        let at_end = self.session.history_position() + 1 >= self.session.total_snapshots();
        let has_error = self.session.error().is_some();

        render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            self.session.current_location().line,
            has_error && at_end,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let snapshot = self.session.current_snapshot();
        let depth = snapshot.map_or(0, |s| s.memory.depth());

        render_transcript_pane(
            frame,
            left_rows[1],
            self.session.transcript(),
            snapshot.map_or(0, |s| s.transcript_len),
            self.focused_pane == FocusedPane::Transcript,
            &mut self.transcript_scroll,
        );

        if let Some(snapshot) = snapshot {
            render_generations_pane(
                frame,
                right_rows[0],
                &snapshot.memory.generations,
                &snapshot.bindings,
                self.focused_pane == FocusedPane::Generations,
                &mut self.generations_scroll,
            );

            render_stack_pane(
                frame,
                right_rows[1],
                StackRenderData {
                    stack: &snapshot.memory.stack,
                    inherited_len: snapshot.memory.inherited_stack,
                },
                self.focused_pane == FocusedPane::Stack,
                &mut self.stack_scroll,
            );

            render_heap_pane(
                frame,
                right_rows[2],
                HeapRenderData {
                    cells: &snapshot.memory.cells,
                    current_depth: depth,
                    free_head: snapshot.memory.free_head,
                    used_cells: snapshot.memory.used_cells,
                    bindings: &snapshot.bindings,
                },
                self.focused_pane == FocusedPane::Heap,
                &mut self.heap_scroll,
            );
        }

        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.session.history_position(),
                total_steps: self.session.total_snapshots(),
                depth,
                has_error,
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                let result = self.session.step_backward();
                self.report_step(result, "Stepped backward", "Cannot step backward");
            }
            KeyCode::Right => {
                self.is_playing = false;
                let result = self.session.step_forward();
                self.report_step(result, "Stepped forward", "Cannot step forward");
            }
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::Char(' ') => {
                // Debounce key repeat
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    self.status_message = if self.is_playing {
                        "Playing...".to_string()
                    } else {
                        "Paused".to_string()
                    };
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                let result = self.session.jump_to_end();
                self.report_step(result, "Jumped to end", "Cannot jump to end");
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                let result = self.session.rewind_to_start();
                self.report_step(result, "Jumped to start", "Cannot jump to start");
            }
            _ => {}
        }
    }

    fn report_step(&mut self, result: Result<(), SessionError>, done: &str, failed: &str) {
        match result {
            Ok(()) => {
                self.status_message = done.to_string();
                self.transcript_scroll = usize::MAX;
            }
            Err(SessionError::HistoryOperationFailed { message }) => {
                self.status_message = format!("{}: {}", failed, message);
            }
            Err(e) => {
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    /// Scroll the focused pane by one row
    fn scroll(&mut self, delta: isize) {
        let apply = |offset: &mut usize| {
            *offset = offset.saturating_add_signed(delta);
        };
        match self.focused_pane {
            FocusedPane::Source => {
                // Scrolling down moves the current line up visually
                if let Some(row) = self.source_scroll.target_line_row {
                    self.source_scroll.target_line_row = Some(row.saturating_add_signed(-delta));
                }
            }
            FocusedPane::Transcript => apply(&mut self.transcript_scroll),
            FocusedPane::Generations => apply(&mut self.generations_scroll),
            FocusedPane::Stack => apply(&mut self.stack_scroll.offset),
            FocusedPane::Heap => apply(&mut self.heap_scroll.offset),
        }
    }
}
