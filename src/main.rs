use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use pitch_lab::config::{self, default_db_path};
use pitch_lab::dashboard::{DashboardState, Screen, XG_BINS, filter_label};
use pitch_lab::{persist, store};

/// Terminal dashboard over the lineup warehouse.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Warehouse to read; defaults to PITCH_LAB_DB or the app cache dir.
    #[arg(long)]
    db: Option<PathBuf>,
}

struct App {
    state: DashboardState,
    should_quit: bool,
}

impl App {
    fn new(state: DashboardState) -> Self {
        Self {
            state,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') => self.state.cycle_competition(),
            KeyCode::Char('s') => self.state.cycle_season(),
            KeyCode::Char('t') => self.state.cycle_team(),
            KeyCode::Char('r') => self.state.reset_filters(),
            KeyCode::Tab => self.state.cycle_screen(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();

    let db_path = args
        .db
        .or_else(|| std::env::var("PITCH_LAB_DB").ok().map(PathBuf::from))
        .or_else(default_db_path)
        .context("no warehouse path; pass --db")?;
    let conn = store::open_db(&db_path)?;
    let tables = store::load_dashboard_tables(&conn)?;

    let mut state = DashboardState::new(tables);
    persist::load_into_state(&mut state, &db_path);
    let loaded = state.tables.matches.len();
    state.push_log(format!("[INFO] Loaded {loaded} matches from {}", db_path.display()));
    if loaded == 0 {
        state.push_log("[WARN] Warehouse is empty; run build_lineups first");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(state);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    persist::save_from_state(&app.state, &db_path);

    // Raw mode is off again, so logging to stderr is safe.
    config::init_tracing();
    if let Err(err) = &res {
        tracing::error!(error = %err, "dashboard stopped");
    }
    res.map_err(Into::into)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Overview => render_overview(frame, chunks[1], &app.state),
        Screen::Formations => render_formations(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &DashboardState) -> String {
    let screen = match state.screen {
        Screen::Overview => "OVERVIEW",
        Screen::Formations => "FORMATIONS",
    };
    let line1 = format!("  PITCH LAB | {screen}");
    let line2 = format!(
        "  Competition: {} | Season: {} | Team: {}",
        filter_label(&state.filters.competition),
        filter_label(&state.filters.season),
        filter_label(&state.filters.team)
    );
    format!("{line1}\n{line2}")
}

fn footer_text(state: &DashboardState) -> String {
    match state.screen {
        Screen::Overview => {
            "c Competition | s Season | t Team | r Reset | Tab Formations | ? Help | q Quit".to_string()
        }
        Screen::Formations => {
            "c Competition | s Season | t Team | r Reset | Tab Overview | ? Help | q Quit".to_string()
        }
    }
}

fn render_overview(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);

    render_kpis(frame, rows[0], state);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    let events: Vec<(String, u64)> = state.event_type_distribution();
    frame.render_widget(
        horizontal_chart("Event Types (top 15)", &events, Color::Cyan),
        top[0],
    );
    let results: Vec<(String, u64)> = state
        .results_distribution()
        .into_iter()
        .map(|(label, n)| (label.to_string(), n))
        .collect();
    frame.render_widget(vertical_chart("Results", &results, 10, Color::Green), top[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[2]);
    let histogram: Vec<(String, u64)> = state
        .xg_histogram()
        .into_iter()
        .enumerate()
        .map(|(idx, n)| (xg_bin_label(idx), n))
        .collect();
    frame.render_widget(vertical_chart("Shot xG", &histogram, 1, Color::Yellow), bottom[0]);
    // Bars carry integers, so averages are scaled by 100 and labelled with the real value.
    let goals: Vec<Bar> = state
        .avg_goals_by_competition()
        .into_iter()
        .map(|(name, avg)| {
            Bar::default()
                .label(name.into())
                .value((avg * 100.0).round() as u64)
                .text_value(format!("{avg:.2}"))
                .style(Style::default().fg(Color::Magenta))
        })
        .collect();
    let goals_chart = BarChart::default()
        .block(Block::default().title("Avg Goals by Competition").borders(Borders::ALL))
        .data(BarGroup::default().bars(&goals))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(goals_chart, bottom[1]);

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[3]);
}

fn render_kpis(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let kpis = state.kpis();
    let cards = [
        ("Total Matches", kpis.total_matches.to_string()),
        ("Total Events", kpis.total_events.to_string()),
        ("Unique Players", kpis.unique_players.to_string()),
        ("Avg Goals / Match", kpis.avg_goals_label()),
    ];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    for ((title, value), column) in cards.into_iter().zip(columns.iter()) {
        let card = Paragraph::new(value)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(card, *column);
    }
}

fn render_formations(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let frequency = state.formation_frequency();
    let title = format!("Formations: {}", filter_label(&state.filters.team));
    if frequency.is_empty() {
        let empty = Paragraph::new("No formations for this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, columns[0]);
    } else {
        frame.render_widget(horizontal_chart(&title, &frequency, Color::Cyan), columns[0]);
    }

    let windows = Paragraph::new(formation_windows_text(state))
        .block(Block::default().title("Windows").borders(Borders::ALL));
    frame.render_widget(windows, columns[1]);
}

fn formation_windows_text(state: &DashboardState) -> String {
    let rows = state.formations();
    if rows.is_empty() {
        return "No windows".to_string();
    }
    rows.iter()
        .map(|f| {
            format!(
                "{:>8} P{} {}-{} {:<18} {:<10} {:>2}",
                f.match_id,
                f.period,
                f.start,
                f.end,
                f.team_name.as_deref().unwrap_or("-"),
                f.formation,
                f.players_on_pitch
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn horizontal_chart(title: &str, data: &[(String, u64)], color: Color) -> BarChart<'static> {
    let bars: Vec<Bar> = data
        .iter()
        .map(|(label, n)| {
            Bar::default()
                .label(label.clone().into())
                .value(*n)
                .style(Style::default().fg(color))
        })
        .collect();
    BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
}

fn vertical_chart(title: &str, data: &[(String, u64)], bar_width: u16, color: Color) -> BarChart<'static> {
    let bars: Vec<Bar> = data
        .iter()
        .map(|(label, n)| {
            Bar::default()
                .label(label.clone().into())
                .value(*n)
                .style(Style::default().fg(color))
        })
        .collect();
    BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
}

fn xg_bin_label(idx: usize) -> String {
    // Only every fifth bin is labelled to keep the axis readable.
    if idx % 5 == 0 {
        format!("{:.1}", idx as f64 / XG_BINS as f64)
    } else {
        String::new()
    }
}

fn console_text(state: &DashboardState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Pitch Lab - Help",
        "",
        "Filters:",
        "  c            Cycle competition",
        "  s            Cycle season",
        "  t            Cycle team",
        "  r            Reset filters",
        "",
        "Global:",
        "  Tab          Overview / Formations",
        "  ?            Toggle help",
        "  q            Quit (filters are saved)",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
