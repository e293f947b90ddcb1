//! Lectern — terminal lesson presenter with a narrating avatar

use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::bounded;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::canvas::{Canvas, Circle};
use ratatui::widgets::*;

use lectern::audio::AudioAnalysis;
use lectern::config::visual::{AVATAR_RADIUS, CANVAS_SIZE};
use lectern::visual::GlowFrame;

use lectern_app::avatar::{animated_radius, AvatarState, IndicatorState, BUBBLE_TEXT};
use lectern_app::config::gemini::API_KEY_ENV;
use lectern_app::config::lesson::QUICK_TOPICS;
use lectern_app::providers::GeminiProvider;
use lectern_app::session::state::{SessionCommand, SessionPhase, SessionSnapshot, SlideAudioPhase};
use lectern_app::session::SessionController;

#[derive(Parser)]
#[command(name = "lectern", about = "AI-generated mini lessons with a narrating avatar", version)]
struct Cli {
    /// Topic to generate immediately (otherwise start at the input screen)
    topic: Option<String>,

    /// Gemini API key (defaults to $GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

/// UI-local state (everything session-related lives in the shared snapshot)
struct Ui {
    input: String,
    chip_index: usize,
    tick: u64,
    running: bool,
}

impl Ui {
    fn new() -> Self {
        Self {
            input: String::new(),
            chip_index: 0,
            tick: 0,
            running: true,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty());
    let Some(api_key) = api_key else {
        eprintln!("Error: no API key. Set {API_KEY_ENV} or pass --api-key.");
        std::process::exit(1);
    };

    let provider = Arc::new(GeminiProvider::new(api_key)?);

    // Shared command channel + state
    let (cmd_tx, cmd_rx) = bounded(64);
    let shared_state = Arc::new(Mutex::new(SessionSnapshot::default()));

    // Channel for the engine's analysis Arc (one-shot handshake)
    let (analysis_tx, analysis_rx) = bounded::<Arc<Mutex<AudioAnalysis>>>(1);

    // Spawn controller on its own thread
    let ctrl_state = shared_state.clone();
    let ctrl_tx = cmd_tx.clone();
    let ctrl_content = provider.clone();
    let ctrl_speech = provider.clone();
    std::thread::Builder::new()
        .name("controller".into())
        .spawn(move || {
            let mut ctrl = SessionController::new(
                cmd_rx,
                ctrl_tx,
                ctrl_state,
                ctrl_content,
                ctrl_speech,
                Some(analysis_tx),
            );
            ctrl.run();
        })
        .expect("Failed to spawn controller thread");

    if let Some(topic) = cli.topic {
        let _ = cmd_tx.send(SessionCommand::SubmitTopic(topic));
    }

    // Wait for the engine to initialize and send the analysis Arc; stays None
    // when no audio device is available (playback is inert then).
    let analysis = analysis_rx.recv_timeout(Duration::from_secs(5)).ok();

    // Suppress stderr during TUI — ALSA/PulseAudio and other libs write
    // diagnostic messages to stderr which corrupt the ratatui display.
    let saved_stderr = unsafe { libc::dup(2) };
    {
        let devnull = std::fs::File::open("/dev/null")?;
        unsafe { libc::dup2(devnull.as_raw_fd(), 2) };
    }

    // Enter TUI
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(33); // ~30fps
    let mut last_tick = Instant::now();
    let mut ui = Ui::new();

    while ui.running {
        let snapshot = shared_state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        // Sample the glow once per frame from the shared analysis.
        // try_lock: skip the glow this tick if the analyzer holds the lock.
        let glow = analysis
            .as_ref()
            .and_then(|a| a.try_lock().ok().map(|data| data.bins))
            .and_then(|bins| GlowFrame::from_bins(&bins));

        terminal.draw(|f| draw_ui(f, &ui, &snapshot, glow))?;

        // Poll input
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key.code, &mut ui, &snapshot, &cmd_tx);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            ui.tick += 1;
        }
    }

    // Tell the controller to shut down (stops the engine) before leaving the
    // alternate screen, so rodio teardown noise stays off the real terminal.
    let _ = cmd_tx.send(SessionCommand::Shutdown);

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    // Restore stderr
    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    Ok(())
}

fn handle_key(
    code: KeyCode,
    ui: &mut Ui,
    snapshot: &SessionSnapshot,
    cmd_tx: &crossbeam_channel::Sender<SessionCommand>,
) {
    match snapshot.phase {
        SessionPhase::Idle => match code {
            KeyCode::Esc => ui.running = false,
            KeyCode::Enter => {
                let topic = if ui.input.trim().is_empty() {
                    QUICK_TOPICS[ui.chip_index % QUICK_TOPICS.len()].to_string()
                } else {
                    ui.input.clone()
                };
                let _ = cmd_tx.send(SessionCommand::SubmitTopic(topic));
            }
            KeyCode::Left => {
                ui.chip_index = (ui.chip_index + QUICK_TOPICS.len() - 1) % QUICK_TOPICS.len();
            }
            KeyCode::Right => {
                ui.chip_index = (ui.chip_index + 1) % QUICK_TOPICS.len();
            }
            KeyCode::Backspace => {
                ui.input.pop();
            }
            KeyCode::Char(c) => ui.input.push(c),
            _ => {}
        },
        SessionPhase::GeneratingContent => {
            if code == KeyCode::Esc {
                ui.running = false;
            }
        }
        SessionPhase::Error => match code {
            KeyCode::Enter | KeyCode::Char('r') => {
                let _ = cmd_tx.send(SessionCommand::Reset);
            }
            KeyCode::Char('q') | KeyCode::Esc => ui.running = false,
            _ => {}
        },
        SessionPhase::Ready => match code {
            KeyCode::Char('q') | KeyCode::Esc => ui.running = false,
            KeyCode::Left => {
                let _ = cmd_tx.send(SessionCommand::PrevSlide);
            }
            KeyCode::Right => {
                let _ = cmd_tx.send(SessionCommand::NextSlide);
            }
            KeyCode::Char(' ') => {
                let _ = cmd_tx.send(SessionCommand::TogglePlay);
            }
            KeyCode::Char('r') | KeyCode::Char('n') => {
                ui.input.clear();
                let _ = cmd_tx.send(SessionCommand::Reset);
            }
            KeyCode::Char('m') => {
                if snapshot.is_muted {
                    let _ = cmd_tx.send(SessionCommand::Unmute);
                } else {
                    let _ = cmd_tx.send(SessionCommand::Mute);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let vol = (snapshot.volume + 0.05).min(2.0);
                let _ = cmd_tx.send(SessionCommand::SetVolume(vol));
            }
            KeyCode::Char('-') => {
                let vol = (snapshot.volume - 0.05).max(0.0);
                let _ = cmd_tx.send(SessionCommand::SetVolume(vol));
            }
            _ => {}
        },
    }
}

fn draw_ui(f: &mut Frame, ui: &Ui, snapshot: &SessionSnapshot, glow: Option<GlowFrame>) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Lectern v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    match snapshot.phase {
        SessionPhase::Idle => draw_idle(f, ui, inner),
        SessionPhase::GeneratingContent => draw_generating(f, ui, inner),
        SessionPhase::Error => draw_error(f, snapshot, inner),
        SessionPhase::Ready => draw_ready(f, ui, snapshot, glow, inner),
    }
}

fn draw_idle(f: &mut Frame, ui: &Ui, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(4),    // banner
        Constraint::Length(3), // input
        Constraint::Length(4), // quick topics
        Constraint::Length(2), // help
    ])
    .split(area);

    let banner = vec![
        Line::default(),
        Line::from(Span::styled(
            "一键生成大师级视频网课",
            Style::default().fg(Color::White).bold(),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            "输入任意知识点，瞬间生成包含精美幻灯片与数字人老师实时讲解的互动课程",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    ];
    f.render_widget(Paragraph::new(banner), chunks[0]);

    let input_block = Block::default()
        .title(" 输入你想学的课题 (Enter 生成) ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));
    let cursor = if ui.tick % 20 < 10 { "▌" } else { " " };
    let input_line = Line::from(vec![
        Span::raw(" "),
        Span::styled(&ui.input, Style::default().fg(Color::White)),
        Span::styled(cursor, Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(input_line).block(input_block), chunks[1]);

    let mut chip_line = vec![Span::raw(" ")];
    for (i, topic) in QUICK_TOPICS.iter().enumerate() {
        let style = if i == ui.chip_index {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        chip_line.push(Span::styled(format!(" {} ", topic), style));
        chip_line.push(Span::raw("  "));
    }
    let chips = Paragraph::new(vec![
        Line::from(Span::styled(
            " 热门课题 (←/→ 选择，输入框为空时 Enter 即生成)",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(chip_line),
    ]);
    f.render_widget(chips, chunks[2]);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Esc 退出",
            Style::default().fg(Color::DarkGray),
        ))),
        chunks[3],
    );
}

fn draw_generating(f: &mut Frame, ui: &Ui, area: Rect) {
    const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = FRAMES[(ui.tick as usize / 2) % FRAMES.len()];

    let lines = vec![
        Line::default(),
        Line::default(),
        Line::from(Span::styled(
            format!("{spinner} 正在构建课程..."),
            Style::default().fg(Color::Cyan).bold(),
        ))
        .alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "AI 老师正在为您撰写大纲、设计幻灯片并准备演讲稿",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_error(f: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let detail = snapshot.last_error.as_deref().unwrap_or("未知错误");
    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "生成失败",
            Style::default().fg(Color::Red).bold(),
        ))
        .alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "抱歉，AI 老师遇到了一点小问题，请稍后重试。",
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            truncate_str(detail, area.width.saturating_sub(4) as usize),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "Enter 返回重试 · q 退出",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_ready(
    f: &mut Frame,
    ui: &Ui,
    snapshot: &SessionSnapshot,
    glow: Option<GlowFrame>,
    area: Rect,
) {
    let chunks = Layout::vertical([
        Constraint::Min(10),  // slide + avatar
        Constraint::Length(5), // transport bar
    ])
    .split(area);

    let cols =
        Layout::horizontal([Constraint::Percentage(68), Constraint::Percentage(32)]).split(chunks[0]);

    draw_slide(f, snapshot, cols[0]);
    draw_avatar(f, ui, snapshot, glow, cols[1]);
    draw_transport(f, snapshot, chunks[1]);
}

fn draw_slide(f: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let Some(slide) = snapshot.current_slide() else {
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", slide.title))
        .title_style(Style::default().fg(Color::White).bold())
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(slide_accent(snapshot.slide_index)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![Line::default()];
    for point in &slide.bullet_points {
        lines.push(Line::from(vec![
            Span::styled("  ● ", Style::default().fg(slide_accent(snapshot.slide_index))),
            Span::styled(point.as_str(), Style::default().fg(Color::White)),
        ]));
        lines.push(Line::default());
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    // Module badge in the bottom-right corner
    if inner.height >= 1 {
        let badge = format!(
            "Module {} / {}",
            snapshot.slide_index + 1,
            snapshot.slide_count()
        );
        let badge_area = Rect {
            x: inner.x,
            y: inner.y + inner.height - 1,
            width: inner.width,
            height: 1,
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                badge,
                Style::default().fg(Color::DarkGray),
            )))
            .alignment(Alignment::Right),
            badge_area,
        );
    }
}

/// Per-slide accent color, cycled by index like the original deck gradients
fn slide_accent(index: usize) -> Color {
    const ACCENTS: [Color; 5] = [
        Color::Blue,
        Color::Green,
        Color::Magenta,
        Color::Red,
        Color::Cyan,
    ];
    ACCENTS[index % ACCENTS.len()]
}

fn draw_avatar(
    f: &mut Frame,
    ui: &Ui,
    snapshot: &SessionSnapshot,
    glow: Option<GlowFrame>,
    area: Rect,
) {
    let avatar = AvatarState::derive(snapshot);
    let center = (CANVAS_SIZE / 2.0) as f64;
    let radius = animated_radius(AVATAR_RADIUS, avatar.animation, ui.tick) as f64;

    let indicator_color = match avatar.indicator {
        IndicatorState::Live => Color::Green,
        IndicatorState::Busy => Color::Yellow,
        IndicatorState::Off => Color::DarkGray,
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" AI 老师 ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, CANVAS_SIZE as f64])
        .y_bounds([0.0, CANVAS_SIZE as f64])
        .paint(move |ctx| {
            // Glow layers behind the avatar, driven by narration energy
            if let Some(frame) = glow {
                ctx.draw(&Circle {
                    x: center,
                    y: center,
                    radius: frame.glow_radius as f64,
                    color: if frame.glow_alpha > 0.3 {
                        Color::LightBlue
                    } else {
                        Color::Blue
                    },
                });
                ctx.draw(&Circle {
                    x: center,
                    y: center,
                    radius: frame.ring_radius as f64,
                    color: if frame.ring_alpha > 0.4 {
                        Color::White
                    } else {
                        Color::Gray
                    },
                });
            }

            // The avatar portrait ring
            ctx.draw(&Circle {
                x: center,
                y: center,
                radius,
                color: if avatar.is_speaking {
                    Color::LightCyan
                } else {
                    Color::DarkGray
                },
            });

            // Status indicator dot at the lower right of the portrait
            ctx.draw(&Circle {
                x: center + radius * 0.7,
                y: center - radius * 0.7,
                radius: 4.0,
                color: indicator_color,
            });

            // Transient speech bubble
            if avatar.show_bubble {
                ctx.print(
                    center - 20.0,
                    CANVAS_SIZE as f64 - 10.0,
                    Line::from(Span::styled(
                        BUBBLE_TEXT,
                        Style::default().fg(Color::White).bold(),
                    )),
                );
            }
        });

    f.render_widget(canvas, area);
}

fn draw_transport(f: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(1), // progress segments
        Constraint::Length(1), // script
        Constraint::Length(1), // status + help
    ])
    .split(inner);

    // Segmented progress bar, one cell group per slide
    let count = snapshot.slide_count().max(1);
    let seg_width = (rows[0].width as usize).saturating_sub(2) / count;
    let mut spans = vec![Span::raw(" ")];
    for i in 0..count {
        let style = if i <= snapshot.slide_index {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("━".repeat(seg_width.max(1)), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

    // Current narration script, quoted
    let script = snapshot
        .current_slide()
        .map(|s| s.script.as_str())
        .unwrap_or("");
    let script_line = Line::from(Span::styled(
        format!(" “{}”", truncate_str(script, rows[1].width.saturating_sub(5) as usize)),
        Style::default().fg(Color::DarkGray).italic(),
    ));
    f.render_widget(Paragraph::new(script_line), rows[1]);

    // Status on the left, key help on the right
    let status = match snapshot.audio {
        SlideAudioPhase::Loading => Span::styled("合成语音...", Style::default().fg(Color::Yellow)),
        SlideAudioPhase::Playing => Span::styled("播放中", Style::default().fg(Color::Green)),
        SlideAudioPhase::Paused => Span::styled("已暂停", Style::default().fg(Color::Gray)),
        SlideAudioPhase::Finished => Span::styled("播放完毕", Style::default().fg(Color::DarkGray)),
        SlideAudioPhase::Idle => match &snapshot.audio_error {
            Some(e) => Span::styled(
                format!("语音不可用: {}", truncate_str(e, 40)),
                Style::default().fg(Color::Red),
            ),
            None => Span::styled("--", Style::default().fg(Color::DarkGray)),
        },
    };
    let volume = if snapshot.is_muted {
        "静音".to_string()
    } else {
        format!("音量 {:.0}%", snapshot.volume * 100.0)
    };
    let help = format!(
        "{volume} · ←/→ 翻页 · Space 播放/暂停 · +/- 音量 · m 静音 · r 新课程 · q 退出"
    );

    let cols = Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[2]);
    f.render_widget(
        Paragraph::new(Line::from(vec![Span::raw(" "), status])),
        cols[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Right),
        cols[1],
    );
}

fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}
