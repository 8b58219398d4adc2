use std::{
    fs, io,
    ops::ControlFlow,
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect as CellRect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    cloud::{self, BoldFontMetrics, CloudLayout, Tooltip},
    config::{self, CloudConfig, Settings},
    core::{SceneGeometry, StaticScene, World},
    render::{self, CellScale, FrameBuffer, PillLabelMetrics},
    schedule::{CancelToken, Debouncer, FrameClock, FrameLoop, Throttle},
    sentiment::Lexicon,
    share,
    store::{CountStore, JsonFileStore},
    types::{ColorId, Rect, Size, Vec2, WordCount},
    words::{self, Room},
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

const PROMPT_TITLE: &str = "How do you feel about AI?";

pub fn run(settings: Settings) -> anyhow::Result<()> {
    let token = CancelToken::new();
    let mut app = App::new(&settings, token.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let frames = FrameLoop::new(Duration::from_secs_f32(1.0 / config::RENDER_HZ), token);
    let result = frames.run(|now| app.frame(&mut terminal, now));

    shutdown_terminal(&mut terminal)?;
    result.map(|_| ())
}

fn shutdown_terminal(terminal: &mut Term) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Pills,
    Cloud,
}

struct App {
    screen: Screen,
    room: Room,
    store: JsonFileStore,
    shared: Option<WordCount>,
    base_url: Url,
    seed: Option<u64>,
    lexicon: Lexicon,
    metrics: BoldFontMetrics,
    cloud_cfg: CloudConfig,
    scale: CellScale,
    world: Option<World>,
    start_attempted: bool,
    layout: CloudLayout,
    ranked: Vec<(String, u32)>,
    tooltip: Tooltip,
    input: String,
    status: String,
    clock: FrameClock,
    throttle: Throttle,
    pill_resize: Debouncer,
    cloud_resize: Debouncer,
    framebuf: FrameBuffer,
    viewport: CellRect,
    token: CancelToken,
}

impl App {
    fn new(settings: &Settings, token: CancelToken) -> Self {
        let link = settings.link.as_deref();
        let (room, shared) = opening_source(settings.room.as_deref(), link);
        let store = JsonFileStore::open(&settings.store);
        info!(
            room = room.as_str(),
            store = %store.path().display(),
            shared = shared.is_some(),
            "feelcloud starting"
        );

        Self {
            screen: if link.is_some() {
                Screen::Cloud
            } else {
                Screen::Pills
            },
            room,
            store,
            shared,
            base_url: settings.base_url.clone(),
            seed: settings.seed,
            lexicon: Lexicon::default(),
            metrics: BoldFontMetrics::default(),
            cloud_cfg: CloudConfig::default(),
            scale: CellScale::default(),
            world: None,
            start_attempted: false,
            layout: CloudLayout::default(),
            ranked: Vec::new(),
            tooltip: Tooltip::default(),
            input: String::new(),
            status: String::new(),
            clock: FrameClock::new(Instant::now()),
            throttle: Throttle::new(Duration::from_millis(config::SUBMIT_THROTTLE_MS)),
            pill_resize: Debouncer::new(Duration::from_millis(config::PILL_RESIZE_DEBOUNCE_MS)),
            cloud_resize: Debouncer::new(Duration::from_millis(config::CLOUD_RESIZE_DEBOUNCE_MS)),
            framebuf: FrameBuffer::new(0, 0),
            viewport: CellRect::default(),
            token,
        }
    }

    fn frame(&mut self, terminal: &mut Term, now: Instant) -> anyhow::Result<ControlFlow<()>> {
        let area = terminal.size()?;
        let viewport = Block::default().borders(Borders::ALL).inner(split(area)[1]);
        if viewport != self.viewport {
            let first = self.viewport == CellRect::default();
            self.viewport = viewport;
            self.framebuf.resize(viewport.width, viewport.height);
            if first {
                self.relayout();
            } else {
                self.pill_resize.trigger(now);
                self.cloud_resize.trigger(now);
            }
        }

        while event::poll(Duration::from_millis(0))? {
            self.handle(event::read()?, now);
        }
        if self.token.is_cancelled() {
            info!("feelcloud quitting");
            return Ok(ControlFlow::Break(()));
        }

        let scene = self.scene();
        if self.pill_resize.ready(now) {
            if let (Some(world), Some(size)) = (self.world.as_mut(), scene.container()) {
                world.resize(size);
                debug!(
                    overlap = world.max_overlap(),
                    container = ?world.container(),
                    "pills clamped after resize"
                );
            }
            self.start_attempted = false;
        }
        if self.cloud_resize.ready(now) {
            self.relayout();
        }

        let elapsed = self.clock.elapsed_ms(now);
        if self.screen == Screen::Pills {
            self.ensure_world(&scene);
            if let Some(world) = self.world.as_mut() {
                world.tick(elapsed, &scene);
            }
        }

        self.paint();
        terminal.draw(|frame| self.draw(frame, &scene))?;
        Ok(ControlFlow::Continue(()))
    }

    fn ensure_world(&mut self, scene: &StaticScene) {
        if self.world.is_some() || self.start_attempted {
            return;
        }
        self.start_attempted = true;
        match World::start(
            &config::SUGGESTIONS,
            scene,
            &PillLabelMetrics::new(self.scale),
            World::seeded(self.seed),
        ) {
            Ok(world) => self.world = Some(world),
            Err(err) => self.status = format!("pills paused: {err}"),
        }
    }

    fn handle(&mut self, event: CrosstermEvent, now: Instant) {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                match (self.screen, key.code) {
                    (_, KeyCode::Esc) | (Screen::Cloud, KeyCode::Char('q')) => self.token.cancel(),
                    (_, KeyCode::Tab) => self.switch(match self.screen {
                        Screen::Pills => Screen::Cloud,
                        Screen::Cloud => Screen::Pills,
                    }),
                    (Screen::Pills, KeyCode::Enter) => {
                        let raw = std::mem::take(&mut self.input);
                        self.submit(&raw, now);
                    }
                    (Screen::Pills, KeyCode::Backspace) => {
                        self.input.pop();
                    }
                    (Screen::Pills, KeyCode::Char(ch)) => {
                        if !ch.is_control() && self.input.len() < 32 {
                            self.input.push(ch);
                        }
                    }
                    (Screen::Cloud, KeyCode::Char('s')) => self.share(),
                    (Screen::Cloud, KeyCode::Char('r')) => self.reset(),
                    (Screen::Cloud, KeyCode::Char('d')) => self.download(),
                    _ => {}
                }
            }
            CrosstermEvent::Mouse(mouse) => {
                let point = self.pointer(mouse.column, mouse.row);
                match (self.screen, mouse.kind, point) {
                    (Screen::Pills, MouseEventKind::Down(MouseButton::Left), Some(point)) => {
                        let mut picked = None;
                        if let Some(world) = &self.world {
                            world.activate_at(point, |word| picked = Some(word.to_string()));
                        }
                        if let Some(word) = picked {
                            self.submit(&word, now);
                        }
                    }
                    (Screen::Cloud, MouseEventKind::Moved, Some(point)) => {
                        self.tooltip.update(&self.layout, point);
                    }
                    (Screen::Cloud, _, None) => self.tooltip.hide(),
                    _ => {}
                }
            }
            CrosstermEvent::Resize(width, height) => {
                info!(width, height, "terminal resized");
            }
            _ => {}
        }
    }

    fn switch(&mut self, screen: Screen) {
        self.screen = screen;
        self.tooltip.hide();
        if screen == Screen::Cloud {
            self.relayout();
        }
    }

    fn submit(&mut self, raw: &str, now: Instant) {
        if !self.throttle.allow(now) {
            return;
        }
        let word = match words::check(raw) {
            Ok(word) => word,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        match self.store.increment(&self.room, &word) {
            Ok(count) => {
                info!(
                    word = %word,
                    room = self.room.as_str(),
                    count,
                    color = self.lexicon.classify(&word).hex(),
                    "submission stored"
                );
                self.status = format!("added \"{word}\"");
                self.shared = None;
                self.switch(Screen::Cloud);
            }
            Err(err) => {
                warn!(word = %word, error = %err, "submission failed");
                self.status = format!("could not save: {err}");
            }
        }
    }

    fn share(&mut self) {
        match share::link(&self.base_url, &self.counts()) {
            Ok(mut url) => {
                if !self.room.is_default() {
                    url.query_pairs_mut().append_pair(share::ROOM_PARAM, self.room.as_str());
                }
                info!(url = %url, "share link built");
                self.status = url.to_string();
            }
            Err(err) => self.status = format!("share failed: {err}"),
        }
    }

    fn download(&mut self) {
        match export_cloud(&self.framebuf, self.store.path()) {
            Ok(path) => {
                info!(path = %path.display(), "cloud exported");
                self.status = format!("saved {}", path.display());
            }
            Err(err) => {
                warn!(error = %err, "cloud export failed");
                self.status = format!("export failed: {err}");
            }
        }
    }

    fn reset(&mut self) {
        self.shared = None;
        if let Err(err) = self.store.reset(&self.room) {
            warn!(error = %err, "reset failed");
            self.status = format!("reset failed: {err}");
        } else {
            info!(room = self.room.as_str(), "room data reset");
            self.status = "session data reset".to_string();
        }
        self.relayout();
    }

    fn counts(&self) -> WordCount {
        self.shared
            .clone()
            .unwrap_or_else(|| self.store.counts(&self.room))
    }

    fn relayout(&mut self) {
        self.ranked = cloud::ranked(&self.counts());
        self.layout = cloud::layout(
            self.container(),
            &self.ranked,
            &self.metrics,
            &self.lexicon,
            &self.cloud_cfg,
        );
        self.tooltip.hide();
    }

    fn container(&self) -> Size {
        Size::new(
            self.viewport.width as f32 * self.scale.px_w,
            self.viewport.height as f32 * self.scale.px_h,
        )
    }

    /// Container and prompt card geometry for the current viewport.
    fn scene(&self) -> StaticScene {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return StaticScene::default();
        }
        let card = prompt_card(self.viewport);
        StaticScene {
            container: Some(self.container()),
            obstacle: card.map(|card| {
                Rect::new(
                    (card.x - self.viewport.x) as f32 * self.scale.px_w,
                    (card.y - self.viewport.y) as f32 * self.scale.px_h,
                    card.width as f32 * self.scale.px_w,
                    card.height as f32 * self.scale.px_h,
                )
            }),
        }
    }

    fn pointer(&self, column: u16, row: u16) -> Option<Vec2> {
        let v = self.viewport;
        let inside = column >= v.x && column < v.x + v.width && row >= v.y && row < v.y + v.height;
        inside.then(|| self.scale.to_px(column - v.x, row - v.y))
    }

    fn paint(&mut self) {
        match self.screen {
            Screen::Pills => {
                match &self.world {
                    Some(world) => render::draw_pills(
                        world.views(&self.lexicon),
                        self.scale,
                        &mut self.framebuf,
                    ),
                    None => self.framebuf.clear(),
                }
            }
            Screen::Cloud => {
                render::draw_cloud(&self.layout, self.scale, &mut self.framebuf);
                render::draw_tooltip(&self.tooltip, self.scale, &mut self.framebuf);
            }
        }
    }

    fn draw(&self, frame: &mut Frame, scene: &StaticScene) {
        let chunks = split(frame.size());

        let header = match self.screen {
            Screen::Pills => format!("room: {} | pick a pill or type one word", self.room.as_str()),
            Screen::Cloud => format!(
                "{}{} | placed {} / dropped {}",
                if self.shared.is_some() { "[shared] " } else { "" },
                cloud::summary(&self.ranked),
                self.layout.placed.len(),
                self.layout.dropped,
            ),
        };
        frame.render_widget(
            Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("feelcloud")),
            chunks[0],
        );

        let title = match self.screen {
            Screen::Pills => "Pills",
            Screen::Cloud => "Cloud",
        };
        frame.render_widget(
            Paragraph::new(self.lines()).block(Block::default().borders(Borders::ALL).title(title)),
            chunks[1],
        );

        if self.screen == Screen::Pills && scene.obstacle().is_some() {
            if let Some(card) = prompt_card(self.viewport) {
                frame.render_widget(Clear, card);
                let body = vec![
                    Line::from(format!("> {}_", self.input)),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Enter: submit | click a pill to pick it",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                frame.render_widget(
                    Paragraph::new(body)
                        .wrap(Wrap { trim: true })
                        .block(Block::default().borders(Borders::ALL).title(PROMPT_TITLE)),
                    card,
                );
            }
        }

        let controls = match self.screen {
            Screen::Pills => "Tab: cloud | Esc: quit",
            Screen::Cloud => "Tab: pills | s: share link | d: download | r: reset | q: quit",
        };
        let footer = if self.status.is_empty() {
            controls.to_string()
        } else {
            format!("{controls} | {}", self.status)
        };
        frame.render_widget(
            Paragraph::new(footer)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Controls")),
            chunks[2],
        );
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let fb = &self.framebuf;
        (0..fb.height())
            .map(|y| {
                let spans = (0..fb.width())
                    .map(|x| {
                        let cell = fb.get(x, y);
                        Span::styled(cell.ch.to_string(), style_for(cell.color, cell.bold))
                    })
                    .collect::<Vec<_>>();
                Line::from(spans)
            })
            .collect()
    }
}

/// Room and shared counts a session opens with. An explicit room wins over
/// the link's; a link without a usable payload falls back to local counts.
fn opening_source(room: Option<&str>, link: Option<&str>) -> (Room, Option<WordCount>) {
    let room = room
        .map(Room::parse)
        .or_else(|| link.and_then(share::room_from_query))
        .unwrap_or_default();
    let shared = link.and_then(|link| {
        let counts = share::decode_query(link);
        if counts.is_none() {
            warn!(link, "shared link carries no data, showing local counts");
        }
        counts
    });
    (room, shared)
}

/// Writes the rendered cloud as plain text beside the store file.
fn export_cloud(frame: &FrameBuffer, store_path: &Path) -> io::Result<PathBuf> {
    let path = store_path.with_file_name(config::CLOUD_EXPORT_FILE);
    fs::write(&path, frame.to_text())?;
    Ok(path)
}

fn split(area: CellRect) -> Rc<[CellRect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area)
}

/// Centred prompt card; `None` when the viewport cannot hold one.
fn prompt_card(viewport: CellRect) -> Option<CellRect> {
    if viewport.width < 24 || viewport.height < 9 {
        return None;
    }
    let width = viewport.width.saturating_sub(4).min(56);
    let height = 5;
    Some(CellRect::new(
        viewport.x + (viewport.width - width) / 2,
        viewport.y + (viewport.height - height) / 2,
        width,
        height,
    ))
}

fn style_for(color: ColorId, bold: bool) -> Style {
    let style = match color {
        ColorId::Positive | ColorId::Negative | ColorId::Neutral => {
            let (r, g, b) = sentiment_rgb(color);
            Style::default().fg(Color::Rgb(r, g, b))
        }
        ColorId::Text => Style::default().fg(Color::White),
        ColorId::Tooltip => Style::default().fg(Color::White).bg(Color::Black),
    };
    if bold {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn sentiment_rgb(color: ColorId) -> (u8, u8, u8) {
    use crate::sentiment::Sentiment;
    match color {
        ColorId::Positive => Sentiment::Positive.rgb(),
        ColorId::Negative => Sentiment::Negative.rgb(),
        _ => Sentiment::Neutral.rgb(),
    }
}
