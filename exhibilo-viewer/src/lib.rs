/// Exhibilo model viewer
///
/// Resolves a model reference (an uploaded file or a URL), decodes and
/// normalizes it with `exhibilo-core`, and shows it in the terminal with an
/// ASCII rasterizer. Loads run on a tokio runtime; only the most recent one
/// may update what is on screen.
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use exhibilo_core::{Camera, RotationState, Transform, ACCEPTED_EXTENSIONS};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

pub mod asset;
pub mod config;
pub mod error;
pub mod loader;
pub mod renderer;
pub mod resolver;
pub mod session;
pub mod state;

pub use asset::{AssetReference, ObjectUrl, ObjectUrls, UploadedBlob};
pub use config::ViewerConfig;
pub use error::{ConfigError, LoadError};
pub use loader::{AssetLoader, LoadedModel};
pub use renderer::{AsciiRenderer, Background};
pub use resolver::{ResolvedSource, Resolver};
pub use session::LoadSession;
pub use state::{LoadEvent, LoadPhase, LoadToken, LoadUpdate, Viewer, ViewerState};

/// Margin around the normalized model when framing the camera
const FRAME_MARGIN: f32 = 1.6;

#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub frame_rate: u32,
    pub background: Background,
}

impl From<&ViewerConfig> for AppOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            frame_rate: config.frame_rate.max(1),
            background: if config.light_background {
                Background::Light
            } else {
                Background::Dark
            },
        }
    }
}

/// Main application struct for terminal model viewing
pub struct TerminalApp {
    viewer: Viewer,
    session: LoadSession,
    updates: UnboundedReceiver<LoadUpdate>,
    sources: Vec<AssetReference>,
    current: usize,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    wireframe: bool,
    auto_rotate: bool,
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(
        session: LoadSession,
        updates: UnboundedReceiver<LoadUpdate>,
        sources: Vec<AssetReference>,
        options: AppOptions,
    ) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let mut renderer = AsciiRenderer::new(width as usize, height as usize);
        renderer.set_background(options.background);

        Ok(Self {
            viewer: Viewer::new(),
            session,
            updates,
            sources,
            current: 0,
            rotation: RotationState::zero(),
            // Terminal cells are about twice as tall as they are wide
            camera: Camera::new(width as u32, height as u32 * 2),
            renderer,
            wireframe: false,
            auto_rotate: true,
            frame_time: Duration::from_millis(1000 / options.frame_rate.max(1) as u64),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        self.load_current();

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.sync_updates();
            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn load_current(&mut self) {
        if let Some(reference) = self.sources.get(self.current).cloned() {
            self.rotation = RotationState::zero();
            self.session.start(&mut self.viewer, reference);
        }
    }

    /// Switch to the next or previous source. Any load in flight is superseded.
    fn cycle(&mut self, forward: bool) {
        let count = self.sources.len();
        if count < 2 {
            return;
        }
        self.current = if forward {
            (self.current + 1) % count
        } else {
            (self.current + count - 1) % count
        };
        self.load_current();
    }

    fn handle_input(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => {
                    self.rotation.rotate(0.1, 0.0, 0.0);
                }
                KeyCode::Char('s') | KeyCode::Down => {
                    self.rotation.rotate(-0.1, 0.0, 0.0);
                }
                KeyCode::Char('a') | KeyCode::Left => {
                    self.rotation.rotate(0.0, -0.1, 0.0);
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    self.rotation.rotate(0.0, 0.1, 0.0);
                }
                KeyCode::Char('e') => {
                    self.rotation.rotate(0.0, 0.0, 0.1);
                }
                KeyCode::Char('r') => {
                    self.rotation.rotate(0.0, 0.0, -0.1);
                }
                KeyCode::Char(' ') => {
                    self.auto_rotate = !self.auto_rotate;
                }
                KeyCode::Char('f') => {
                    self.wireframe = !self.wireframe;
                    if let Some(model) = self.viewer.model_mut() {
                        model.asset.set_wireframe(self.wireframe);
                    }
                }
                KeyCode::Char('o') => self.camera.toggle_mode(),
                KeyCode::Char('b') => {
                    let background = self.renderer.background().toggle();
                    self.renderer.set_background(background);
                }
                KeyCode::Char('n') | KeyCode::Tab => self.cycle(true),
                KeyCode::Char('p') | KeyCode::BackTab => self.cycle(false),
                KeyCode::Char('c') => self.viewer.clear(),
                _ => {}
            },
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.camera.set_viewport(width as u32, height as u32 * 2);
            }
            _ => {}
        }
        Ok(())
    }

    fn sync_updates(&mut self) {
        if session::drain(&mut self.viewer, &mut self.updates) == 0 {
            return;
        }
        if let Some(model) = self.viewer.model_mut() {
            model.asset.set_wireframe(self.wireframe);
            let extent = model.extent();
            self.camera.frame(extent, FRAME_MARGIN);
        }
    }

    fn update(&mut self) {
        if self.auto_rotate && self.viewer.state().model().is_some() {
            self.rotation.rotate(0.0, 0.01, 0.0);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let orbit = Transform::rotation_matrix(&self.rotation);

        self.renderer.clear();
        if let Some(model) = self.viewer.state().model() {
            self.renderer
                .render_floor(model.floor_height(), model.extent(), &orbit, &self.camera);
            self.renderer.render_asset(&model.asset, &orbit, &self.camera);
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // UI overlay
        let (_, height) = terminal::size()?;
        let (status, color) = status_line(self.viewer.state());
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Exhibilo Viewer | FPS: {:.1} | {}/{} | WASD=Rotate F=Wireframe O=Ortho B=Background N/P=Model Q=Quit",
                self.fps,
                (self.current + 1).min(self.sources.len()),
                self.sources.len(),
            )),
            cursor::MoveTo(0, height.saturating_sub(1)),
            SetForegroundColor(color),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// One-line description of the viewer state for the bottom of the screen
pub fn status_line(state: &ViewerState) -> (String, Color) {
    match state {
        ViewerState::Idle => (
            format!("Pass a model file ({ACCEPTED_EXTENSIONS}) or a page URL with ?model="),
            Color::Grey,
        ),
        ViewerState::Failed(err) => (format!("Error: {err}"), Color::Red),
        ViewerState::Ready(model) => (
            format!(
                "{} | {} | {} triangles | extent {:.2}",
                model.name,
                model.format(),
                model.asset.triangle_count(),
                model.extent()
            ),
            Color::Green,
        ),
        loading => {
            let phase = loading.phase().map(LoadPhase::label).unwrap_or_default();
            (format!("Loading model… ({phase})"), Color::Cyan)
        }
    }
}
