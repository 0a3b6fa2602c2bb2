use std::{
    io::{self, Stdout, Write},
    process::ExitCode,
    rc::Rc,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use sigchat::{
    clock::{ClockSource, LocalClock, Timers},
    widgets::{ChatScreen, MountEnv},
    ChatConfig, Key, Keyboard, Runtime,
};
use tracing::{error, info};

const IDLE_POLL: Duration = Duration::from_millis(250);

static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Stderr, muted while the alternate screen is shown.
struct LogWriter;

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if SCREEN_ACTIVE.load(Ordering::Relaxed) {
            return Ok(buf.len());
        }
        io::stderr().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Raw mode and the alternate screen, restored on drop.
struct Terminal {
    out: Stdout,
}

impl Terminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let out = io::stdout();
        SCREEN_ACTIVE.store(true, Ordering::Relaxed);
        let mut term = Self { out };
        queue!(term.out, EnterAlternateScreen, Hide)?;
        term.out.flush()?;
        Ok(term)
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        self.out.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = queue!(self.out, Show, LeaveAlternateScreen);
        let _ = self.out.flush();
        let _ = terminal::disable_raw_mode();
        SCREEN_ACTIVE.store(false, Ordering::Relaxed);
    }
}

enum Input {
    Key(Key),
    Quit,
}

fn map_key(e: KeyEvent) -> Option<Input> {
    if e.kind == KeyEventKind::Release {
        return None;
    }
    match e.code {
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char('c') if e.modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Quit),
        KeyCode::Char(c) => Some(Input::Key(Key::Char(c))),
        KeyCode::Backspace => Some(Input::Key(Key::Backspace)),
        KeyCode::Enter => Some(Input::Key(Key::Enter)),
        _ => None,
    }
}

fn run(config: ChatConfig) -> io::Result<()> {
    // Read before any other thread exists; the local offset is unavailable afterwards on some platforms.
    let clock = LocalClock::new();
    let mut rt = Runtime::new();
    let env = MountEnv {
        username: config.username,
        timers: Timers::new(),
        keyboard: Keyboard::new(),
        clock: ClockSource::new(config.tick, Rc::new(clock)),
    };
    let screen = ChatScreen::mount(config.manager.create(), &env);
    info!(manager = %config.manager, "chat screen mounted");

    let mut term = Terminal::enter()?;
    let start = Instant::now();
    loop {
        rt.update();
        // size is read every frame, so a resize event only has to wake the loop
        let (cols, rows) = terminal::size()?;
        term.draw(&screen.render_viewport(rows.into(), cols.into()))?;

        let timeout = env
            .timers
            .next_deadline()
            .map_or(IDLE_POLL, |d| d.saturating_sub(start.elapsed()));
        if event::poll(timeout)? {
            if let Event::Key(e) = event::read()? {
                match map_key(e) {
                    Some(Input::Quit) => break,
                    Some(Input::Key(key)) => env.keyboard.dispatch(key, rt.ac()),
                    None => {}
                }
            }
        }
        env.timers.advance_to(start.elapsed());
    }
    drop(term);
    info!("quit");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(|| LogWriter).init();

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "terminal failure");
            ExitCode::FAILURE
        }
    }
}
