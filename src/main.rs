// Copyright (c) 2026 rezky_nightky

mod cell;
mod charset;
mod cloud;
mod column;
mod config;
mod frame;
mod logging;
mod palette;
mod runtime;
mod terminal;

use std::collections::TryReserveError;
use std::env;
use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::Event;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::cloud::Cloud;
use crate::config::{parse_args, Settings};
use crate::frame::Frame;
use crate::runtime::{key_action, Action};
use crate::terminal::{restore_terminal_best_effort, Screen, Terminal};

enum RunError {
    Io(io::Error),
    OutOfMemory(TryReserveError),
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

impl From<TryReserveError> for RunError {
    fn from(e: TryReserveError) -> Self {
        RunError::OutOfMemory(e)
    }
}

/// Drains pending input without blocking. Returns false once quit is seen.
fn handle_input<S: Screen>(screen: &mut S, cloud: &mut Cloud) -> io::Result<bool> {
    while let Some(ev) = screen.next_event()? {
        if let Event::Key(k) = ev {
            match key_action(&k) {
                Some(Action::Quit) => return Ok(false),
                Some(Action::TogglePause) => cloud.toggle_pause(),
                None => {}
            }
        }
    }
    Ok(true)
}

/// Re-reads the terminal size and regrows the grid if it moved. A fresh
/// frame makes the next present clear the whole screen.
fn handle_resize<S: Screen>(
    screen: &mut S,
    cloud: &mut Cloud,
    frame: &mut Frame,
) -> Result<(), RunError> {
    let (w, h) = screen.size()?;
    if (w, h) != (cloud.width, cloud.height) {
        cloud.resize(w, h)?;
        *frame = Frame::try_new(w, h)?;
    }
    Ok(())
}

/// Frame scheduler. Returns the number of frames run.
fn run<S: Screen>(
    screen: &mut S,
    cloud: &mut Cloud,
    interval: Duration,
) -> Result<u64, RunError> {
    let (w, h) = screen.size()?;
    cloud.resize(w, h)?;
    let mut frame = Frame::try_new(w, h)?;
    let mut frames: u64 = 0;

    info!(
        width = w,
        height = h,
        active = cloud.active_columns(),
        "rain started"
    );

    loop {
        if !handle_input(screen, cloud)? {
            return Ok(frames);
        }
        handle_resize(screen, cloud, &mut frame)?;

        cloud.rain(&mut frame);
        if frame.has_changes() {
            screen.draw(&mut frame)?;
        }
        frames = frames.saturating_add(1);

        thread::sleep(interval);
    }
}

fn main() -> io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let args = match parse_args(env::args_os()) {
        Ok(a) => a,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let settings = match Settings::from_args(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let log_guard = match logging::init(settings.log_file.as_deref()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to open log file: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        speed = settings.params.speed_mul,
        density = settings.params.density,
        fps = settings.fps,
        bold = settings.bold,
        fade = settings.fade,
        color_mode = ?settings.color_mode,
        glyphs = settings.chars.len(),
        "starting"
    );

    let mt = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut cloud = Cloud::new(settings.params, settings.palette, settings.chars.clone(), mt);
    cloud.bold_heads = settings.bold;
    cloud.fade = settings.fade;

    let mut term = Terminal::new()?;
    let outcome = run(&mut term, &mut cloud, settings.frame_interval());
    drop(term);

    match outcome {
        Ok(frames) => {
            info!(frames, "rain stopped");
            Ok(())
        }
        Err(RunError::Io(e)) => {
            warn!(error = %e, "terminal i/o failed");
            Err(e)
        }
        Err(RunError::OutOfMemory(e)) => {
            warn!(error = %e, "grid allocation failed");
            drop(log_guard);
            eprintln!("out of memory: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::column::RainParams;
    use crate::palette::Palette;

    /// Scripted screen. Each `size` call takes the next entry, repeating
    /// the last one once the script runs out. `None` in `events` ends one
    /// frame's input drain; an exhausted script quits.
    struct ScriptedScreen {
        sizes: VecDeque<(u16, u16)>,
        events: VecDeque<Option<Event>>,
        draws: Vec<(u16, u16, bool)>,
    }

    impl ScriptedScreen {
        fn new(sizes: &[(u16, u16)], events: Vec<Option<Event>>) -> Self {
            Self {
                sizes: sizes.iter().copied().collect(),
                events: events.into(),
                draws: Vec::new(),
            }
        }
    }

    impl Screen for ScriptedScreen {
        fn size(&mut self) -> io::Result<(u16, u16)> {
            match self.sizes.len() {
                0 => Ok((0, 0)),
                1 => Ok(self.sizes[0]),
                _ => Ok(self.sizes.pop_front().unwrap_or((0, 0))),
            }
        }

        fn next_event(&mut self) -> io::Result<Option<Event>> {
            Ok(self.events.pop_front().unwrap_or(Some(key('q'))))
        }

        fn draw(&mut self, frame: &mut Frame) -> io::Result<()> {
            self.draws
                .push((frame.width, frame.height, frame.is_dirty_all()));
            frame.clear_dirty();
            Ok(())
        }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn cloud() -> Cloud {
        let params = RainParams {
            speed_mul: 1.0,
            density: 1.0,
        };
        let palette = Palette {
            trail: None,
            head: None,
        };
        Cloud::new(params, palette, vec!['x'], StdRng::seed_from_u64(7))
    }

    #[test]
    fn resize_rebuilds_the_frame_and_quit_ends_the_loop() {
        let mut screen = ScriptedScreen::new(
            &[(10, 5), (10, 5), (6, 4)],
            vec![None, None, Some(key('q'))],
        );
        let mut cloud = cloud();

        let frames = run(&mut screen, &mut cloud, Duration::ZERO).ok();

        assert_eq!(frames, Some(2));
        assert_eq!((cloud.width, cloud.height), (6, 4));
        assert_eq!(screen.draws, vec![(10, 5, true), (6, 4, true)]);
    }

    #[test]
    fn pause_key_freezes_the_picture() {
        let mut screen = ScriptedScreen::new(
            &[(8, 6)],
            vec![Some(key('p')), None, None, None, Some(key('q'))],
        );
        let mut cloud = cloud();

        let frames = run(&mut screen, &mut cloud, Duration::ZERO).ok();

        assert_eq!(frames, Some(3));
        assert!(cloud.paused);
        // Only the blank first frame is presented; nothing changes after.
        assert_eq!(screen.draws, vec![(8, 6, true)]);
    }

    #[test]
    fn keys_are_drained_until_quit() {
        let mut screen = ScriptedScreen::new(
            &[(4, 4)],
            vec![Some(key('x')), Some(key('p')), Some(key('p')), Some(key('q'))],
        );
        let mut cloud = cloud();

        assert_eq!(run(&mut screen, &mut cloud, Duration::ZERO).ok(), Some(0));
        assert!(!cloud.paused);
        assert!(screen.draws.is_empty());
    }
}
