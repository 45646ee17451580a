//! Operator command loop that runs beside the render thread.
//!
//! The loop blocks on console input. When the render side ends the session
//! (window closed, Escape, fatal frame error) a pending read is not
//! interrupted; the loop notices the quit flag as soon as the read returns,
//! which is why the binary asks the operator to press Enter.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::console::Console;
use crate::menu::{Menu, MenuChoice};
use crate::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Menu,
    Reload,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parses the first token, case-insensitively. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let token = line.split_whitespace().next()?.to_ascii_lowercase();
        let command = match token.as_str() {
            "p" | "pause" | "resume" => Command::TogglePause,
            "m" | "menu" => Command::Menu,
            "r" | "reload" => Command::Reload,
            "s" | "status" => Command::Status,
            "h" | "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

const CONTROLS: &str = "\
Controls:
  p  pause / resume rendering
  m  back to the shader menu
  r  recompile the current shader
  s  show session status
  h  show this help
  q  quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct CommandLoop<R, W> {
    console: Console<R, W>,
    session: Arc<SessionState>,
    menu: Menu,
}

impl<R: BufRead, W: Write> CommandLoop<R, W> {
    pub fn new(console: Console<R, W>, session: Arc<SessionState>, menu: Menu) -> Self {
        Self {
            console,
            session,
            menu,
        }
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Reads commands until quit is requested from either side or input ends.
    ///
    /// A console I/O failure also requests quit before it is returned, so the
    /// render side never outlives its controller.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.read_commands();
        if let Err(err) = &result {
            error!(error = %err, "console failed; ending session");
            self.session.request_quit();
        }
        result
    }

    fn read_commands(&mut self) -> io::Result<()> {
        self.console.say(CONTROLS)?;
        loop {
            if self.session.should_quit() {
                break;
            }
            let Some(line) = self.console.read_line()? else {
                debug!("console input closed");
                self.session.request_quit();
                break;
            };
            if self.session.should_quit() {
                break;
            }
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            if self.apply(command)? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::TogglePause => {
                let running = self.session.toggle_running();
                info!(running, "rendering toggled");
                self.console
                    .say(if running { "Resumed." } else { "Paused." })?;
            }
            Command::Menu => return self.menu(),
            Command::Reload => match self.session.request_reload() {
                Some(generation) => {
                    debug!(generation, "reload requested");
                    self.console.say("Reloading.")?;
                }
                None => self.console.say("Nothing loaded yet.")?,
            },
            Command::Status => self.status()?,
            Command::Help => self.console.say(CONTROLS)?,
            Command::Quit => {
                info!("quit requested from console");
                self.session.request_quit();
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Suspends rendering while the menu is shown, then resumes with the pick.
    fn menu(&mut self) -> io::Result<Flow> {
        self.session.set_running(false);
        let choice = self.menu.run(&mut self.console, &self.session)?;
        if self.session.should_quit() {
            return Ok(Flow::Exit);
        }
        match choice {
            MenuChoice::Open(path) => {
                self.session.request_load(path);
                self.session.set_running(true);
                self.console.say(CONTROLS)?;
                Ok(Flow::Continue)
            }
            MenuChoice::Quit => {
                self.session.request_quit();
                Ok(Flow::Exit)
            }
        }
    }

    fn status(&mut self) -> io::Result<()> {
        let snapshot = self.session.snapshot();
        let active = snapshot
            .active_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".to_string());
        self.console.say(format!("Active shader: {active}"))?;
        self.console.say(format!(
            "Rendering: {}",
            if snapshot.running { "running" } else { "paused" }
        ))?;
        if snapshot.requested_generation != snapshot.active_generation {
            if let Some(path) = &snapshot.requested_path {
                self.console
                    .say(format!("Pending load: {}", path.display()))?;
            }
        }
        if let Some(last) = &snapshot.last_load {
            match &last.result {
                Ok(()) => self
                    .console
                    .say(format!("Last load: {} ok", last.path.display()))?,
                Err(err) => self.console.say(format!(
                    "Last load: {} failed, {err}",
                    last.path.display()
                ))?,
            }
        }
        Ok(())
    }
}
