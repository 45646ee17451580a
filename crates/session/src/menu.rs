//! Startup menu: create a new shader, pick an existing one, or quit.
//!
//! Also reused by the `m` console command while rendering is suspended. The
//! session is checked around every read, so a window closed while the menu is
//! open ends the menu on the next line of input.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::catalog::{is_bare_file_name, CatalogEntry, ShaderCatalog};
use crate::console::Console;
use crate::error::CatalogError;
use crate::state::SessionState;
use crate::templates::{DEFAULT_VERTEX_SHADER, FRAGMENT_TEMPLATE};

/// Result of a menu interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Open(PathBuf),
    Quit,
}

#[derive(Debug, Clone)]
pub struct Menu {
    catalog: ShaderCatalog,
    new_shader_name: String,
}

impl Menu {
    pub fn new(catalog: ShaderCatalog, new_shader_name: impl Into<String>) -> Self {
        Self {
            catalog,
            new_shader_name: new_shader_name.into(),
        }
    }

    /// Loops until the operator picks a shader or quits. End of input, or quit
    /// requested elsewhere, also quits.
    pub fn run<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        session: &SessionState,
    ) -> io::Result<MenuChoice> {
        loop {
            if session.should_quit() {
                return Ok(MenuChoice::Quit);
            }
            console.say("")?;
            console.say("A) Create a new shader")?;
            console.say("B) Load an existing shader")?;
            console.say("C) Quit")?;
            let Some(reply) = ask(console, session, "> ")? else {
                return Ok(MenuChoice::Quit);
            };

            let outcome = match reply.chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('a') => self.create(console, session)?,
                Some('b') => self.pick(console, session)?,
                Some('c') => Some(MenuChoice::Quit),
                _ => {
                    console.say("Please choose A, B or C.")?;
                    None
                }
            };
            if let Some(choice) = outcome {
                return Ok(choice);
            }
        }
    }

    /// `None` means "back to the top menu".
    fn create<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        session: &SessionState,
    ) -> io::Result<Option<MenuChoice>> {
        let prompt = format!("Name for the new shader [{}]: ", self.new_shader_name);
        let name = loop {
            let Some(reply) = ask(console, session, &prompt)? else {
                return Ok(Some(MenuChoice::Quit));
            };
            let name = if reply.is_empty() {
                self.new_shader_name.clone()
            } else {
                reply
            };
            if is_bare_file_name(&name) && name != self.catalog.vertex_file() {
                break name;
            }
            console.say("Use a plain file name inside the shader directory.")?;
        };

        match self.scaffold(&name) {
            Ok(path) => Ok(Some(MenuChoice::Open(path))),
            Err(err) => {
                warn!(error = %err, "could not create shader");
                console.say(format!("Could not create {name}: {err}"))?;
                Ok(None)
            }
        }
    }

    /// Writes the fragment template and the default vertex stage where absent.
    fn scaffold(&self, name: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(self.catalog.directory())?;

        let vertex = self.catalog.vertex_path();
        if !vertex.exists() {
            fs::write(&vertex, DEFAULT_VERTEX_SHADER)?;
            info!(path = %vertex.display(), "wrote default vertex shader");
        }

        let fragment = self.catalog.directory().join(name);
        if fragment.exists() {
            info!(path = %fragment.display(), "opening existing shader");
        } else {
            fs::write(&fragment, FRAGMENT_TEMPLATE)?;
            info!(path = %fragment.display(), "created shader from template");
        }
        Ok(fragment)
    }

    fn pick<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        session: &SessionState,
    ) -> io::Result<Option<MenuChoice>> {
        let entries = match self.catalog.list() {
            Ok(entries) => entries,
            Err(err) => {
                console.say(err.to_string())?;
                return Ok(None);
            }
        };
        if entries.is_empty() {
            console.say(format!(
                "No shaders found in {}.",
                self.catalog.directory().display()
            ))?;
            return Ok(None);
        }

        print_entries(console, &entries)?;
        loop {
            let Some(reply) = ask(console, session, "Shader number (blank to go back): ")? else {
                return Ok(Some(MenuChoice::Quit));
            };
            if reply.is_empty() {
                return Ok(None);
            }
            let Ok(index) = reply.parse::<usize>() else {
                console.say(format!("'{reply}' is not a number."))?;
                continue;
            };
            match ShaderCatalog::resolve(&entries, index) {
                Ok(path) => return Ok(Some(MenuChoice::Open(path))),
                Err(err @ CatalogError::IndexOutOfRange { .. }) => {
                    console.say(err.to_string())?;
                }
                Err(err) => {
                    console.say(err.to_string())?;
                    return Ok(None);
                }
            }
        }
    }
}

/// One prompt and reply; `None` once input has ended or the session is quitting.
fn ask<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &SessionState,
    message: &str,
) -> io::Result<Option<String>> {
    if session.should_quit() {
        return Ok(None);
    }
    let reply = console.prompt(message)?;
    if session.should_quit() {
        return Ok(None);
    }
    Ok(reply)
}

fn print_entries<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    entries: &[CatalogEntry],
) -> io::Result<()> {
    for entry in entries {
        console.say(format!("{}. {}", entry.index, entry.display_name()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn menu(dir: &Path) -> Menu {
        Menu::new(ShaderCatalog::new(dir, "vertex.vs"), "fragment.frag")
    }

    fn run(menu: &Menu, input: &str) -> (MenuChoice, String) {
        let mut console = Console::new(input.as_bytes(), Vec::new());
        let choice = menu.run(&mut console, &SessionState::new()).unwrap();
        let output = String::from_utf8(console.into_output()).unwrap();
        (choice, output)
    }

    fn shader_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vertex.vs"), DEFAULT_VERTEX_SHADER).unwrap();
        fs::write(dir.path().join("b.frag"), FRAGMENT_TEMPLATE).unwrap();
        fs::write(dir.path().join("a.frag"), FRAGMENT_TEMPLATE).unwrap();
        dir
    }

    #[test]
    fn lists_entries_and_opens_selection() {
        let dir = shader_dir();
        let (choice, output) = run(&menu(dir.path()), "b\n1\n");

        assert!(output.contains("0. a.frag"));
        assert!(output.contains("1. b.frag"));
        assert!(!output.contains("vertex.vs"));
        assert_eq!(choice, MenuChoice::Open(dir.path().join("b.frag")));
    }

    #[test]
    fn reprompts_on_bad_index() {
        let dir = shader_dir();
        let (choice, output) = run(&menu(dir.path()), "B\nseven\n7\n0\n");

        assert!(output.contains("'seven' is not a number."));
        assert!(output.contains("out of range"));
        assert_eq!(choice, MenuChoice::Open(dir.path().join("a.frag")));
    }

    #[test]
    fn eof_quits() {
        let dir = shader_dir();
        assert_eq!(run(&menu(dir.path()), "").0, MenuChoice::Quit);
        assert_eq!(run(&menu(dir.path()), "b\n").0, MenuChoice::Quit);
        assert_eq!(run(&menu(dir.path()), "c\n").0, MenuChoice::Quit);
    }

    #[test]
    fn create_writes_template_and_vertex_stage() {
        let dir = TempDir::new().unwrap();
        let shaders = dir.path().join("Shaders");
        let (choice, _) = run(&menu(&shaders), "a\n\n");

        let created = shaders.join("fragment.frag");
        assert_eq!(choice, MenuChoice::Open(created.clone()));
        assert_eq!(fs::read_to_string(created).unwrap(), FRAGMENT_TEMPLATE);
        assert_eq!(
            fs::read_to_string(shaders.join("vertex.vs")).unwrap(),
            DEFAULT_VERTEX_SHADER
        );
    }

    #[test]
    fn create_keeps_existing_file_contents() {
        let dir = shader_dir();
        fs::write(dir.path().join("mine.frag"), "keep me").unwrap();

        let (choice, _) = run(&menu(dir.path()), "a\nmine.frag\n");

        assert_eq!(choice, MenuChoice::Open(dir.path().join("mine.frag")));
        assert_eq!(
            fs::read_to_string(dir.path().join("mine.frag")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn create_rejects_paths() {
        let dir = shader_dir();
        let (choice, output) = run(&menu(dir.path()), "a\n../escape.frag\nok.frag\n");

        assert!(output.contains("plain file name"));
        assert_eq!(choice, MenuChoice::Open(dir.path().join("ok.frag")));
        assert!(!dir.path().parent().unwrap().join("escape.frag").exists());
    }

    #[test]
    fn quit_requested_elsewhere_ends_menu_without_reading() {
        let dir = shader_dir();
        let session = SessionState::new();
        session.request_quit();
        let mut console = Console::new(&b"b\n0\n"[..], Vec::new());

        let choice = menu(dir.path()).run(&mut console, &session).unwrap();

        assert_eq!(choice, MenuChoice::Quit);
        assert!(console.into_output().is_empty());
    }

    #[test]
    fn empty_directory_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let (choice, output) = run(&menu(dir.path()), "b\nc\n");

        assert!(output.contains("No shaders found"));
        assert_eq!(choice, MenuChoice::Quit);
    }
}
