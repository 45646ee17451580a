use std::io::{self, BufRead, Write};

/// Line-oriented operator console over any reader/writer pair.
///
/// Production wraps locked stdin/stdout; tests feed a byte slice and collect
/// output into a `Vec<u8>`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads one line with surrounding whitespace removed; `None` on end of input.
    ///
    /// Bytes that are not UTF-8 become U+FFFD, so a garbled line is just
    /// unrecognised input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        match self.input.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(String::from_utf8_lossy(&line).trim().to_string())),
        }
    }

    /// Prints `message` and reads the reply.
    pub fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        self.read_line()
    }

    pub fn say(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", message.as_ref())?;
        self.output.flush()
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
