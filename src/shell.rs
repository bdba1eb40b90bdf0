use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::protocol::{Command, Reply};
use crate::store::Registry;

/// Runs protocol commands against a shared registry
pub struct Shell {
    registry: Arc<Registry>,
}

impl Shell {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Process one input line.
    ///
    /// Returns `None` for lines that carry no command. A line that fails to
    /// parse yields an error reply rather than stopping the shell.
    pub fn process_line(&self, line: &str) -> Option<Reply> {
        match Command::parse(line) {
            Ok(Some(cmd)) => {
                debug!("Received command: {:?}", cmd);
                Some(cmd.execute(&self.registry))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Rejected line {:?}: {}", line, e);
                Some(Reply::error(e.to_string()))
            }
        }
    }

    /// Read commands from `input` until it is exhausted, writing one reply
    /// line per command to `output`. Returns the number of commands handled.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<usize> {
        info!("Shell started");
        let mut handled = 0;

        for line in input.lines() {
            let line = line?;
            if let Some(reply) = self.process_line(&line) {
                writeln!(output, "{}", reply)?;
                output.flush()?;
                handled += 1;
            }
        }

        info!("Input closed after {} commands", handled);
        Ok(handled)
    }
}
