//! Output handling for the `print`/`println` built-ins.

use std::io::{self, Write as _};

use crate::errors::RunResult;

/// Trait for handling output from the `print` and `println` built-ins.
///
/// Implement this to capture or redirect output from interpreted code. The
/// default implementation [`StdPrint`] writes to stdout.
pub trait PrintWriter {
    /// Called once per formatted argument. Writes only the argument's text;
    /// terminators go through [`Self::stdout_push`].
    fn stdout_write(&mut self, output: &str) -> RunResult<()>;

    /// Appends a single character, typically the `println` newline.
    fn stdout_push(&mut self, end: char) -> RunResult<()>;
}

/// Default `PrintWriter` that writes straight to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) -> RunResult<()> {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> RunResult<()> {
        let mut stdout = io::stdout().lock();
        let mut buf = [0u8; 4];
        let _ = stdout.write_all(end.encode_utf8(&mut buf).as_bytes());
        let _ = stdout.flush();
        Ok(())
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// The collected output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: &str) -> RunResult<()> {
        self.0.push_str(output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> RunResult<()> {
        self.0.push(end);
        Ok(())
    }
}

/// `PrintWriter` that discards all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) -> RunResult<()> {
        Ok(())
    }

    fn stdout_push(&mut self, _end: char) -> RunResult<()> {
        Ok(())
    }
}
