use std::io::{self, Write};

/// Where `print` output goes.
///
/// The binary writes to stdout; tests and benchmarks capture into a buffer.
#[derive(Debug)]
pub enum PrintSink {
    Stdout,
    Buffer(String),
}

impl PrintSink {
    pub fn buffer() -> Self {
        PrintSink::Buffer(String::new())
    }

    pub fn println(&mut self, line: &str) -> io::Result<()> {
        match self {
            PrintSink::Stdout => writeln!(io::stdout().lock(), "{line}"),
            PrintSink::Buffer(buffer) => {
                buffer.push_str(line);
                buffer.push('\n');
                Ok(())
            }
        }
    }

    /// Drains captured output. Always empty for stdout.
    pub fn take_output(&mut self) -> String {
        match self {
            PrintSink::Stdout => String::new(),
            PrintSink::Buffer(buffer) => std::mem::take(buffer),
        }
    }
}
