//! JSON output for CLI commands

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a value to stdout as pretty JSON followed by a newline
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
