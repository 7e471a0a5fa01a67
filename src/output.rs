use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ConversionOutput, ProgressEvent, ProgressSink, StatusResult};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_conversion(result: &ConversionOutput) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_status(result: &StatusResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the log so stdout stays pure JSON.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        tracing::info!("{}", event.message);
    }
}
