//! In-memory output sink for tests

use std::io::Write;
use std::sync::{Arc, Mutex};

use super::{Formatter, OutputConfig};

/// Clonable writer whose contents can be read back
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Formatter whose stdout and stderr are captured
pub fn captured(config: OutputConfig) -> (Formatter, Captured, Captured) {
    let out = Captured::default();
    let err = Captured::default();
    let formatter = Formatter::with_writers(config, Box::new(out.clone()), Box::new(err.clone()));
    (formatter, out, err)
}

/// Plain-text (no color, no progress) captured formatter
pub fn plain() -> (Formatter, Captured, Captured) {
    captured(OutputConfig {
        no_color: true,
        no_progress: true,
        ..Default::default()
    })
}
