//! Routes `tracing` output to the browser console.

use std::cell::RefCell;
use std::io;

use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Buffers one formatted record and hands it to `console.*` on drop, so each
/// event becomes a single console entry.
pub struct ConsoleWriter {
    level: tracing::Level,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = wasm_bindgen::JsValue::from_str(text.trim_end());
        match self.level {
            tracing::Level::ERROR => web_sys::console::error_1(&line),
            tracing::Level::WARN => web_sys::console::warn_1(&line),
            tracing::Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: tracing::Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

thread_local! {
    static FILTER: RefCell<Option<reload::Handle<EnvFilter, Registry>>> = const { RefCell::new(None) };
}

fn parse(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        tracing::warn!(directives, %err, "bad log filter, using info");
        EnvFilter::new("info")
    })
}

/// Install the console subscriber. `directives` uses `EnvFilter` syntax,
/// e.g. `"scrolly_core=debug"`. Calling it twice keeps the first subscriber.
pub fn init(directives: &str) {
    let (filter, handle) = reload::Layer::new(parse(directives));
    let output = fmt::layer()
        .with_writer(Console)
        .with_ansi(false)
        .without_time();
    if tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .is_ok()
    {
        FILTER.with(|slot| *slot.borrow_mut() = Some(handle));
    }
}

/// Swap the active filter of the subscriber installed by [`init`].
pub fn set_filter(directives: &str) {
    FILTER.with(|slot| {
        if let Some(handle) = slot.borrow().as_ref()
            && let Err(err) = handle.reload(parse(directives))
        {
            tracing::warn!(%err, "log filter not reloaded");
        }
    });
}
