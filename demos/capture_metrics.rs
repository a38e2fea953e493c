//! Capture status code, bytes written and duration of a response.
//!
//! ```text
//! RUST_LOG=tola_snoop=debug cargo run --example capture_metrics
//! ```

use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tola_snoop::intercept;

intercept! {
    pub mod http {
        base ResponseWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
            fn write_header(&mut self, code: u16);
        }
        optional Flusher {
            fn flush(&mut self);
        }
        optional ReaderFrom {
            fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64>;
        }
    }
}

use http::{Flusher, ReaderFrom, ResponseWriter};

/// What happened to a response.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    /// First status code written, or 200 if the handler only wrote a body.
    pub code: u16,
    pub written: u64,
    pub duration: Duration,
}

#[derive(Default)]
struct Recorder {
    code: Option<u16>,
    written: u64,
}

impl Recorder {
    /// A body write commits the implicit 200.
    fn body(&mut self, n: u64) {
        self.code.get_or_insert(200);
        self.written += n;
    }
}

/// Run `handler` against `w`, observing it through hooks.
pub fn capture_metrics<W, F>(w: W, handler: F) -> Metrics
where
    W: ResponseWriter,
    F: FnOnce(&mut http::Wrapped<W>),
{
    let state = Arc::new(Mutex::new(Recorder::default()));
    let (on_header, on_write, on_read) = (state.clone(), state.clone(), state.clone());

    let hooks = http::Hooks::new()
        .on_write_header(move |mut next| {
            let state = on_header.clone();
            Box::new(move |code: u16| {
                if let Ok(mut rec) = state.lock() {
                    rec.code.get_or_insert(code);
                }
                next(code)
            })
        })
        .on_write(move |mut next| {
            let state = on_write.clone();
            Box::new(move |buf: &[u8]| -> io::Result<usize> {
                let n = next(buf)?;
                if let Ok(mut rec) = state.lock() {
                    rec.body(n as u64);
                }
                Ok(n)
            })
        })
        .on_read_from(move |mut next| {
            let state = on_read.clone();
            Box::new(move |src: &mut dyn Read| -> io::Result<u64> {
                let n = next(src)?;
                if let Ok(mut rec) = state.lock() {
                    rec.body(n);
                }
                Ok(n)
            })
        });

    let start = Instant::now();
    let mut wrapped = http::wrap(w, hooks);
    handler(&mut wrapped);
    let duration = start.elapsed();

    let rec = state.lock().map(|rec| (rec.code, rec.written)).unwrap_or_default();
    Metrics {
        code: rec.0.unwrap_or(200),
        written: rec.1,
        duration,
    }
}

/// In-memory response that can flush and stream from a reader.
#[derive(Default)]
struct Buffer {
    code: Option<u16>,
    body: Vec<u8>,
}

impl ResponseWriter for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_header(&mut self, code: u16) {
        self.code.get_or_insert(code);
    }

    fn as_flusher(&self) -> Option<&dyn Flusher> {
        Some(self)
    }

    fn as_flusher_mut(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }

    fn as_reader_from(&self) -> Option<&dyn ReaderFrom> {
        Some(self)
    }

    fn as_reader_from_mut(&mut self) -> Option<&mut dyn ReaderFrom> {
        Some(self)
    }
}

impl Flusher for Buffer {
    fn flush(&mut self) {}
}

impl ReaderFrom for Buffer {
    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        let n = src.read_to_end(&mut self.body)?;
        Ok(n as u64)
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tola_snoop=debug".into()),
        )
        .init();

    let mut failure = None;
    let metrics = capture_metrics(Buffer::default(), |w| {
        w.write_header(201);
        let streamed = match w.as_reader_from_mut() {
            Some(reader) => reader.read_from(&mut &b"streamed body, "[..]),
            None => Ok(0),
        };
        let written = streamed.and_then(|_| w.write(b"then a plain write"));
        if let Some(flusher) = w.as_flusher_mut() {
            flusher.flush();
        }
        failure = written.err();
    });
    if let Some(err) = failure {
        return Err(err);
    }

    tracing::info!(
        code = metrics.code,
        written = metrics.written,
        duration = ?metrics.duration,
        "response complete"
    );
    Ok(())
}
