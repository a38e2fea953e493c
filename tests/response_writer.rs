//! Response-writer catalog: one base capability and four optional ones,
//! wrapped in every combination.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tola_snoop::{intercept, CapSet};

intercept! {
    /// Capabilities of an HTTP response writer.
    pub mod http {
        base ResponseWriter {
            fn header(&self) -> Vec<(String, String)>;
            fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
            fn write_header(&mut self, code: u16);
        }
        optional Flusher {
            fn flush(&mut self);
        }
        optional CloseNotifier {
            fn close_notify(&self) -> bool;
        }
        optional Hijacker {
            fn hijack(&mut self) -> io::Result<String>;
        }
        optional ReaderFrom {
            fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64>;
        }
    }
}

use http::{CloseNotifier, Flusher, Hijacker, OptionalCapability, ReaderFrom, ResponseWriter};

/// A writer that reports whichever optional capabilities `caps` holds.
#[derive(Default)]
struct Conn {
    caps: CapSet,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    status: Option<u16>,
    flushes: usize,
    hijacked: bool,
}

impl Conn {
    fn reporting(caps: CapSet) -> Self {
        Conn {
            caps,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            ..Conn::default()
        }
    }

    fn full() -> Self {
        Conn::reporting(OptionalCapability::ALL.iter().map(|cap| cap.index()).collect())
    }

    fn has(&self, cap: OptionalCapability) -> bool {
        self.caps.contains(cap.index())
    }
}

impl ResponseWriter for Conn {
    fn header(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_header(&mut self, code: u16) {
        self.status = Some(code);
    }

    fn as_flusher(&self) -> Option<&dyn Flusher> {
        if self.has(OptionalCapability::Flusher) { Some(self) } else { None }
    }

    fn as_flusher_mut(&mut self) -> Option<&mut dyn Flusher> {
        if self.has(OptionalCapability::Flusher) { Some(self) } else { None }
    }

    fn as_close_notifier(&self) -> Option<&dyn CloseNotifier> {
        if self.has(OptionalCapability::CloseNotifier) { Some(self) } else { None }
    }

    fn as_close_notifier_mut(&mut self) -> Option<&mut dyn CloseNotifier> {
        if self.has(OptionalCapability::CloseNotifier) { Some(self) } else { None }
    }

    fn as_hijacker(&self) -> Option<&dyn Hijacker> {
        if self.has(OptionalCapability::Hijacker) { Some(self) } else { None }
    }

    fn as_hijacker_mut(&mut self) -> Option<&mut dyn Hijacker> {
        if self.has(OptionalCapability::Hijacker) { Some(self) } else { None }
    }

    fn as_reader_from(&self) -> Option<&dyn ReaderFrom> {
        if self.has(OptionalCapability::ReaderFrom) { Some(self) } else { None }
    }

    fn as_reader_from_mut(&mut self) -> Option<&mut dyn ReaderFrom> {
        if self.has(OptionalCapability::ReaderFrom) { Some(self) } else { None }
    }
}

impl Flusher for Conn {
    fn flush(&mut self) {
        self.flushes += 1;
    }
}

impl CloseNotifier for Conn {
    fn close_notify(&self) -> bool {
        self.status.is_some()
    }
}

impl Hijacker for Conn {
    fn hijack(&mut self) -> io::Result<String> {
        self.hijacked = true;
        Ok("tcp:4242".to_string())
    }
}

impl ReaderFrom for Conn {
    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        let mut buf = Vec::new();
        let n = src.read_to_end(&mut buf)?;
        self.body.extend_from_slice(&buf);
        Ok(n as u64)
    }
}

/// Hooks on every operation, each calling straight through.
fn every_hook(calls: &Arc<AtomicUsize>) -> http::Hooks {
    let (a, b, c, d, e, f, g) = (
        calls.clone(),
        calls.clone(),
        calls.clone(),
        calls.clone(),
        calls.clone(),
        calls.clone(),
        calls.clone(),
    );
    http::Hooks::new()
        .on_header(move |mut next| {
            let calls = a.clone();
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                next()
            })
        })
        .on_write(move |mut next| {
            let calls = b.clone();
            Box::new(move |buf: &[u8]| {
                calls.fetch_add(1, Ordering::SeqCst);
                next(buf)
            })
        })
        .on_write_header(move |mut next| {
            let calls = c.clone();
            Box::new(move |code: u16| {
                calls.fetch_add(1, Ordering::SeqCst);
                next(code)
            })
        })
        .on_flush(move |mut next| {
            let calls = d.clone();
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                next()
            })
        })
        .on_close_notify(move |mut next| {
            let calls = e.clone();
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                next()
            })
        })
        .on_hijack(move |mut next| {
            let calls = f.clone();
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                next()
            })
        })
        .on_read_from(move |mut next| {
            let calls = g.clone();
            Box::new(move |src: &mut dyn Read| {
                calls.fetch_add(1, Ordering::SeqCst);
                next(src)
            })
        })
}

// =============================================================================
// Capability preservation
// =============================================================================

#[test]
fn detect_reports_the_queries() {
    for combo in http::CATALOG.combinations().unwrap() {
        let conn = Conn::reporting(combo.set);
        assert_eq!(http::detect(&conn), combo.set);
    }
}

#[test]
fn detect_is_idempotent() {
    let set = CapSet::from(OptionalCapability::CloseNotifier).with(OptionalCapability::ReaderFrom.index());
    let wrapped = http::wrap(Conn::reporting(set), http::Hooks::new());
    let first = http::detect(&wrapped);
    assert_eq!(http::detect(&wrapped), first);
    assert_eq!(http::detect(wrapped.get_ref()), first);
    // A wrapper's wrapper selects the same shape.
    let again = http::wrap(wrapped, http::Hooks::new());
    assert_eq!(again.shape().name, "Shape0101");
}

#[test]
fn wrapper_exposes_exactly_the_detected_capabilities() {
    for combo in http::CATALOG.combinations().unwrap() {
        let wrapped = http::wrap(Conn::reporting(combo.set), http::Hooks::new());

        assert_eq!(wrapped.capabilities(), combo.set);
        assert_eq!(wrapped.shape(), &http::SHAPES[combo.index]);
        assert_eq!(http::detect(&wrapped), combo.set);
        for cap in OptionalCapability::ALL {
            assert_eq!(wrapped.exposes(cap), combo.set.contains(cap.index()), "{cap:?}");
        }
    }
}

#[test]
fn hooks_never_change_the_surface() {
    let calls = Arc::new(AtomicUsize::new(0));
    for combo in http::CATALOG.combinations().unwrap() {
        let wrapped = http::wrap(Conn::reporting(combo.set), every_hook(&calls));
        assert_eq!(http::detect(&wrapped), combo.set);
    }
    // Detection runs capability queries only, never operations.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn shape_names_follow_catalog_order() {
    let flusher = http::wrap(
        Conn::reporting(OptionalCapability::Flusher.into()),
        http::Hooks::new(),
    );
    assert_eq!(flusher.shape().name, "Shape1000");
    assert!(matches!(flusher, http::Wrapped::Shape1000(_)));

    let reader = http::wrap(
        Conn::reporting(OptionalCapability::ReaderFrom.into()),
        http::Hooks::new(),
    );
    assert_eq!(reader.shape().name, "Shape0001");

    let none = http::wrap(Conn::reporting(CapSet::EMPTY), http::Hooks::new());
    assert!(matches!(none, http::Wrapped::Shape0000(_)));

    let all = http::wrap(Conn::full(), http::Hooks::new());
    assert!(matches!(all, http::Wrapped::Shape1111(_)));
}

#[test]
fn shape_variant_implements_its_traits() {
    let set = http::CATALOG
        .set_of(&["Flusher", "Hijacker"])
        .expect("known capabilities");
    let mut wrapped = http::wrap(Conn::reporting(set), http::Hooks::new());
    let name = wrapped.shape().name;

    match &mut wrapped {
        http::Wrapped::Shape1010(shape) => {
            Flusher::flush(shape);
            assert_eq!(Hijacker::hijack(shape).unwrap(), "tcp:4242");
        }
        _ => panic!("expected Shape1010, got {name}"),
    }

    let conn = wrapped.into_inner();
    assert_eq!(conn.flushes, 1);
    assert!(conn.hijacked);
}

// =============================================================================
// Pass-through
// =============================================================================

#[test]
fn no_hooks_passes_everything_through() {
    let mut wrapped = http::wrap(Conn::full(), http::Hooks::new());

    assert_eq!(wrapped.header(), Conn::full().header());
    wrapped.write_header(201);
    assert_eq!(wrapped.write(b"hello").unwrap(), 5);
    wrapped.as_flusher_mut().unwrap().flush();
    assert!(wrapped.as_close_notifier().unwrap().close_notify());
    assert_eq!(wrapped.as_hijacker_mut().unwrap().hijack().unwrap(), "tcp:4242");
    let mut src: &[u8] = b" world";
    assert_eq!(wrapped.as_reader_from_mut().unwrap().read_from(&mut src).unwrap(), 6);

    let conn = wrapped.into_inner();
    assert_eq!(conn.status, Some(201));
    assert_eq!(conn.body, b"hello world");
    assert_eq!(conn.flushes, 1);
    assert!(conn.hijacked);
}

#[test]
fn identity_hooks_behave_like_no_hooks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut hooked = http::wrap(Conn::full(), every_hook(&calls));
    let mut plain = http::wrap(Conn::full(), http::Hooks::new());

    for wrapped in [&mut hooked, &mut plain] {
        wrapped.write_header(404);
        wrapped.write(b"missing").unwrap();
        wrapped.as_flusher_mut().unwrap().flush();
        let mut src: &[u8] = b"!";
        wrapped.as_reader_from_mut().unwrap().read_from(&mut src).unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    let (hooked, plain) = (hooked.into_inner(), plain.into_inner());
    assert_eq!(hooked.status, plain.status);
    assert_eq!(hooked.body, plain.body);
    assert_eq!(hooked.flushes, plain.flushes);
}

#[test]
fn inner_object_bypasses_hooks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut wrapped = http::wrap(Conn::full(), every_hook(&calls));

    wrapped.get_mut().write(b"direct").unwrap();
    assert_eq!(wrapped.get_ref().body, b"direct");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(wrapped.hooks().installed().count(), 7);
}

// =============================================================================
// Hook behavior
// =============================================================================

#[test]
fn hook_rewrites_arguments() {
    let hooks = http::Hooks::new().on_write(|mut next| {
        Box::new(move |buf: &[u8]| next(&buf.to_ascii_uppercase()[..]))
    });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    wrapped.write(b"shout").unwrap();
    assert_eq!(wrapped.into_inner().body, b"SHOUT");
}

#[test]
fn hook_rewrites_results() {
    let hooks = http::Hooks::new().on_header(|mut next| {
        Box::new(move || {
            let mut headers = next();
            headers.push(("x-snoop".to_string(), "1".to_string()));
            headers
        })
    });
    let wrapped = http::wrap(Conn::full(), hooks);

    let headers = wrapped.header();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[1], ("x-snoop".to_string(), "1".to_string()));
    // The object itself is untouched.
    assert_eq!(wrapped.get_ref().headers.len(), 1);
}

#[test]
fn hook_may_skip_the_original() {
    let hooks = http::Hooks::new()
        .on_write_header(|_next| Box::new(|_code: u16| {}))
        .on_hijack(|_next| {
            Box::new(|| -> io::Result<String> {
                Err(io::Error::new(io::ErrorKind::Unsupported, "hijack refused"))
            })
        });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    wrapped.write_header(500);
    let err = wrapped.as_hijacker_mut().unwrap().hijack().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);

    let conn = wrapped.into_inner();
    assert_eq!(conn.status, None);
    assert!(!conn.hijacked);
}

#[test]
fn hook_may_call_the_original_repeatedly() {
    let hooks = http::Hooks::new().on_flush(|mut next| {
        Box::new(move || {
            next();
            next();
        })
    });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    wrapped.as_flusher_mut().unwrap().flush();
    assert_eq!(wrapped.into_inner().flushes, 2);
}

#[test]
fn hook_observes_fallible_operations() {
    let read = Arc::new(AtomicUsize::new(0));
    let total = read.clone();
    let hooks = http::Hooks::new().on_read_from(move |mut next| {
        let total = total.clone();
        Box::new(move |src: &mut dyn Read| -> io::Result<u64> {
            let n = next(src)?;
            total.fetch_add(n as usize, Ordering::SeqCst);
            Ok(n)
        })
    });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    let mut src: &[u8] = b"0123456789";
    let reader = wrapped.as_reader_from_mut().unwrap();
    assert_eq!(reader.read_from(&mut src).unwrap(), 10);
    assert_eq!(read.load(Ordering::SeqCst), 10);
}

#[test]
fn hook_only_touches_its_operation() {
    let hooks = http::Hooks::new().on_write_header(|mut next| {
        Box::new(move |code: u16| next(code + 1))
    });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    wrapped.write_header(200);
    wrapped.write(b"ok").unwrap();
    wrapped.as_flusher_mut().unwrap().flush();

    let conn = wrapped.into_inner();
    assert_eq!(conn.status, Some(201));
    assert_eq!(conn.body, b"ok");
    assert_eq!(conn.flushes, 1);
}

#[test]
fn hooks_for_missing_capabilities_are_ignored() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut wrapped = http::wrap(Conn::reporting(CapSet::EMPTY), every_hook(&calls));

    assert!(wrapped.as_flusher().is_none());
    assert!(wrapped.as_flusher_mut().is_none());
    assert!(wrapped.as_hijacker_mut().is_none());

    wrapped.write(b"x").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn hooks_run_once_per_call() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let hooks = http::Hooks::new().on_write(move |mut next| {
        let sink = sink.clone();
        sink.lock().unwrap().push("hook");
        Box::new(move |buf: &[u8]| {
            sink.lock().unwrap().push("call");
            next(buf)
        })
    });
    let mut wrapped = http::wrap(Conn::full(), hooks);

    wrapped.write(b"a").unwrap();
    wrapped.write(b"b").unwrap();
    assert_eq!(*log.lock().unwrap(), ["hook", "call", "hook", "call"]);
}

// =============================================================================
// Composition
// =============================================================================

#[test]
fn wrappers_nest_outermost_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tagged = |tag: &'static str| {
        let log = log.clone();
        http::Hooks::new().on_write(move |mut next| {
            let log = log.clone();
            Box::new(move |buf: &[u8]| {
                log.lock().unwrap().push(tag);
                next(buf)
            })
        })
    };

    let set: CapSet = [OptionalCapability::CloseNotifier, OptionalCapability::ReaderFrom]
        .into_iter()
        .map(OptionalCapability::index)
        .collect();
    let inner = http::wrap(Conn::reporting(set), tagged("inner"));
    let mut outer = http::wrap(inner, tagged("outer"));

    assert_eq!(outer.capabilities(), set);
    outer.write(b"x").unwrap();
    assert_eq!(*log.lock().unwrap(), ["outer", "inner"]);
    assert_eq!(outer.into_inner().into_inner().body, b"x");
}

#[test]
fn boxed_objects_keep_their_capabilities() {
    let set = CapSet::from(OptionalCapability::Hijacker);
    let boxed: Box<dyn ResponseWriter> = Box::new(Conn::reporting(set));
    let mut wrapped = http::wrap(boxed, http::Hooks::new());

    assert_eq!(wrapped.capabilities(), set);
    assert_eq!(wrapped.as_hijacker_mut().unwrap().hijack().unwrap(), "tcp:4242");
}

#[test]
fn borrowed_objects_keep_their_capabilities() {
    let mut conn = Conn::full();
    {
        let hooks = http::Hooks::new().on_write(|mut next| {
            Box::new(move |buf: &[u8]| next(&buf[1..]))
        });
        let mut wrapped = http::wrap(&mut conn, hooks);
        assert_eq!(wrapped.capabilities(), http::detect(&Conn::full()));
        wrapped.write(b">body").unwrap();
    }
    assert_eq!(conn.body, b"body");
}

#[test]
fn hooks_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<http::Hooks>();
    assert_send_sync::<http::Wrapped<Conn>>();

    let calls = Arc::new(AtomicUsize::new(0));
    let hooks = every_hook(&calls);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let hooks = hooks.clone();
            std::thread::spawn(move || {
                let mut wrapped = http::wrap(Conn::full(), hooks);
                wrapped.write(b"t").unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

// =============================================================================
// Contract violations
// =============================================================================

/// Reports `Flusher` until told otherwise.
struct Fickle {
    flushable: bool,
}

impl ResponseWriter for Fickle {
    fn header(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn write_header(&mut self, _code: u16) {}

    fn as_flusher(&self) -> Option<&dyn Flusher> {
        if self.flushable { Some(self) } else { None }
    }

    fn as_flusher_mut(&mut self) -> Option<&mut dyn Flusher> {
        if self.flushable { Some(self) } else { None }
    }
}

impl Flusher for Fickle {
    fn flush(&mut self) {}
}

#[test]
#[should_panic(expected = "no longer provides `Flusher`")]
fn vanished_capability_panics() {
    let mut wrapped = http::wrap(Fickle { flushable: true }, http::Hooks::new());
    assert!(wrapped.exposes(OptionalCapability::Flusher));

    wrapped.get_mut().flushable = false;
    // The shape still exposes Flusher; the object no longer does.
    if let http::Wrapped::Shape1000(shape) = &mut wrapped {
        Flusher::flush(shape);
    }
}
