use reify_js::transform_source;
use reify_js::Options;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedWriter {
  buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
  fn contents(&self) -> String {
    String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
  }
}

struct SharedWriterGuard<'a> {
  buffer: &'a Arc<Mutex<Vec<u8>>>,
}

impl<'a> io::Write for SharedWriterGuard<'a> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buffer.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> MakeWriter<'a> for SharedWriter {
  type Writer = SharedWriterGuard<'a>;

  fn make_writer(&'a self) -> Self::Writer {
    SharedWriterGuard {
      buffer: &self.buffer,
    }
  }
}

#[test]
fn passes_and_rules_are_traced() {
  let writer = SharedWriter::default();
  let subscriber = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(tracing::Level::TRACE)
    .with_ansi(false)
    .with_writer(writer.clone())
    .finish();
  let guard = tracing::subscriber::set_default(subscriber);

  transform_source("let x: number = 1;\nx = 2;", &Options::default()).unwrap();

  drop(guard);
  let output = writer.contents();
  assert!(
    output.contains("reify.resolve") && output.contains("reify.transform"),
    "expected pass spans, got: {output}"
  );
  assert!(
    output.contains("rule=\"declarator\"") && output.contains("rule=\"assign\""),
    "expected rule events, got: {output}"
  );
}
