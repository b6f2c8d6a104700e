use clap::Parser;
use reify_js::error::ReifyError;
use reify_js::transform_bytes;
use reify_js::Options;
use std::fs;
use std::fs::File;
use std::io::stdin;
use std::io::stdout;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(
  name = "reify-js",
  about = "Turns Flow type annotations into flow-runtime checks"
)]
struct Cli {
  /// File to rewrite; omit for stdin.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Output destination; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// JSON file with options (`libraryId`, `libraryModule`, `assertCasts`). Flags override it.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Local name the runtime library is imported as.
  #[arg(long)]
  library_id: Option<String>,

  /// Module specifier the runtime library is imported from.
  #[arg(long)]
  library_module: Option<String>,

  /// Erase `(expr: T)` casts instead of turning them into assertions.
  #[arg(long)]
  no_assert_casts: bool,

  /// Emit JSON tracing of each pass to stderr.
  #[arg(long)]
  trace: bool,
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::TRACE)
    .json()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn exit_with_error(message: impl AsRef<str>) -> ! {
  eprintln!("error: {}", message.as_ref());
  process::exit(1);
}

fn load_options(args: &Cli) -> Options {
  let mut options = match args.config.as_ref() {
    Some(path) => {
      let json = fs::read_to_string(path).unwrap_or_else(|err| {
        exit_with_error(format!("failed to read {}: {err}", path.display()))
      });
      Options::from_json(&json).unwrap_or_else(|err| {
        exit_with_error(format!("invalid config {}: {err}", path.display()))
      })
    }
    None => Options::default(),
  };
  if let Some(library_id) = &args.library_id {
    options = options.with_library_id(library_id.clone());
  };
  if let Some(library_module) = &args.library_module {
    options = options.with_library_module(library_module.clone());
  };
  if args.no_assert_casts {
    options = options.with_assert_casts(false);
  };
  options
}

fn report(input_name: &str, source: &[u8], err: &ReifyError) -> ! {
  let text = String::from_utf8_lossy(source);
  let (line, col) = err.loc().line_col(&text);
  eprintln!("{input_name}:{line}:{col}: {err}");
  process::exit(1);
}

fn main() {
  let args = Cli::parse();
  init_tracing(args.trace);
  let options = load_options(&args);

  let input_name = args
    .input
    .as_ref()
    .map(|p| p.to_string_lossy().into_owned())
    .unwrap_or_else(|| "<stdin>".to_string());
  let mut input = Vec::new();
  let mut input_file: Box<dyn Read> = match args.input.as_ref() {
    Some(p) => match File::open(p) {
      Ok(f) => Box::new(f),
      Err(err) => exit_with_error(format!("failed to open {}: {err}", p.display())),
    },
    None => Box::new(stdin()),
  };
  if let Err(err) = input_file.read_to_end(&mut input) {
    exit_with_error(format!("failed to read input: {err}"));
  };

  let output = match transform_bytes(&input, &options) {
    Ok(output) => output,
    Err(err) => report(&input_name, &input, &err),
  };
  let write_result = match args.output.as_ref() {
    Some(p) => File::create(p)
      .and_then(|mut file| file.write_all(output.as_bytes()))
      .map_err(|err| (p.display().to_string(), err)),
    None => stdout()
      .write_all(output.as_bytes())
      .map_err(|err| ("<stdout>".to_string(), err)),
  };
  if let Err((dest, err)) = write_result {
    exit_with_error(format!("failed to write {dest}: {err}"));
  };
}
