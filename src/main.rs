use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::Receiver;

use lai::display::{ChannelDisplay, DisplayEvent};
use lai::source::{ClipboardSource, FixedText, SelectionSource, StdinSource, TextSource};
use lai::{logger, Config, TranslationResult, Translator};

#[derive(Debug, Parser)]
#[command(name = "lai", version, about = "Translate clipboard or selected text with a local Ollama model")]
struct Args {
    /// Text to translate; defaults to the clipboard
    text: Option<String>,
    /// Copy the current OS selection and translate it
    #[arg(long, conflicts_with_all = ["text", "stdin"])]
    selection: bool,
    /// Read the text from stdin
    #[arg(long, conflicts_with = "text")]
    stdin: bool,
    #[arg(short, long)]
    model: Option<String>,
    /// Base URL of the Ollama server
    #[arg(long)]
    endpoint: Option<String>,
    /// Config file instead of config.json next to the executable
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ask for a single response instead of a stream
    #[arg(long)]
    no_stream: bool,
    /// Put a finished translation on the clipboard
    #[arg(long)]
    copy: bool,
}

impl Args {
    fn source(&self) -> Arc<dyn TextSource> {
        if self.selection {
            Arc::new(SelectionSource)
        } else if self.stdin {
            Arc::new(StdinSource)
        } else if let Some(text) = &self.text {
            Arc::new(FixedText(text.clone()))
        } else {
            Arc::new(ClipboardSource)
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_from(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::load(),
    };
    cfg.apply_env();
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if args.no_stream {
        cfg.stream = false;
    }
    if args.copy {
        cfg.copy_result = true;
    }
    Ok(cfg)
}

/// Renders display events on the terminal until the worker hangs up.
fn pump(rx: Receiver<DisplayEvent>) {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut shown = String::new();
    for event in rx {
        match event {
            DisplayEvent::Progress(text) => {
                let mut out = stdout.lock();
                match text.strip_prefix(shown.as_str()) {
                    Some(delta) => {
                        let _ = write!(out, "{delta}");
                    }
                    None => {
                        let _ = write!(out, "\n{text}");
                    }
                }
                let _ = out.flush();
                shown = text;
            }
            DisplayEvent::Status(message) => {
                let mut err = stderr.lock();
                let _ = write!(err, "\r\x1b[K{message}");
                let _ = err.flush();
            }
        }
    }
    if !shown.is_empty() {
        println!();
    }
    eprintln!();
}

fn main() -> anyhow::Result<()> {
    logger::init();
    tracing::info!("lai starting");

    let args = Args::parse();
    let cfg = load_config(&args)?;
    tracing::info!(endpoint = %cfg.endpoint, model = %cfg.model, stream = cfg.stream, "config loaded");

    let (display, rx) = ChannelDisplay::new();
    let translator = Translator::new(&cfg, Arc::new(display)).context("building translation client")?;
    let source = args.source();

    // Worker owns the runtime; the main thread stays free to draw.
    let worker = thread::spawn(move || -> anyhow::Result<Option<TranslationResult>> {
        let rt = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
        let outcome = rt.block_on(async move { translator.translate_from(source).await });
        Ok(outcome.ok())
    });

    pump(rx);

    let result = worker
        .join()
        .map_err(|_| anyhow::anyhow!("translation worker panicked"))??;
    match result {
        Some(result) if result.is_done() => Ok(()),
        _ => std::process::exit(1),
    }
}
