use anyhow::Context;
use clap::Parser;
use rfcloud::{ErrorKind, RenderOptions, Viewport, Words};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Render a word cloud image with headless Chrome.
#[derive(Parser, Debug)]
#[command(name = "rfcloud", version, about)]
struct Cli {
    /// Words to render (joined with spaces and tallied)
    text: Vec<String>,

    /// Read raw text from a file ('-' for stdin)
    #[arg(short, long, conflicts_with_all = ["text", "json"])]
    input: Option<PathBuf>,

    /// Read a JSON string, array of strings, or object of weights ('-' for stdin)
    #[arg(long, conflicts_with = "text")]
    json: Option<PathBuf>,

    /// Output image path (.png, .jpg or .webp)
    #[arg(short, long, default_value = rfcloud::DEFAULT_SAVE_PATH)]
    output: PathBuf,

    /// Use weights as font sizes instead of log-scaling them
    #[arg(long)]
    no_normalize: bool,

    /// JSON file with render options
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_size: Option<f64>,

    #[arg(long)]
    max_size: Option<f64>,

    /// CSS background color
    #[arg(long)]
    background: Option<String>,

    /// CSS font family
    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    padding: Option<f64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Chrome/Chromium executable to use
    #[arg(long)]
    browser_path: Option<PathBuf>,

    /// Launch Chrome without its sandbox (containers)
    #[arg(long)]
    no_sandbox: bool,

    /// Seed for reproducible layouts
    #[arg(long)]
    seed: Option<u32>,

    /// Overall timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Timeout for the layout to finish, in milliseconds
    #[arg(long)]
    layout_timeout_ms: Option<u64>,
}

impl Cli {
    fn options(&self) -> anyhow::Result<RenderOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => RenderOptions::default(),
        };

        if let Some(v) = self.min_size {
            options.min_size = v;
        }
        if let Some(v) = self.max_size {
            options.max_size = v;
        }
        if let Some(v) = &self.background {
            options.background_color = v.clone();
        }
        if let Some(v) = &self.font {
            options.font = v.clone();
        }
        if let Some(v) = self.padding {
            options.padding = v;
        }
        options.canvas = Viewport {
            width: self.width.unwrap_or(options.canvas.width),
            height: self.height.unwrap_or(options.canvas.height),
        };
        if let Some(v) = &self.browser_path {
            options.browser_path = Some(v.clone());
        }
        if self.no_sandbox {
            options.disable_sandbox = true;
        }
        if self.seed.is_some() {
            options.seed = self.seed;
        }
        if let Some(v) = self.timeout_ms {
            options.timeout_ms = v;
        }
        if let Some(v) = self.layout_timeout_ms {
            options.layout_timeout_ms = v;
        }
        Ok(options)
    }

    fn words(&self) -> anyhow::Result<Words> {
        if let Some(path) = &self.json {
            let raw = read_source(path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing JSON words from {}", path.display()))?;
            return Ok(Words::try_from(value)?);
        }
        if let Some(path) = &self.input {
            return Ok(Words::Text(read_source(path)?));
        }
        Ok(Words::Text(self.text.join(" ")))
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = cli.options()?;
    let words = cli.words()?;
    rfcloud::generate(words, !cli.no_normalize, &cli.output, &options)
        .with_context(|| format!("rendering {}", cli.output.display()))?;
    println!("{}", cli.output.display());
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<rfcloud::Error>().map(|e| e.kind()) {
        Some(ErrorKind::InvalidInput) | Some(ErrorKind::Config) => 2,
        Some(ErrorKind::Launch) => 3,
        Some(ErrorKind::DocumentLoad) => 4,
        Some(ErrorKind::Capture) => 5,
        None => 1,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rfcloud: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
