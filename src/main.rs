use clap::Parser;
use playercard::{CardPipeline, Settings, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Render player stat cards as PNG images
#[derive(Parser, Debug)]
#[command(name = "playercard")]
#[command(about = "Render a player's JSON record to a PNG stat card", long_about = None)]
struct Args {
    /// Input JSON file (use "-" for stdin)
    #[arg(value_name = "INPUT", required_unless_present = "list_themes")]
    input: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "list_themes")]
    output: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Built-in theme name
    #[arg(short, long, value_name = "THEME")]
    theme: Option<String>,

    /// Theme file (TOML or YAML), overrides --theme
    #[arg(long, value_name = "THEME_FILE")]
    theme_file: Option<PathBuf>,

    /// Directory photos may be loaded from (repeatable)
    #[arg(long = "allowed-root", value_name = "DIR")]
    allowed_roots: Vec<PathBuf>,

    /// Base directory for relative roots and photo references
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Card width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Card height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Render timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the built-in theme names and exit
    #[arg(long)]
    list_themes: bool,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_themes {
        for name in Theme::list_builtins() {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = settings_from_args(&args)?;

    let input = args.input.as_ref().ok_or("Missing input file")?;
    let output = args.output.as_ref().ok_or("Missing output path")?;

    let output_ext = output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("Output file has no extension")?
        .to_ascii_lowercase();
    if output_ext != "png" {
        return Err(format!("Unsupported output format: .{} (use .png)", output_ext));
    }

    // Read player record
    let content = if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(input).map_err(|e| format!("Failed to read input file: {}", e))?
    };
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| format!("Invalid JSON input: {}", e))?;

    let pipeline = Arc::new(CardPipeline::from_settings(&settings)?);
    let png = pipeline
        .generate_with_timeout(raw, settings.render_timeout())
        .map_err(|e| {
            if e.is_client_error() {
                e.to_string()
            } else {
                e.public_message()
            }
        })?;

    std::fs::write(output, png).map_err(|e| format!("Failed to write PNG: {}", e))?;
    eprintln!("PNG saved to: {}", output.display());

    Ok(())
}

fn settings_from_args(args: &Args) -> Result<Settings, String> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(theme) = &args.theme {
        settings.theme = theme.clone();
    }
    if let Some(theme_file) = &args.theme_file {
        if !theme_file.is_file() {
            return Err(format!("Theme file not found: {}", theme_file.display()));
        }
        settings.theme_file = Some(theme_file.clone());
    }
    if !args.allowed_roots.is_empty() {
        settings.allowed_roots = args.allowed_roots.clone();
    }
    if let Some(root) = &args.project_root {
        settings.project_root = root.clone();
    }
    if let Some(width) = args.width {
        settings.canvas_width = width;
    }
    if let Some(height) = args.height {
        settings.canvas_height = height;
    }
    if let Some(timeout) = args.timeout_ms {
        settings.render_timeout_ms = timeout;
    }

    Ok(settings)
}
