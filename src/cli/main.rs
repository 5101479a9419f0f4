use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exe_icon::{candidates, config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exe-icon",
    version,
    about = "Extract display icons from Windows executables and game folders as PNG files"
)]
struct Cli {
    /// Executables or game folders to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Game name hint used to pick the executable inside a folder
    #[arg(short, long, value_name = "NAME")]
    name: Option<String>,

    /// Directory to write icons to (default: next to each executable)
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Extract and report without writing files
    #[arg(long)]
    dry_run: bool,

    /// Replace icons that already exist
    #[arg(long)]
    overwrite: bool,

    /// Only print which executable would be used for each path
    #[arg(long = "pick-only")]
    pick_only: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Include a base64 PNG data URL in JSON output
    #[arg(long = "data-url")]
    data_url: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No executables or folders specified. Use --help for usage.");
    }

    let inputs = pipeline::collect_inputs(&cli.paths);
    if inputs.is_empty() {
        anyhow::bail!("None of the specified paths exist.");
    }

    // Handle --pick-only
    if cli.pick_only {
        for path in &inputs {
            match pipeline::resolve_exe(path, cli.name.as_deref()) {
                Some(exe) => println!("{} -> {}", path.display(), exe.display()),
                None => {
                    let found = candidates::list_exe_candidates(path);
                    log::warn!(
                        "{}: no executable ({} candidate(s))",
                        path.display(),
                        found.len()
                    );
                }
            }
        }
        return Ok(());
    }

    // Load config and apply CLI overrides
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.overwrite {
        config.output.overwrite = true;
    }
    if cli.data_url {
        config.output.embed_data_url = true;
    }
    if let Some(ref out) = cli.out {
        config.output.out_dir = Some(out.to_string_lossy().into_owned());
    }

    log::info!("Found {} path(s) to process", inputs.len());
    if config.output.dry_run {
        log::info!("DRY RUN: no files will be written");
    }

    let mut results = Vec::new();
    let total = inputs.len();

    for (i, path) in inputs.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", i + 1, total, path.display());

        let result = pipeline::process_path(path, cli.name.as_deref(), &config);

        if let Some(ref exe) = result.exe_path {
            if exe != path {
                log::info!("  Executable: {}", exe.display());
            }
        }
        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else {
            if let (Some(kind), Some(w), Some(h)) = (result.kind, result.width, result.height) {
                log::info!("  Icon: {w}x{h} ({kind})");
            }
            if let Some(ref out) = result.output_path {
                let action = if result.written {
                    "Wrote"
                } else if config.output.dry_run {
                    "Would write"
                } else {
                    "Kept existing"
                };
                log::info!("  {action}: {}", out.display());
            }
        }

        results.push(result);
    }

    // JSON output
    if cli.json {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "path": r.path.display().to_string(),
                    "exe_path": r.exe_path.as_ref().map(|p| p.display().to_string()),
                    "kind": r.kind,
                    "width": r.width,
                    "height": r.height,
                    "output_path": r.output_path.as_ref().map(|p| p.display().to_string()),
                    "written": r.written,
                    "data_url": r.data_url,
                    "error": r.error,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = results.len() - success;
    log::info!("Done: {success} succeeded, {failed} without icon out of {total} path(s)");

    Ok(())
}
