mod cli;

use dvremux::config;
use dvremux_mp4::{ByteRange, DoviConfig, Remuxer};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dvremux=trace,dvremux_mp4=trace".to_string()
        } else {
            "dvremux=debug,dvremux_mp4=debug".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Remux {
            input,
            output,
            profile,
            level,
            compat,
            offset,
            length,
            keep_partial,
            unknown_boxes,
        } => {
            let overrides = RemuxOverrides {
                profile,
                level,
                compat,
                range: offset.zip(length).map(|(start, length)| ByteRange { start, length }),
                keep_partial,
                unknown_boxes: unknown_boxes.map(Into::into),
            };
            remux(&input, &output, cli.config.as_deref(), overrides)
        }
        Commands::Locate { input, json } => locate(&input, cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dvremux {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Command-line values that win over the config file.
struct RemuxOverrides {
    profile: Option<u8>,
    level: Option<u8>,
    compat: Option<u8>,
    range: Option<ByteRange>,
    keep_partial: bool,
    unknown_boxes: Option<dvremux_mp4::UnknownBoxPolicy>,
}

fn remux(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    overrides: RemuxOverrides,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let dovi = DoviConfig::new(
        overrides.profile.unwrap_or(config.dovi.profile),
        overrides.level.unwrap_or(config.dovi.level),
        overrides.compat.unwrap_or(config.dovi.bl_compatibility_id),
    )
    .context("Invalid Dolby Vision parameters")?;

    let mut options = config.remux.to_options();
    options.range = overrides.range;
    options.keep_partial_output |= overrides.keep_partial;
    if let Some(policy) = overrides.unknown_boxes {
        options.unknown_boxes = policy;
    }

    let mut remuxer = Remuxer::with_options(dovi, options);
    let summary = remuxer
        .remux(input, output)
        .with_context(|| format!("Failed to remux {:?}", input))?;

    if let Some(location) = remuxer.location() {
        println!(
            "Inserted {} into track {} ({})",
            dovi.box_type(),
            location.track_index,
            location.sample_entry
        );
    }
    println!("Output: {} ({} bytes)", output.display(), summary.bytes_written);

    Ok(())
}

fn locate(input: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("File does not exist: {:?}", input);
    }

    let dovi = config.dovi.to_dovi_config()?;
    let remuxer = Remuxer::with_options(dovi, config.remux.to_options());
    let location = remuxer
        .inspect(input)
        .with_context(|| format!("Failed to locate insertion track in {:?}", input))?;

    if json {
        let json_str = serde_json::to_string_pretty(&location)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", input.display());
        println!("Track: {}", location.track_index);
        println!("Sample entry: {}", location.sample_entry);
        println!("Media data before moov: {}", location.mdat_first);
        println!("Fragmented: {}", location.fragmented);
        if let Some(existing) = location.existing_dovi {
            match location.existing_config {
                Some(record) => println!(
                    "Existing Dolby Vision box: {} (profile {} level {} compatibility {})",
                    existing,
                    record.profile(),
                    record.level(),
                    record.bl_compatibility_id()
                ),
                None => println!("Existing Dolby Vision box: {} (unreadable)", existing),
            }
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config)?;
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_config(&config)?;
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) -> Result<()> {
    let dovi = config.dovi.to_dovi_config()?;
    println!(
        "  Dolby Vision: profile {} level {} compatibility {} ({})",
        dovi.profile(),
        dovi.level(),
        dovi.bl_compatibility_id(),
        dovi.box_type()
    );
    println!("  Unknown boxes: {:?}", config.remux.unknown_boxes);
    println!("  Allow fragmented: {}", config.remux.allow_fragmented);
    println!("  Max moov size: {} bytes", config.remux.max_moov_size);
    println!("  Keep partial output: {}", config.remux.keep_partial_output);
    Ok(())
}
