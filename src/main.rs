use proshots::{
    logger, CancellationToken, Config, GeminiClient, GeneratedArtifact, InlineImage,
    PortraitSession, ProshotsError, StyleSelection, ToolAction,
};
use std::env;
use std::fs;
use std::path::Path;

const USAGE: &str = "usage:
  proshots <style> <photo>...           generate portrait variants
  proshots tool <tool> <photo>          bg | upscale | watermark | resize=WIDTHxHEIGHT[unit]
  proshots edit <instruction> <photo>   free-text edit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init_with_config(logger::LoggerConfig::from_env())?;
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);
    if config.gemini.api_key.is_none() {
        log::warn!("⚠️  No GEMINI_API_KEY or API_KEY set, every call will fail with an auth error");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let client = GeminiClient::new(&config)?;

    let outcome = match args.first().map(String::as_str) {
        Some("tool") if args.len() == 3 => run_tool(&client, &args[1], &args[2]).await,
        Some("edit") if args.len() == 3 => run_edit(&client, &args[1], &args[2]).await,
        Some(style) if args.len() >= 2 && style != "tool" && style != "edit" => {
            run_session(client, &config, style, &args[1..]).await
        }
        _ => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
    };

    if let Err(e) = outcome {
        log::error!("❌ {}", e);
        log::error!("💡 {}", e.notice());
        return Err(e.into());
    }

    log::info!("🎉 Done");
    Ok(())
}

async fn run_session(
    client: GeminiClient,
    config: &Config,
    style: &str,
    photo_paths: &[String],
) -> Result<(), ProshotsError> {
    let style: StyleSelection = style.parse()?;
    let photos = photo_paths
        .iter()
        .map(|path| load_photo(path))
        .collect::<Result<Vec<_>, _>>()?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("🛑 Interrupt received, stopping after the current call");
            on_ctrl_c.cancel();
        }
    });

    log::info!("🎨 {} - {}", style.label(), style.description());
    let mut session = PortraitSession::new(client, config.variant_count);
    let results = session
        .run(
            &photos,
            style,
            |current, total| log::info!("📸 Progress {}/{}", current, total),
            Some(&cancel),
        )
        .await?;

    for (index, artifact) in results.iter().enumerate() {
        save_artifact(artifact, &format!("{}_{:02}", style.slug(), index + 1))?;
    }
    if !session.skipped().is_empty() {
        log::warn!("⚠️  {} variants were skipped", session.skipped().len());
    }
    Ok(())
}

async fn run_tool(client: &GeminiClient, tool: &str, photo: &str) -> Result<(), ProshotsError> {
    let action = parse_tool(tool)?;
    let image = load_photo(photo)?;
    let artifact = client.image().apply_tool(&image, &action).await?;
    save_artifact(&artifact, &format!("{:?}", action.kind()).to_lowercase())
}

async fn run_edit(
    client: &GeminiClient,
    instruction: &str,
    photo: &str,
) -> Result<(), ProshotsError> {
    let image = load_photo(photo)?;
    let edited = client.image().edit(&image, instruction).await?;
    write_image(&edited, "edit")
}

fn parse_tool(name: &str) -> Result<ToolAction, ProshotsError> {
    match name {
        "bg" => Ok(ToolAction::BgRemover),
        "upscale" => Ok(ToolAction::Upscaler),
        "watermark" => Ok(ToolAction::WatermarkRemover),
        _ => {
            let dims = name
                .strip_prefix("resize=")
                .ok_or_else(|| ProshotsError::ConfigError(format!("Unknown tool: {}", name)))?;
            let (width, rest) = dims.split_once('x').ok_or_else(|| {
                ProshotsError::ConfigError("resize expects WIDTHxHEIGHT[unit]".into())
            })?;
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (height, unit) = rest.split_at(digits);
            let parse = |value: &str| {
                value
                    .parse::<u32>()
                    .map_err(|_| ProshotsError::ConfigError(format!("bad dimension: {}", value)))
            };

            Ok(ToolAction::Resizer {
                width: parse(width)?,
                height: parse(height)?,
                unit: if unit.is_empty() { "px".into() } else { unit.into() },
            })
        }
    }
}

fn load_photo(path: &str) -> Result<InlineImage, ProshotsError> {
    let bytes = fs::read(path)
        .map_err(|e| ProshotsError::InvalidImage(format!("cannot read {}: {}", path, e)))?;
    let mime_type = match Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => {
            return Err(ProshotsError::InvalidImage(format!(
                "unsupported image type: {}",
                path
            )))
        }
    };
    Ok(InlineImage::from_bytes(mime_type, &bytes))
}

fn save_artifact(artifact: &GeneratedArtifact, stem: &str) -> Result<(), ProshotsError> {
    write_image(&artifact.image()?, stem)
}

fn write_image(image: &InlineImage, stem: &str) -> Result<(), ProshotsError> {
    let filename = format!(
        "generated_{}_{}.{}",
        stem,
        chrono::Utc::now().timestamp(),
        image.extension()
    );
    fs::write(&filename, image.decode()?)
        .map_err(|e| ProshotsError::ConfigError(format!("cannot write {}: {}", filename, e)))?;
    log::info!("💾 Image saved to: {}", filename);
    Ok(())
}
