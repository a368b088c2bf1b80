use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facematch_core::{Comparer, FaceImage, Gallery, PRELOADED_FACES_SUBDIR, PRELOADED_FACES_URL_BASE};
use facematch_facepp::{FacePlusPlus, FacePlusPlusConfig};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "facematch", about = "facematch face lookalike CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo to a running facematchd and print the match
    Analyze {
        /// Image file (JPEG or PNG)
        image: PathBuf,
        /// Base URL of facematchd
        #[arg(long, env = "FACEMATCH_URL", default_value = "http://127.0.0.1:10000")]
        server: String,
    },
    /// Compare two images directly with Face++ (needs FACEPP_API_KEY/SECRET)
    Compare {
        probe: PathBuf,
        candidate: PathBuf,
    },
    /// List the preloaded gallery faces
    Gallery {
        /// Static directory containing preloaded_ai_faces/
        #[arg(long, env = "FACEMATCH_STATIC_DIR", default_value = "static")]
        static_dir: PathBuf,
    },
    /// Show daemon status
    Status {
        /// Base URL of facematchd
        #[arg(long, env = "FACEMATCH_URL", default_value = "http://127.0.0.1:10000")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { image, server } => analyze(&image, &server).await?,
        Commands::Compare { probe, candidate } => compare(&probe, &candidate).await?,
        Commands::Gallery { static_dir } => {
            let gallery = Gallery::load(static_dir.join(PRELOADED_FACES_SUBDIR), PRELOADED_FACES_URL_BASE)?;
            if gallery.is_empty() {
                println!("No preloaded faces in {}", gallery.dir().display());
            }
            for entry in gallery.entries() {
                println!("{}\t{}", entry.file_name, entry.url);
            }
        }
        Commands::Status { server } => {
            let url = endpoint(&server, "status");
            let body: serde_json::Value = reqwest::get(&url)
                .await
                .with_context(|| format!("facematchd not reachable at {url}"))?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

async fn read_image(path: &Path) -> Result<FaceImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(FaceImage::new(file_name, bytes))
}

fn endpoint(server: &str, path: &str) -> String {
    format!("{}/{path}", server.trim_end_matches('/'))
}

async fn analyze(image: &Path, server: &str) -> Result<()> {
    let upload = read_image(image).await?;
    let mime = upload.mime_type();
    let part = Part::bytes(upload.bytes)
        .file_name(upload.file_name)
        .mime_str(mime)?;
    let form = Form::new().part("user_image", part);

    let url = endpoint(server, "analyze-face");
    let response = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("facematchd not reachable at {url}"))?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        bail!("analysis failed ({status}): {}", error_message(&text));
    }
    let body: serde_json::Value =
        serde_json::from_str(&text).context("facematchd returned a non-JSON report")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// The `error` field of a JSON error body, or the raw text when the body
/// is not one (e.g. a proxy's HTML error page).
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string));
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response".to_string(),
        None => body.trim().to_string(),
    }
}

async fn compare(probe: &Path, candidate: &Path) -> Result<()> {
    let client = FacePlusPlus::new(FacePlusPlusConfig::from_env().map_err(anyhow::Error::msg)?)?;
    let probe = read_image(probe).await?;
    let candidate = read_image(candidate).await?;

    let comparison = client.compare(&probe, &candidate).await?;
    println!("Confidence: {:.3}", comparison.confidence);
    println!("Score:      {}", comparison.similarity_score());
    if let Some(t) = &comparison.thresholds {
        println!(
            "Thresholds: 1e-3={:.3} 1e-4={:.3} 1e-5={:.3}",
            t.e3, t.e4, t.e5
        );
        println!(
            "Same person (1e-5): {}",
            if comparison.is_likely_same_person() { "likely" } else { "unlikely" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_endpoint_joins_paths() {
        assert_eq!(endpoint("http://h:1/", "status"), "http://h:1/status");
        assert_eq!(endpoint("http://h:1", "analyze-face"), "http://h:1/analyze-face");
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"error":"No image file provided"}"#),
            "No image file provided"
        );
        assert_eq!(
            error_message("<html>502 Bad Gateway</html>\n"),
            "<html>502 Bad Gateway</html>"
        );
        assert_eq!(error_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
        assert_eq!(error_message(""), "empty response");
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["facematch", "analyze", "me.jpg", "--server", "http://x:2"])
            .unwrap();
        match cli.command {
            Commands::Analyze { image, server } => {
                assert_eq!(image, PathBuf::from("me.jpg"));
                assert_eq!(server, "http://x:2");
            }
            _ => panic!("expected analyze"),
        }
    }
}
