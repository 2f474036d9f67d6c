use anyhow::Result;
use arrow::util::pretty::pretty_format_batches;
use hpiscraper::{analyze, config::PipelineConfig, fetch, load, plot};
use reqwest::Client;
use std::{env, io, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let config_path = env::args().nth(1).map(PathBuf::from);
    let cfg = PipelineConfig::load(config_path.as_deref())?;

    // ─── 3) load, analyze, chart (blocking work) ─────────────────────
    let data_cfg = cfg.clone();
    let (analysis, charts) = tokio::task::spawn_blocking(move || -> Result<_> {
        let cleaned = load::load_cleaned(&data_cfg.spreadsheet)?;
        let analysis = analyze::analyze(cleaned, &data_cfg.analysis)?;
        let charts = plot::render_all(&analysis, &data_cfg.charts)?;
        Ok((analysis, charts))
    })
    .await??;

    println!("{}", pretty_format_batches(&[analysis.comparison.clone()])?);
    info!(charts = charts.len(), "data stage done");

    // ─── 4) scrape ───────────────────────────────────────────────────
    if !cfg.scrape.enabled {
        info!("scrape disabled; exit");
        return Ok(());
    }
    let client = Client::new();
    let mut stdout = io::stdout();
    match fetch::scrape(&client, &cfg.scrape, &mut stdout).await? {
        fetch::ScrapeOutcome::PageFailed { status } => {
            error!(%status, "page fetch failed");
        }
        fetch::ScrapeOutcome::Scraped { content, .. } => {
            info!(
                paragraphs = content.paragraphs.len(),
                images = content.images.len(),
                "scrape done"
            );
        }
    }

    info!("all done");
    Ok(())
}
