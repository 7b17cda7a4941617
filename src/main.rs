// Copyright 2026 Placelens Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use placelens::config::Config;
use placelens::pipeline::PlaceDiagnoser;
use placelens::renderer::chromium::{find_chromium, ChromiumRenderer};
use placelens::renderer::{NoopRenderer, Renderer};
use placelens::resolver::Resolver;
use placelens::rest::{self, AppState};
use placelens::scrape::extract::TextHeuristicExtractor;
use placelens::scrape::ScrapeExecutor;
use placelens::social::SocialDiagnoser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "placelens",
    about = "Placelens — health diagnostics for public place listings",
    version
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the diagnosis HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "7860")]
        port: u16,
    },
    /// Diagnose a single place listing URL
    Diagnose {
        /// Listing URL (shortener links are resolved)
        url: String,
    },
    /// Diagnose a social profile handle
    Social {
        /// Profile handle, with or without a leading @
        handle: String,
    },
    /// Check environment and diagnose issues
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "placelens=debug" } else { "placelens=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("valid logging directive")),
        )
        .init();

    let config = Arc::new(Config::from_env());

    match cli.command {
        Commands::Serve { port } => serve(port, config).await,
        Commands::Diagnose { url } => diagnose(&url, config, cli.json).await,
        Commands::Social { handle } => social(&handle, config, cli.json).await,
        Commands::Doctor => doctor().await,
    }
}

async fn serve(port: u16, config: Arc<Config>) -> Result<()> {
    let (renderer, browser_available): (Arc<dyn Renderer>, bool) =
        match ChromiumRenderer::new().await {
            Ok(r) => {
                info!("Chromium renderer initialized");
                (Arc::new(r), true)
            }
            Err(e) => {
                warn!("Chromium unavailable, place diagnoses will fail: {e:#}");
                (Arc::new(NoopRenderer), false)
            }
        };

    let state = Arc::new(AppState {
        place: Arc::new(build_place_diagnoser(renderer, &config)),
        social: Arc::new(SocialDiagnoser::new(&config)),
        browser_available,
    });

    // Hourly sweep so long-idle entries do not pin memory between requests.
    let purge_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            tick.tick().await;
            purge_state.place.cache().purge_expired();
            purge_state.social.cache().purge_expired();
        }
    });

    rest::start(port, state).await
}

async fn diagnose(url: &str, config: Arc<Config>, json: bool) -> Result<()> {
    let renderer: Arc<dyn Renderer> = Arc::new(ChromiumRenderer::new().await?);
    let diagnoser = build_place_diagnoser(renderer, &config);

    match diagnoser.diagnose(url).await {
        Ok(outcome) => {
            let r = &outcome.result;
            if json {
                println!("{}", serde_json::to_string_pretty(r)?);
            } else {
                println!("{} — {} ({})", r.place_name, r.score, r.grade);
                for item in &r.breakdown {
                    println!("  {:<12} {:>3}/{:<3} {}", item.name, item.score, item.max, item.notes);
                }
                if !r.recommendations.is_empty() {
                    println!("추천:");
                    for rec in &r.recommendations {
                        println!("  - {rec}");
                    }
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.code());
            std::process::exit(1);
        }
    }
}

async fn social(handle: &str, config: Arc<Config>, json: bool) -> Result<()> {
    let diagnoser = SocialDiagnoser::new(&config);
    match diagnoser.diagnose(handle).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "@{} — {} ({}) / 팔로워 {} · 게시물 {}",
                    result.handle, result.score, result.grade, result.followers, result.posts
                );
                for rec in &result.recommendations {
                    println!("  - {rec}");
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.code());
            std::process::exit(1);
        }
    }
}

async fn doctor() -> Result<()> {
    match find_chromium() {
        Some(path) => println!("Chromium: {}", path.display()),
        None => println!("Chromium: NOT FOUND (set PLACELENS_CHROMIUM_PATH or install Chrome)"),
    }
    match ChromiumRenderer::new().await {
        Ok(renderer) => {
            println!("Browser launch: ok");
            renderer.shutdown().await?;
        }
        Err(e) => println!("Browser launch: FAILED ({e:#})"),
    }
    Ok(())
}

fn build_place_diagnoser(renderer: Arc<dyn Renderer>, config: &Arc<Config>) -> PlaceDiagnoser {
    let resolver = Resolver::new(config.resolver_timeout_ms);
    let extractor = Arc::new(TextHeuristicExtractor::new(config));
    let executor = ScrapeExecutor::new(renderer, extractor, Arc::clone(config));
    PlaceDiagnoser::new(resolver, executor, Arc::clone(config))
}
