//! Stepwise Visualization Server
//!
//! Mount one sample visualizer and serve it to the browser front end.

use std::env;

use stepwise_playback::PlaybackConfig;
use stepwise_vis::{Error, VisualizerKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepwise_vis=info,stepwise_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();

    let Some(name) = args.get(1) else {
        println!("Usage: stepwise-vis <visualizer> [port]");
        println!();
        println!("Visualizers:");
        for kind in VisualizerKind::ALL {
            println!("  {kind}");
        }
        return Ok(());
    };
    let kind: VisualizerKind = name.parse()?;

    let port: u16 = match args.get(2) {
        Some(port) => port.parse().map_err(|_| Error::InvalidPort(port.clone()))?,
        None => DEFAULT_PORT,
    };

    println!("Stepwise Visualizer");
    println!("===================");
    println!();
    println!("Serving {kind} on http://localhost:{port}");
    println!("Open in browser to step through the run.");
    println!();

    kind.serve(port, PlaybackConfig::default()).await?;

    Ok(())
}
