use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use polyevolve::render::{render_rgba, set_polygon_antialiasing};
use polyevolve::{AppSettings, Engine, TargetImage};

const DEFAULT_IMAGE: &str = "original.png";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let settings = AppSettings::load();
    set_polygon_antialiasing(settings.polygon_antialiasing);

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_IMAGE.to_owned());
    let rgba8 = image::open(&path)?.to_rgba8();
    let (width, height) = rgba8.dimensions();
    let target = Arc::new(TargetImage::from_rgba(width, height, rgba8.into_raw())?);
    info!(%path, width, height, "loaded target");

    let mut engine = Engine::new();
    let updates = engine.subscribe();
    engine.start(settings.to_engine_config(target))?;

    let deadline = settings.run_duration().map(|d| Instant::now() + d);
    loop {
        let wait = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(left) => left,
                None => break,
            },
            None => Duration::from_secs(3600),
        };
        match updates.recv_timeout(wait) {
            Ok(update) => debug!(
                improvements = update.improvements,
                divergence = update.best.divergence,
                kind = ?update.best.last_mutation,
                "best updated"
            ),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let snapshot = engine.stop()?;
    let rgba = render_rgba(&snapshot.best, width, height).ok_or("failed to render final candidate")?;
    image::save_buffer(&settings.output_path, &rgba, width, height, image::ColorType::Rgba8)?;
    info!(
        output = %settings.output_path,
        divergence = snapshot.best.divergence,
        improvements = snapshot.improvement_count,
        mutations = snapshot.mutation_count,
        "wrote final best"
    );
    Ok(())
}
