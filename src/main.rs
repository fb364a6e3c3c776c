mod airports;
mod app;
mod clock;
mod config;
mod error;
mod geo;
mod globe;
mod great_circle;
mod location;
mod solar;
mod terminator;
mod tui;
mod ui;

use app::{App, Dataset};
use chrono::{DateTime, Utc};
use clock::SimClock;
use config::Config;
use location::GeoResolver;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let mut start_time: Option<DateTime<Utc>> = None;
    let mut route = None;

    match args.get(1).map(String::as_str) {
        None => {}
        Some("route") if args.len() == 4 => {
            route = Some((args[2].clone(), args[3].clone()));
        }
        Some("at") if args.len() == 3 => {
            start_time = Some(DateTime::parse_from_rfc3339(&args[2])?.with_timezone(&Utc));
        }
        _ => {
            println!("Usage: {} [route <DEP> <ARR> | at <RFC3339 time>]", args[0]);
            return Ok(());
        }
    }

    let config = Config::from_env()?;

    // The terminal belongs to the UI, so logs go to a file
    let log_file = File::create(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    info!(?config, "starting dayline");

    let home = GeoResolver::new(&config.geoip_db).device_location(config.device_ip, config.home);
    let clock = SimClock::new(start_time.unwrap_or_else(Utc::now), config.time_scale);
    let dataset = Dataset::Loading(airports::spawn_load(config.airports_url.clone()));

    let mut app = App::new(&config, clock, home, dataset);
    app.pending_route = route;

    let mut terminal = tui::Tui::init()?;
    let res = run_app(&mut terminal, &mut app, config.tick_rate).await;
    drop(terminal);

    info!("dayline stopped");
    Ok(res?)
}

async fn run_app(terminal: &mut tui::Tui, app: &mut App, tick_rate: Duration) -> io::Result<()> {
    let mut last_tick = Instant::now();
    let mut needs_render = true;

    while !app.should_quit {
        if needs_render {
            terminal.draw(|f| ui::render(f, app))?;
            needs_render = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        // Yield to the runtime so the dataset fetch makes progress
        if timeout > Duration::from_millis(10) {
            tokio::time::sleep(timeout - Duration::from_millis(10)).await;
        }

        if app.poll_dataset() {
            needs_render = true;
        }

        if crossterm::event::poll(Duration::from_millis(10))? {
            app.handle_events()?;
            needs_render = true; // Input might change state
        }

        if last_tick.elapsed() >= tick_rate {
            let now = app.clock.now();
            app.tick(now);
            last_tick = Instant::now();
            needs_render = true; // Sun moved and the globe rotated
        }
    }
    Ok(())
}
