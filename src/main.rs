mod client;
mod config;
mod display;
mod error;
mod parser;
mod quiz;
mod timetable;
mod web;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use client::ApiClient;
use config::{parse_port, Config};
use display::{print_timetable, write_grid_csv, write_grid_to_file};
use error::FetchError;
use parser::load_envelope;
use timetable::Timetable;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = Config::from_env()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = match args.get(2) {
            Some(raw) => parse_port(raw)?,
            None => config.port,
        };

        let client = ApiClient::new(&config.api_base_url);
        info!(port, api = client.base_url(), "starting web server");
        println!("Access the timetable at http://localhost:{}/timetable", port);

        web::start_server(port, client, config.slots.clone()).await?;
        return Ok(());
    }

    let timetable = if args.len() > 2 && args[1] == "render" {
        println!("Loading timetable from {}...", args[2]);
        let envelope = load_envelope(&args[2])?;
        Timetable::from_envelope(&envelope, &config.slots)
    } else {
        let Some(ctx) = config.identity.as_ref() else {
            eprintln!("No student ID found. Set STUDENT_ID and API_TOKEN.");
            return Err(FetchError::MissingIdentity.into());
        };

        println!("Fetching timetable for {}...", ctx.student_id);
        let client = ApiClient::new(&config.api_base_url);
        info!(api = client.base_url(), "fetching timetable");
        match client.fetch_timetable(ctx).await {
            Ok(envelope) => Timetable::from_envelope(&envelope, &config.slots),
            Err(e) => {
                error!(error = %e, "timetable fetch failed");
                eprintln!("Could not load timetable");
                return Err(e.into());
            }
        }
    };

    print_timetable(&timetable.grid, &timetable.rejected);

    std::fs::create_dir_all(&config.output_dir)?;
    let text_path = config.output_dir.join("timetable.txt");
    let csv_path = config.output_dir.join("timetable.csv");
    write_grid_to_file(&timetable.grid, &text_path)?;
    write_grid_csv(&timetable.grid, &csv_path)?;

    println!("\nTimetable saved to:");
    println!("  - {}", text_path.display());
    println!("  - {}", csv_path.display());

    Ok(())
}
