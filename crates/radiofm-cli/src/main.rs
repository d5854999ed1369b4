use anyhow::Context;
use clap::{Parser, Subcommand};
use radiofm_core::catalog::{
    load_stations_from_file, CatalogProvider, CountryDirectory, HttpCatalog, StaticCatalog,
};
use radiofm_core::config::Config;
use radiofm_core::events::StoreEvent;
use radiofm_core::storage::JsonFileStore;
use radiofm_core::{Country, FavoritesStore, IdentityKey, IdentityPolicy, Station};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Parser, Debug)]
#[command(name = "radiofm", version, about = "Internet radio favorites")]
struct Cli {
    /// Config file (defaults to ~/.config/radiofm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the duplicate-detection policy: name, url, name_and_url, identifier
    #[arg(long, global = true)]
    policy: Option<IdentityPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog stations, marking favorites
    Stations {
        /// ISO country code
        #[arg(long)]
        country: Option<String>,
    },
    /// List known countries
    Countries {
        /// Show only the country with this ISO code
        #[arg(long)]
        iso: Option<String>,
    },
    /// List favorite stations
    Favorites,
    /// Show one favorite by name or by its 1-based position
    Show { station: String },
    /// Mark a station as favorite
    Add { name: String, url: String },
    /// Unmark a station; without a url every favorite with that name goes
    Remove { name: String, url: Option<String> },
    /// Flip a station's favorite status
    Toggle { name: String, url: String },
}

/// Catalog picked from config: a local station file wins over the backend.
enum Catalog {
    File(StaticCatalog),
    Backend(HttpCatalog),
}

impl CatalogProvider for Catalog {
    async fn stations(&self, country: Option<&str>) -> radiofm_core::Result<Vec<Station>> {
        match self {
            Catalog::File(c) => c.stations(country).await,
            Catalog::Backend(c) => c.stations(country).await,
        }
    }

    async fn countries(&self) -> radiofm_core::Result<Vec<Country>> {
        match self {
            Catalog::File(c) => c.countries().await,
            Catalog::Backend(c) => c.countries().await,
        }
    }
}

fn open_catalog(config: &Config) -> anyhow::Result<Catalog> {
    if let Some(path) = config.catalog.stations_file.as_ref().filter(|p| p.exists()) {
        let stations = load_stations_from_file(path)
            .with_context(|| format!("reading station list {:?}", path))?;
        return Ok(Catalog::File(StaticCatalog::from_stations(stations)));
    }

    match config.catalog.origin.as_deref() {
        Some(origin) => Ok(Catalog::Backend(HttpCatalog::new(
            origin,
            config.catalog.timeout(),
        )?)),
        None => anyhow::bail!(
            "no station source: set [catalog] stations_file or origin in {:?}",
            Config::config_path()
        ),
    }
}

fn init_logging(filter: &str) -> anyhow::Result<PathBuf> {
    let data_dir = radiofm_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("radiofm.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    Ok(log_path)
}

/// Surface storage failures that the store only reported on its channel.
fn report_events(rx: &mut broadcast::Receiver<StoreEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            StoreEvent::StorageFailed { message } => {
                warn!("Favorites not saved: {}", message)
            }
            StoreEvent::RecordSkipped { index, reason } => {
                warn!("Ignored stored favorite #{}: {}", index, reason)
            }
            other => info!("{:?}", other),
        }
    }
}

fn print_station(station: &Station) {
    let mark = if station.is_favorite { "★" } else { " " };
    println!("{} {:<32} {}", mark, station.name, station.url);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path).with_context(|| format!("reading {:?}", path))?,
        None => Config::load()?,
    };
    if let Some(policy) = cli.policy {
        config.storage.identity_policy = policy;
    }

    let log_path = init_logging(&config.log.filter)?;
    info!("Log file: {:?}", log_path);

    let storage = JsonFileStore::new(&config.storage.favorites_file);
    let mut favorites = FavoritesStore::new(storage, config.storage.identity_policy);
    let mut events = favorites.subscribe();
    favorites.load();
    report_events(&mut events);

    match cli.command {
        Command::Stations { country } => {
            let catalog = open_catalog(&config)?;
            let stations = catalog.stations(country.as_deref()).await?;
            for station in favorites.filter(&stations) {
                print_station(&station);
            }
        }
        Command::Countries { iso } => {
            let catalog = open_catalog(&config)?;
            let directory = CountryDirectory::new(catalog.countries().await?);
            let countries: Vec<&Country> = match iso.as_deref() {
                Some(code) => directory.by_iso(Some(code)).into_iter().collect(),
                None => directory.iter().collect(),
            };
            if countries.is_empty() {
                println!("No countries found");
            }
            for country in countries {
                println!("{:<4} {} ({})", country.iso_code, country.name, country.localized_name);
            }
        }
        Command::Favorites => {
            if favorites.is_empty() {
                println!("No favorites yet");
            }
            for (idx, station) in favorites.favorites().iter().enumerate() {
                println!("{:>3}. {:<32} {}", idx + 1, station.name, station.url);
            }
        }
        Command::Show { station } => {
            let found = match station.parse::<usize>() {
                Ok(pos) if pos > 0 => favorites.get_station_at(pos - 1),
                _ => favorites.get_station(&station),
            };
            match found {
                Some(s) => {
                    println!("name:        {}", s.name);
                    println!("url:         {}", s.url);
                    println!("icon:        {}", s.icon_name);
                    if !s.description.is_empty() {
                        println!("description: {}", s.description);
                    }
                    if s.identifier != 0 {
                        println!("id:          {}", s.identifier);
                    }
                }
                None => println!("{} is not a favorite", station),
            }
        }
        Command::Add { name, url } => {
            if favorites.add(Station::new(&name, url)) {
                println!("Added {}", name);
            } else {
                println!("{} is already a favorite", name);
            }
        }
        Command::Remove { name, url } => {
            let removed = match url {
                Some(url) => favorites.remove(&Station::new(&name, url)),
                None => favorites.remove_key(&IdentityKey::Name(name.clone())),
            };
            if removed {
                println!("Removed {}", name);
            } else {
                println!("{} was not a favorite", name);
            }
        }
        Command::Toggle { name, url } => {
            let now = favorites.toggle(Station::new(&name, url));
            println!("{} {}", name, if now { "added" } else { "removed" });
        }
    }

    report_events(&mut events);
    Ok(())
}
