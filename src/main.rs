mod autocomplete;
mod cli;
mod handlers;
mod http;
mod init;
mod models;
mod scrape;
mod sheets;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use cli::Commands;
use handlers::{Consts, Ctx};
use sheets::Sheets;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const DEFAULT_TABLE_ID: &str = "data-table";
const DEFAULT_ARTIFACT: &str = "neighborhoods.json";

#[tokio::main]
async fn main() {
    init::init_logger();

    let cli = cli::Cli::parse();

    // Handle CLI flags.
    if let Some(cmd) = cli.command {
        match cmd {
            // Generate a new config file.
            Commands::NewConfig { path } => {
                match init::generate_config(&path) {
                    Ok(_) => {
                        log::info!("config file generated: {}", path.display());
                    }
                    Err(e) => {
                        log::error!("error generating config: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }

            // One-off build of the neighborhoods lookup artifact.
            Commands::Scrape {
                url,
                table_id,
                output,
            } => {
                let config = init::init_config(&cli.config);

                let url = url.unwrap_or(config.scrape.url);
                if url.is_empty() {
                    log::error!("no scrape url given (--url or [scrape].url in config)");
                    std::process::exit(1);
                }
                let table_id = table_id.unwrap_or(config.scrape.table_id);
                let table_id = if table_id.is_empty() {
                    DEFAULT_TABLE_ID.to_string()
                } else {
                    table_id
                };
                let output = output.unwrap_or_else(|| {
                    if config.scrape.output.is_empty() {
                        PathBuf::from(DEFAULT_ARTIFACT)
                    } else {
                        PathBuf::from(config.scrape.output)
                    }
                });

                if let Err(e) = scrape::run(&url, &table_id, &output).await {
                    match e {
                        scrape::ScrapeError::StructureNotFound(_) => {
                            log::error!("{}. No artifact was written.", e);
                        }
                        _ => log::error!("scrape failed: {}", e),
                    }
                    std::process::exit(1);
                }
                return;
            }
        }
    }

    // Server mode.
    let config = init::init_config(&cli.config);

    // Load the neighborhoods artifact for the autocomplete.
    let neighborhoods_file = if config.app.neighborhoods_file.is_empty() {
        DEFAULT_ARTIFACT.to_string()
    } else {
        config.app.neighborhoods_file.clone()
    };
    let neighborhoods = Arc::new(init::init_neighborhoods(&neighborhoods_file));

    // Site templates: disk theme from --site, or the embedded default.
    let site_tpl = if let Some(site_path) = &cli.site {
        log::info!("loading site theme: {}", site_path.display());

        let templates = init::init_site_templates(site_path).unwrap_or_else(|e| {
            log::error!(
                "error loading site templates from {}: {}",
                site_path.display(),
                e
            );
            std::process::exit(1);
        });

        Arc::new(templates)
    } else {
        match init::init_embedded_templates() {
            Ok(t) => Arc::new(t),
            Err(e) => {
                log::error!("error loading embedded templates: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Load i18n strings from the active theme.
    let i18n = if let Some(site_path) = &cli.site {
        init::load_i18n(&site_path.join("lang.json")).unwrap_or_else(|e| {
            log::warn!("failed to load i18n: {}, using empty", e);
            std::collections::HashMap::new()
        })
    } else {
        init::load_embedded_i18n().unwrap_or_else(|e| {
            log::warn!("failed to load embedded i18n: {}, using empty", e);
            std::collections::HashMap::new()
        })
    };

    // Spreadsheet webhook client for lead logging.
    let sheets = Arc::new(Sheets::new(
        config.sheets.url.clone(),
        config.sheets.timeout_secs,
    ));
    if !sheets.is_configured() {
        log::warn!("[sheets].url is empty, leads will not be logged");
    }

    // Preload static files (JS & CSS) for bundling.
    let static_files = http::preload_static_files(&cli.site);

    // Setup the global app context used in HTTP handlers.
    let ctx = Arc::new(Ctx {
        neighborhoods,
        sheets,
        site_tpl,
        site_path: cli.site.clone(),
        i18n,
        static_files,

        // Global constants.
        consts: Consts {
            root_url: config.app.root_url,
            whatsapp_number: config.app.whatsapp_number,
            enable_leads: config.app.enable_leads,
            ..Default::default()
        },

        // Generate a random string for asset version cache busting.
        asset_ver: format!(
            "{:08}",
            chrono::Local::now().timestamp_nanos_opt().unwrap_or(0) % 100_000_000
        ),
        version: env!("VERSION").to_string(),
    });

    // Start the HTTP server.
    let routes = http::init_handlers(ctx);
    let addr = config.app.address;

    log::info!("starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("error listening on {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, routes).await {
        log::error!("server error: {}", e);
        std::process::exit(1);
    }
}
