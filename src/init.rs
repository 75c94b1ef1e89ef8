use std::path::{Path, PathBuf};

use crate::autocomplete::NeighborhoodSet;
use crate::models::{Config, NeighborhoodRecord};

const SAMPLE_CONFIG: &str = include_str!("../config.sample.toml");

/// Initialize logger.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            use std::io::Write;
            let level = if record.level() != log::Level::Info {
                format!("[{}] ", record.level())
            } else {
                String::new()
            };
            writeln!(
                buf,
                "{} {}:{} {}{}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                level,
                record.args()
            )
        })
        .init();
}

/// Load and merge one or more config files.
pub fn init_config(paths: &[PathBuf]) -> Config {
    let mut config: Option<Config> = None;

    for path in paths {
        log::info!("loading config: {}", path.display());
        match read_config(path) {
            Ok(c) => {
                if let Some(ref mut existing) = config {
                    // Merge configs.
                    merge_config(existing, c);
                } else {
                    config = Some(c);
                }
            }
            Err(e) => {
                log::error!("error loading config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    config.unwrap_or_else(|| {
        log::error!("no config files specified");
        std::process::exit(1);
    })
}

/// Load configuration from TOML file.
fn read_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&content)?;
    Ok(cfg)
}

/// Generate sample config file.
pub fn generate_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err("config file already exists".into());
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(())
}

/// Merge the given src config into the dest config struct.
fn merge_config(dest: &mut Config, src: Config) {
    // Merge app config.
    if !src.app.address.is_empty() {
        dest.app.address = src.app.address;
    }
    if !src.app.root_url.is_empty() {
        dest.app.root_url = src.app.root_url;
    }
    if !src.app.whatsapp_number.is_empty() {
        dest.app.whatsapp_number = src.app.whatsapp_number;
    }
    if !src.app.neighborhoods_file.is_empty() {
        dest.app.neighborhoods_file = src.app.neighborhoods_file;
    }
    dest.app.enable_leads = src.app.enable_leads;

    // Merge sheets config.
    if !src.sheets.url.is_empty() {
        dest.sheets.url = src.sheets.url;
    }
    if src.sheets.timeout_secs > 0 {
        dest.sheets.timeout_secs = src.sheets.timeout_secs;
    }

    // Merge scrape config.
    if !src.scrape.url.is_empty() {
        dest.scrape.url = src.scrape.url;
    }
    if !src.scrape.table_id.is_empty() {
        dest.scrape.table_id = src.scrape.table_id;
    }
    if !src.scrape.output.is_empty() {
        dest.scrape.output = src.scrape.output;
    }
}

/// Load the scraped neighborhoods artifact into the immutable record
/// set. A missing or broken artifact degrades to an empty set; the site
/// still serves, only the autocomplete has nothing to offer.
pub fn init_neighborhoods(path: &str) -> NeighborhoodSet {
    if path.is_empty() {
        log::warn!("no neighborhoods_file configured, autocomplete is empty");
        return NeighborhoodSet::new(Vec::new());
    }

    match read_neighborhoods(Path::new(path)) {
        Ok(records) => {
            let set = NeighborhoodSet::new(records);
            if set.is_empty() {
                log::warn!("neighborhoods file {} has no records", path);
            } else {
                log::info!("loaded {} neighborhoods from {}", set.len(), path);
            }
            set
        }
        Err(e) => {
            log::warn!(
                "error loading neighborhoods from {}: {}. Run `scrape` to build it.",
                path,
                e
            );
            NeighborhoodSet::new(Vec::new())
        }
    }
}

fn read_neighborhoods(path: &Path) -> Result<Vec<NeighborhoodRecord>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<NeighborhoodRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

/// Initialize site templates from the embedded default theme.
pub fn init_embedded_templates() -> Result<tera::Tera, Box<dyn std::error::Error>> {
    use crate::http::SiteTheme;

    let mut tera = tera::Tera::default();
    tera.autoescape_on(vec![".html"]);

    let mut templates = Vec::new();
    for file in SiteTheme::iter() {
        let path = file.as_ref();
        if path.ends_with(".html") {
            if let Some(content) = SiteTheme::get(path) {
                if let Ok(s) = std::str::from_utf8(&content.data) {
                    templates.push((path.to_string(), s.to_string()));
                }
            }
        }
    }
    // add_raw_templates resolves {% extends %} across the batch.
    tera.add_raw_templates(templates)?;

    Ok(tera)
}

/// Initialize site templates from disk (--site directory).
pub fn init_site_templates(site_dir: &Path) -> Result<tera::Tera, Box<dyn std::error::Error>> {
    let glob = format!("{}/**/*.html", site_dir.display());
    let mut tera = tera::Tera::new(&glob)?;
    tera.autoescape_on(vec![".html"]);
    log::info!("loaded site templates from {}", site_dir.display());
    Ok(tera)
}

/// Load i18n strings from the theme's lang.json.
pub fn load_i18n(
    path: &Path,
) -> Result<std::collections::HashMap<String, String>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    parse_i18n(&content)
}

/// Load i18n strings from the embedded theme's lang.json.
pub fn load_embedded_i18n(
) -> Result<std::collections::HashMap<String, String>, Box<dyn std::error::Error>> {
    use crate::http::SiteTheme;

    let content = SiteTheme::get("lang.json").ok_or("lang.json missing from embedded theme")?;
    parse_i18n(std::str::from_utf8(&content.data)?)
}

fn parse_i18n(
    content: &str,
) -> Result<std::collections::HashMap<String, String>, Box<dyn std::error::Error>> {
    let raw: std::collections::HashMap<String, String> = serde_json::from_str(content)?;
    // Convert keys: "public.noResults" -> "public_noResults" for Tera compatibility.
    let i18n = raw
        .into_iter()
        .map(|(k, v)| (k.replace('.', "_"), v))
        .collect();
    Ok(i18n)
}
