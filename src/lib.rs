pub mod counting;
pub mod models;
pub mod settings;
pub mod shell;
pub mod source;
pub mod utils;

use std::{io, path::PathBuf};

use anyhow::Result;
use counting::CountingSessionManager;
use settings::SettingsStore;
use shell::CountingShell;
use source::{JsonSessionSource, SessionSource, StubSessionSource};

const SETTINGS_ENV: &str = "INVENTORY_COUNT_SETTINGS";
const SESSION_ENV: &str = "INVENTORY_COUNT_SESSION";
const SESSION_ID_ENV: &str = "INVENTORY_COUNT_SESSION_ID";

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    utils::logging::init();

    log::info!("inventory-count starting up...");

    let settings_path = std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("inventory-count.json"));
    let settings_exists = settings_path.exists();
    let settings_store = SettingsStore::new(settings_path)?;
    let settings = settings_store.counting();
    if !settings_exists {
        // Leave an editable file behind on first run.
        settings_store.update_counting(settings.clone())?;
    }

    let source: Box<dyn SessionSource> = match std::env::var_os(SESSION_ENV) {
        Some(path) => Box::new(JsonSessionSource::new(PathBuf::from(path))),
        None => Box::new(StubSessionSource::new(
            settings.stub_item_count,
            settings.employee_name.clone(),
        )),
    };
    let sector_count_id = std::env::var(SESSION_ID_ENV).ok();
    let (sector_count, items) = source.load(sector_count_id.as_deref())?;

    let mut manager = CountingSessionManager::with_settings(&settings);
    manager.initialize(sector_count, items);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    CountingShell::new(&mut manager, settings).run(stdin.lock(), &mut stdout)
}
