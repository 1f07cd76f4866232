//! CLI smoke check.
//!
//! # Responsibility
//! - Verify `djmanager_core` wiring: config, logging, document store.
//! - Print the core version, schema version, configured write modes and
//!   per-collection document counts.
//!
//! Usage: `djmanager_cli [config.toml]`

use djmanager_core::db::migrations::schema_version;
use djmanager_core::db::{open_db, open_db_in_memory};
use djmanager_core::{
    core_version, init_logging, AlbumRegistrar, Collection, CoreConfig, DeletionConflictResolver,
    RecordStore, SqliteRecordStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("djmanager_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    if config.logging.dir.is_some() {
        init_logging(&config.logging)?;
    }

    let conn = match &config.database.path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteRecordStore::new(&conn);

    let registrar = AlbumRegistrar::from_config(&store, &config);
    let resolver = DeletionConflictResolver::from_config(&store, &config);

    println!("djmanager_core version={}", core_version());
    println!("schema_version={}", schema_version(&conn)?);
    println!(
        "write_mode album_create={:?} album_delete={:?}",
        registrar.write_mode(),
        resolver.write_mode()
    );
    for collection in Collection::ALL {
        println!("{collection} count={}", store.count(collection)?);
    }
    println!("albums listed={}", registrar.list_albums()?.len());
    log::info!("event=cli_smoke module=cli status=ok");
    Ok(())
}
