mod cli;
mod controller;
mod dispatcher;
mod error;
mod listeners;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use rnbo_config::{keys, paths, ConfigStore};
use rnbo_db::Db;
use rnbo_tree::{LoggingTransport, Tree};
use rnbo_update::local::LocalUpdatePeer;
use rnbo_update::mirror::UpdateMirror;
use rnbo_update::peer::UpdatePeer;

use cli::Cli;
use controller::Controller;
use dispatcher::Dispatcher;

const RUNNER_VERSION: &str = env!("CARGO_PKG_VERSION");
const RNBO_VERSION: &str = "1.3.0";

fn default_patcher_lib_dir() -> PathBuf {
    paths::default_config_path().parent().unwrap().join("lib")
}

fn default_package_dir() -> PathBuf {
    paths::default_config_path().parent().unwrap().join("packages")
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    log::info!("rnbo-runner starting up");

    let config = ConfigStore::open_default();

    let db_path = config.get_str(keys::DB_PATH).map(PathBuf::from).unwrap_or_else(paths::default_db_path);
    let db = Db::open(&db_path).unwrap_or_else(|e| {
        log::error!("failed to open database at {db_path:?}: {e}");
        std::process::exit(1);
    });

    let source_dir = config.get_str(keys::SOURCE_CACHE_DIR).map(PathBuf::from).unwrap_or_else(paths::default_source_cache_dir);
    let compile_cache_dir = config
        .get_str(keys::COMPILE_CACHE_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(paths::default_compile_cache_dir);
    let datafile_dir = config.get_str(keys::DATA_FILE_DIR).map(PathBuf::from).unwrap_or_else(paths::default_datafile_dir);
    let save_dir = config.get_str(keys::SAVE_DIR).map(PathBuf::from).unwrap_or_else(paths::default_save_dir);
    let patcher_lib_dir = default_patcher_lib_dir();
    let package_dir = default_package_dir();

    for dir in [&source_dir, &compile_cache_dir, &datafile_dir, &save_dir, &patcher_lib_dir, &package_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::warn!("failed to create directory {dir:?}: {e}");
        }
    }

    let system_id = rnbo_config::get_or_create_system_id(&paths::default_system_id_path()).unwrap_or_else(|e| {
        log::warn!("failed to establish a system id: {e}");
        uuid::Uuid::nil()
    });
    log::info!("system id: {system_id}");

    let target_id = rnbo_package::target_id(std::env::consts::ARCH, std::env::consts::OS, "rustc", "stable");

    let tree = Arc::new(Tree::new(Arc::new(LoggingTransport)));
    let peer: Arc<dyn UpdatePeer> = Arc::new(LocalUpdatePeer::new());
    let update = UpdateMirror::new(tree.clone(), peer, "/rnbo/update");

    let controller = Arc::new(Controller::new(
        db,
        config,
        tree,
        update,
        RNBO_VERSION,
        RUNNER_VERSION,
        target_id,
        patcher_lib_dir,
        source_dir,
        datafile_dir,
        save_dir,
        package_dir,
        compile_cache_dir,
    ));

    if let Some(file) = &cli.file {
        let name = file.file_stem().and_then(|s| s.to_str()).unwrap_or("patcher").to_string();
        match controller.instance_load(serde_json::json!({ "name": name, "index": null })) {
            Ok(_) => log::info!("preloaded patcher {name} from {file:?}"),
            Err(e) => log::warn!("failed to preload {file:?}: {e}"),
        }
    }

    // Held for the life of the process: dropping it would unregister the
    // introspection client from JACK.
    let _info_client = match rnbo_audio::register_info_client() {
        Ok(client) => {
            log::info!("audio info client registered");
            if let Err(e) = controller.activate_audio(serde_json::Value::Null) {
                log::warn!("audio activation failed: {e}");
            }
            Some(client)
        }
        Err(e) => {
            log::warn!("JACK server unavailable, running without audio: {e}");
            None
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            log::warn!("failed to install SIGINT handler: {e}");
        }
    }

    let dispatcher = Dispatcher::new(controller);
    dispatcher.spawn_stdin_reader();

    if !cli.quiet {
        log::info!("rnbo-runner ready, reading commands from stdin");
    }
    dispatcher.run(&running);

    log::info!("rnbo-runner shutting down");
}
