//! Reads command lines off stdin onto a queue, dispatches each by method
//! name, and writes every response as one line of JSON on stdout. Between
//! commands, ticks the controller so config flush, instance event drain,
//! and the compile-outcome poll keep running even when the queue is idle.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rnbo_proto::command::{CommandRequest, CommandResponse, INTERNAL_ID};
use rnbo_proto::error::DISPATCH_CATCH_ALL_CODE;
use rnbo_proto::queue::Queue;
use rnbo_tree::{AccessMode, ParamValue};
use serde_json::Value;

use crate::controller::Controller;
use crate::error::CommandError;

const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Every non-internal response gets written here instead of stdout.
const RESPONSE_NODE: &str = "/rnbo/resp";

type HandlerFn = fn(&Controller, Value) -> Result<Value, CommandError>;

/// Built once, on first use: method name -> handler. A plain `match` would
/// do the same job, but this is the shape `Controller::registerCommands`'s
/// handler map takes in the original, so we keep it.
fn handlers() -> &'static HashMap<&'static str, HandlerFn> {
    static HANDLERS: OnceLock<HashMap<&'static str, HandlerFn>> = OnceLock::new();
    HANDLERS.get_or_init(|| {
        let mut m: HashMap<&'static str, HandlerFn> = HashMap::new();
        m.insert("activate_audio", Controller::activate_audio);
        m.insert("restart_audio", Controller::restart_audio);
        m.insert("compile", Controller::compile);
        m.insert("compile_cancel", Controller::compile_cancel);
        m.insert("instance_load", Controller::instance_load);
        m.insert("instance_unload", Controller::instance_unload);
        m.insert("patcher_rename", Controller::patcher_rename);
        m.insert("patcher_destroy", Controller::patcher_destroy);
        m.insert("instance_set_save", Controller::instance_set_save);
        m.insert("instance_set_load", Controller::instance_set_load);
        m.insert("instance_set_delete", Controller::instance_set_delete);
        m.insert("instance_set_rename", Controller::instance_set_rename);
        m.insert("instance_set_initial", Controller::instance_set_initial);
        m.insert("instance_set_preset_save", Controller::instance_set_preset_save);
        m.insert("instance_set_preset_load", Controller::instance_set_preset_load);
        m.insert("instance_set_preset_delete", Controller::instance_set_preset_delete);
        m.insert("instance_set_preset_rename", Controller::instance_set_preset_rename);
        m.insert("instance_set_view_create", Controller::instance_set_view_create);
        m.insert("instance_set_view_destroy", Controller::instance_set_view_destroy);
        m.insert("instance_set_view_order", Controller::instance_set_view_order);
        m.insert("file_write", Controller::file_write);
        m.insert("file_write_extended", Controller::file_write_extended);
        m.insert("file_read", Controller::file_read);
        m.insert("file_read64", Controller::file_read64);
        m.insert("file_delete", Controller::file_delete);
        m.insert("file_exists", Controller::file_exists);
        m.insert("package_create", Controller::package_create);
        m.insert("package_install", Controller::package_install);
        m.insert("listener_add", Controller::listener_add);
        m.insert("listener_del", Controller::listener_del);
        m.insert("listener_clear", Controller::listener_clear);
        m.insert("install", Controller::install);
        m.insert("update_check", Controller::update_check);
        m
    })
}

pub struct Dispatcher {
    controller: Arc<Controller>,
    incoming: Arc<Queue<String>>,
}

impl Dispatcher {
    pub fn new(controller: Arc<Controller>) -> Self {
        controller.tree.build_branch("/rnbo", |b| {
            b.add_param("resp", rnbo_tree::Parameter::new(AccessMode::Get, ParamValue::String(String::new())));
        });
        Self {
            controller,
            incoming: Arc::new(Queue::new()),
        }
    }

    /// Spawns the thread that turns stdin lines into queue entries. Runs for
    /// the life of the process; a closed stdin just stops feeding the queue.
    pub fn spawn_stdin_reader(&self) {
        let incoming = self.incoming.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) if !line.trim().is_empty() => incoming.push(line),
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("stdin closed: {e}");
                        break;
                    }
                }
            }
        });
    }

    /// The control-thread loop: pop a command (if any arrived within the
    /// tick interval), dispatch it, then tick the controller and echo any
    /// internal-id response it produced. Runs until `running` is cleared.
    pub fn run(&self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            if let Some(line) = self.incoming.pop_timeout(TICK_INTERVAL) {
                self.handle_line(&line);
            }
            if let Some(response) = self.controller.tick() {
                write_response(&self.controller, &response);
            }
        }
    }

    fn handle_line(&self, line: &str) {
        let request = match CommandRequest::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("malformed command line: {e}");
                write_response(&self.controller, &CommandResponse::error("", DISPATCH_CATCH_ALL_CODE, format!("malformed command: {e}")));
                return;
            }
        };
        let response = match dispatch(&self.controller, &request.method, request.params) {
            Ok(value) => CommandResponse::result(request.id, value),
            Err(e) => CommandResponse::error(request.id, e.code(), e.to_string()),
        };
        write_response(&self.controller, &response);
    }
}

/// Internal-id responses (self-issued, e.g. a finished compile job) are
/// echoed to stdout; everything else is written to the response node for
/// peers watching the tree to pick up.
fn write_response(controller: &Controller, response: &CommandResponse) {
    if response.id() == INTERNAL_ID {
        println!("{}", response.to_json_string());
        let _ = io::stdout().flush();
    } else {
        controller.tree.set_value(RESPONSE_NODE, ParamValue::String(response.to_json_string()));
    }
}

fn dispatch(controller: &Controller, method: &str, params: Value) -> Result<Value, CommandError> {
    match handlers().get(method) {
        Some(handler) => handler(controller, params),
        None => Err(CommandError::Other(format!("unknown method: {method}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnbo_config::ConfigStore;
    use rnbo_db::Db;
    use rnbo_tree::{LoggingTransport, Tree};
    use rnbo_update::local::LocalUpdatePeer;
    use rnbo_update::mirror::UpdateMirror;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn test_controller() -> Controller {
        let db = Db::in_memory().unwrap();
        let config = ConfigStore::open(std::env::temp_dir().join("rnbo-dispatcher-test-config.json"));
        let tree = Arc::new(Tree::new(Arc::new(LoggingTransport)));
        let peer: Arc<dyn rnbo_update::peer::UpdatePeer> = Arc::new(LocalUpdatePeer::new());
        let update = UpdateMirror::new(tree.clone(), peer, "/rnbo/update");
        Controller::new(
            db,
            config,
            tree,
            update,
            "1.3.0",
            "1.0.0",
            "x86_64-linux-gcc-12",
            PathBuf::from("/tmp/rnbo-test/libs"),
            PathBuf::from("/tmp/rnbo-test/src"),
            PathBuf::from("/tmp/rnbo-test/data"),
            PathBuf::from("/tmp/rnbo-test/saves"),
            PathBuf::from("/tmp/rnbo-test/packages"),
            PathBuf::from("/tmp/rnbo-test/cache"),
        )
    }

    #[test]
    fn unknown_method_reports_catch_all_error() {
        let controller = test_controller();
        let err = dispatch(&controller, "not_a_real_method", serde_json::json!({})).unwrap_err();
        assert_eq!(err.code(), DISPATCH_CATCH_ALL_CODE);
    }

    #[test]
    fn listener_clear_dispatches_to_the_controller() {
        let controller = test_controller();
        let result = dispatch(&controller, "listener_clear", serde_json::json!({})).unwrap();
        assert_eq!(result, serde_json::json!({}));
    }

    #[test]
    fn non_internal_response_is_written_to_the_response_node_not_stdout() {
        let controller = Arc::new(test_controller());
        let dispatcher = Dispatcher::new(controller.clone());
        dispatcher.handle_line(r#"{"id":"42","method":"listener_clear","params":{}}"#);
        let written = controller.tree.get_value(RESPONSE_NODE).unwrap();
        match written {
            ParamValue::String(s) => assert!(s.contains(r#""id":"42""#)),
            other => panic!("expected a string node, got {other:?}"),
        }
    }
}
