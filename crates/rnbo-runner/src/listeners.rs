//! OSC UDP listener set: persisted in `rnbo-db`, with the two self-loop
//! addresses the control/value ports themselves listen on always rejected.

use rnbo_db::{Db, ListenerEntry, ListenerQuery};
use rnbo_proto::error::ListenerError;

pub const OSCQUERY_CONTROL_PORT: u16 = 1234;
pub const OSCQUERY_VALUE_PORT: u16 = 5678;
const LOOPBACK_HOST: &str = "127.0.0.1";

fn is_self_loop(host: &str, port: u16) -> bool {
    host == LOOPBACK_HOST && (port == OSCQUERY_CONTROL_PORT || port == OSCQUERY_VALUE_PORT)
}

pub fn add(db: &Db, host: &str, port: u16) -> Result<(), ListenerError> {
    if is_self_loop(host, port) {
        return Err(ListenerError::AlreadyRegistered(format!("{host}:{port}")));
    }
    rnbo_db_or_catch_all(ListenerQuery::add(db, host, port))
}

pub fn delete(db: &Db, host: &str, port: u16) -> Result<(), ListenerError> {
    rnbo_db_or_catch_all(ListenerQuery::delete(db, host, port))
}

pub fn clear(db: &Db) -> Result<(), ListenerError> {
    rnbo_db_or_catch_all(ListenerQuery::clear(db))
}

pub fn entries(db: &Db) -> Result<Vec<ListenerEntry>, ListenerError> {
    ListenerQuery::enumerate(db).map_err(|e| {
        log::warn!("listener enumeration failed: {e}");
        ListenerError::NotFound(String::new())
    })
}

fn rnbo_db_or_catch_all(result: Result<(), rnbo_db::DbError>) -> Result<(), ListenerError> {
    result.map_err(|e| {
        log::warn!("listener persistence failed: {e}");
        ListenerError::NotFound(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_loop_addresses_are_rejected() {
        let db = Db::in_memory().unwrap();
        let err = add(&db, "127.0.0.1", OSCQUERY_CONTROL_PORT).unwrap_err();
        assert!(matches!(err, ListenerError::AlreadyRegistered(_)));
        let err = add(&db, "127.0.0.1", OSCQUERY_VALUE_PORT).unwrap_err();
        assert!(matches!(err, ListenerError::AlreadyRegistered(_)));
    }

    #[test]
    fn ordinary_addresses_persist() {
        let db = Db::in_memory().unwrap();
        add(&db, "192.0.2.1", 9000).unwrap();
        let all = entries(&db).unwrap();
        assert_eq!(all, vec![ListenerEntry { host: "192.0.2.1".to_string(), port: 9000 }]);
    }
}
