//! Process-wide connection registry
//!
//! Connections are registered under a name and shared as
//! `Arc<Mutex<Connection>>`. Removing or clearing closes the handles.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use config::{AppConfig, DatabaseConfig};
use query_object::{Connection, ConnectionError};

use crate::debug_log;

/// A registered connection, shared between callers
pub type SharedConnection = Arc<Mutex<Connection>>;

static REGISTRY: LazyLock<Mutex<HashMap<String, SharedConnection>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Name-keyed registry of connections
pub struct Connections;

impl Connections {
    fn registry() -> MutexGuard<'static, HashMap<String, SharedConnection>> {
        REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build a connection from `config` and register it under `name`
    pub fn add_connection(config: DatabaseConfig, name: &str) -> Result<SharedConnection, ConnectionError> {
        if Self::contains(name) {
            return Err(ConnectionError::AlreadyRegistered(name.to_string()));
        }
        Self::add(name, Connection::new(config)?)
    }

    /// Register an existing connection under `name`
    pub fn add(name: &str, connection: Connection) -> Result<SharedConnection, ConnectionError> {
        let mut registry = Self::registry();
        if registry.contains_key(name) {
            return Err(ConnectionError::AlreadyRegistered(name.to_string()));
        }

        debug_log!("Registering connection {}", name);
        let shared = Arc::new(Mutex::new(connection));
        registry.insert(name.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Register every connection of an application config under its key.
    ///
    /// All or nothing: on failure the connections registered by this call are
    /// removed and closed again.
    pub fn register_all(config: &AppConfig) -> Result<Vec<String>, ConnectionError> {
        let mut names: Vec<&String> = config.connections.keys().collect();
        names.sort();

        let mut registered: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let Some(database) = config.connection(name) else {
                continue;
            };
            if let Err(err) = Self::add_connection(database.clone(), name) {
                debug_log!(
                    "Registering {} failed, rolling back {} connections",
                    name,
                    registered.len()
                );
                for added in &registered {
                    if let Some(connection) = Self::registry().remove(added) {
                        close(&connection);
                    }
                }
                return Err(err);
            }
            registered.push(name.clone());
        }
        Ok(registered)
    }

    pub fn connection(name: &str) -> Result<SharedConnection, ConnectionError> {
        Self::registry()
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::NotRegistered(name.to_string()))
    }

    pub fn contains(name: &str) -> bool {
        Self::registry().contains_key(name)
    }

    /// Unregister `name` and close its handle
    pub fn remove(name: &str) -> Result<(), ConnectionError> {
        let connection = Self::registry()
            .remove(name)
            .ok_or_else(|| ConnectionError::NotRegistered(name.to_string()))?;

        debug_log!("Removing connection {}", name);
        close(&connection);
        Ok(())
    }

    /// Registered names, sorted
    pub fn names() -> Vec<String> {
        let mut names: Vec<String> = Self::registry().keys().cloned().collect();
        names.sort();
        names
    }

    /// Close and unregister everything
    pub fn clear() {
        let drained: Vec<(String, SharedConnection)> = Self::registry().drain().collect();
        for (_name, connection) in drained {
            debug_log!("Removing connection {}", _name);
            close(&connection);
        }
    }
}

fn close(connection: &SharedConnection) {
    connection
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .close();
}
