//! Connection: owns one driver and opens its handle on demand.

use crate::builder::Builder;
use crate::driver::{Driver, ExecOutcome, RawRow, SqlxDriver};
use crate::errors::{ConnectionError, QueryError};
use crate::query_builder::{CompiledQuery, Processor};
use crate::relationship::RelationshipBuilder;
use crate::{debug_log, trace_log};
use config::DatabaseConfig;
use std::fmt;
use type_mapping::Value;

pub struct Connection {
    config: DatabaseConfig,
    driver: Box<dyn Driver>,
    processor: Processor,
    connected: bool,
}

impl Connection {
    /// Create a connection using the driver named in the configuration.
    /// Nothing is opened until a handle is needed.
    pub fn new(config: DatabaseConfig) -> Result<Self, ConnectionError> {
        config.validate()?;
        let driver = Box::new(SqlxDriver::new(&config)?);
        Ok(Self::with_driver(config, driver))
    }

    /// Create a connection around any driver implementation
    pub fn with_driver(config: DatabaseConfig, driver: Box<dyn Driver>) -> Self {
        Self {
            processor: Processor::new(config.dialect()),
            config,
            driver,
            connected: false,
        }
    }

    pub fn connect(&mut self) -> Result<(), ConnectionError> {
        debug_log!("Connecting {} driver", self.driver.name());
        self.driver.connect().map_err(ConnectionError::ConnectFailed)?;
        self.connected = true;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Close and reopen the handle. Returns false when there was nothing to
    /// reset or reopening failed.
    pub fn reset(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        debug_log!("Resetting {} connection", self.driver.name());
        let reopened = self.driver.reset();
        self.connected = self.driver.is_connected();
        reopened
    }

    /// Release the handle. Returns false when nothing was open.
    pub fn close(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        debug_log!("Closing {} connection", self.driver.name());
        self.connected = false;
        self.driver.close()
    }

    /// The driver, connecting first if no handle is open
    pub fn driver(&mut self) -> Result<&mut dyn Driver, ConnectionError> {
        if !self.connected {
            self.connect()?;
        }
        Ok(self.driver.as_mut())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Prepare, bind and execute a compiled statement
    pub fn run(&mut self, compiled: CompiledQuery, fetch: bool) -> Result<ExecOutcome, QueryError> {
        let driver = self.driver()?;
        debug_log!("Executing on {}: {}", driver.name(), compiled.sql);
        trace_log!(
            "Binding {} value(s): {:?}",
            compiled.bindings.len(),
            compiled.bindings.iter().map(|v| v.wire_type().name()).collect::<Vec<_>>()
        );

        let statement = driver.prepare(&compiled.sql)?;
        let statement = driver.bind(statement, compiled.bindings);
        Ok(driver.execute(statement, fetch)?)
    }

    /// Run raw SQL with no bindings
    pub fn raw(&mut self, sql: &str) -> Result<ExecOutcome, QueryError> {
        let driver = self.driver()?;
        debug_log!("Executing raw SQL on {}: {}", driver.name(), sql);
        Ok(driver.query(sql)?)
    }

    pub fn select(&mut self, sql: &str, bindings: Vec<Value>) -> Result<Vec<RawRow>, QueryError> {
        let compiled = CompiledQuery {
            sql: sql.to_string(),
            bindings,
        };
        Ok(self.run(compiled, true)?.into_rows())
    }

    /// Run a write statement and return the affected-row count
    pub fn affecting(&mut self, sql: &str, bindings: Vec<Value>) -> Result<u64, QueryError> {
        let compiled = CompiledQuery {
            sql: sql.to_string(),
            bindings,
        };
        Ok(self.run(compiled, false)?.affected())
    }

    pub fn insert(&mut self, sql: &str, bindings: Vec<Value>) -> Result<u64, QueryError> {
        self.affecting(sql, bindings)
    }

    pub fn update(&mut self, sql: &str, bindings: Vec<Value>) -> Result<u64, QueryError> {
        self.affecting(sql, bindings)
    }

    pub fn delete(&mut self, sql: &str, bindings: Vec<Value>) -> Result<u64, QueryError> {
        self.affecting(sql, bindings)
    }

    /// Start a builder on `name`
    pub fn table(&mut self, name: &str) -> Builder<'_> {
        let mut builder = Builder::new(self);
        builder.table(name);
        builder
    }

    pub fn builder(&mut self) -> Builder<'_> {
        Builder::new(self)
    }

    pub fn relationships(&mut self) -> RelationshipBuilder<'_> {
        RelationshipBuilder::new(self)
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.driver.last_insert_id()
    }

    pub fn escape(&self, value: &str) -> String {
        self.driver.escape(value)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver.name())
            .field("database", &self.config.database())
            .field("connected", &self.connected)
            .finish()
    }
}
