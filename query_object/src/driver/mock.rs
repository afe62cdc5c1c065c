//! Recording driver for unit tests

use super::{Driver, ExecOutcome, RawRow, Statement};
use crate::errors::DriverError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use type_mapping::Value;

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub connects: usize,
    pub connected: bool,
    pub fail_connect: bool,
    pub executed: Vec<(String, Vec<Value>)>,
    pub responses: VecDeque<ExecOutcome>,
}

/// Driver that records every statement and replays queued responses.
/// With no queued response, fetches return no rows and writes affect one row.
#[derive(Clone, Default)]
pub(crate) struct MockDriver {
    pub state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let driver = Self::new();
        driver.state.lock().unwrap().fail_connect = true;
        driver
    }

    pub fn respond(&self, outcome: ExecOutcome) -> &Self {
        self.state.lock().unwrap().responses.push_back(outcome);
        self
    }

    pub fn respond_rows(&self, rows: Vec<RawRow>) -> &Self {
        self.respond(ExecOutcome::Rows(rows))
    }

    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }
}

/// Build a raw row from `(column, value)` pairs
pub(crate) fn raw_row<V: Into<Value>>(cells: Vec<(&str, V)>) -> RawRow {
    cells
        .into_iter()
        .map(|(column, value)| (column.to_string(), value.into()))
        .collect()
}

impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        if state.fail_connect {
            return Err(DriverError::new("connection refused").with_code("2002"));
        }
        state.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn prepare(&mut self, sql: &str) -> Result<Statement, DriverError> {
        Ok(Statement::new(sql))
    }

    fn execute(&mut self, statement: Statement, fetch: bool) -> Result<ExecOutcome, DriverError> {
        let mut state = self.state.lock().unwrap();
        state
            .executed
            .push((statement.sql().to_string(), statement.values().cloned().collect()));
        Ok(state.responses.pop_front().unwrap_or(if fetch {
            ExecOutcome::Rows(Vec::new())
        } else {
            ExecOutcome::Affected(1)
        }))
    }

    fn query(&mut self, sql: &str) -> Result<ExecOutcome, DriverError> {
        self.execute(Statement::new(sql), super::returns_rows(sql))
    }

    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn last_insert_id(&self) -> Option<i64> {
        None
    }

    fn reset(&mut self) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.close();
        self.connect().is_ok()
    }

    fn close(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        std::mem::replace(&mut state.connected, false)
    }
}
