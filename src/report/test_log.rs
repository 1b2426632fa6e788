use crate::error::Result;
use crate::report::StatsSink;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Named series recorded during one simulation run
pub type TestRecord = BTreeMap<String, Vec<Value>>;

/// In-memory statistics log, written out as `{"tests": [ {series...}, ... ]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestLog {
    tests: Vec<TestRecord>,
}

impl TestLog {
    pub fn new() -> TestLog {
        TestLog::default()
    }

    /// Start a new run. Subsequent records go to it.
    pub fn new_test(&mut self) {
        self.tests.push(TestRecord::new());
    }

    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(data: &str) -> Result<TestLog> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn from_path(path: &Path) -> Result<TestLog> {
        let data = fs::read_to_string(path)?;
        TestLog::from_json_str(&data)
    }
}

impl StatsSink for TestLog {
    fn record(&mut self, key: &str, value: Value) {
        if self.tests.is_empty() {
            self.new_test();
        }
        if let Some(test) = self.tests.last_mut() {
            test.entry(key.to_string()).or_default().push(value);
        }
    }
}
