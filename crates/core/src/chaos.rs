use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deterministic fault switches. Enabling one guarantees the corresponding
/// stage fails on its very next invocation and every one after, until the
/// fault is cleared. Nothing here is probabilistic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    ClassifierFailure,
    RouterFailure,
    DatabaseError,
    Timeout,
}

impl Fault {
    pub const ALL: [Fault; 4] =
        [Fault::ClassifierFailure, Fault::RouterFailure, Fault::DatabaseError, Fault::Timeout];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifierFailure => "classifier_failure",
            Self::RouterFailure => "router_failure",
            Self::DatabaseError => "database_error",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Fault {
    type Err = UnknownFault;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classifier_failure" => Ok(Self::ClassifierFailure),
            "router_failure" => Ok(Self::RouterFailure),
            "database_error" => Ok(Self::DatabaseError),
            "timeout" => Ok(Self::Timeout),
            other => Err(UnknownFault(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown fault name `{0}` (expected classifier_failure|router_failure|database_error|timeout)")]
pub struct UnknownFault(pub String);

/// Raised by a chaos check when the queried fault is switched on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("chaos fault `{fault}` is enabled")]
pub struct ChaosInjectedFailure {
    pub fault: Fault,
}

/// Process-wide fault configuration, mutated only through the administrative
/// surface. Pure state: checks never fail themselves.
#[derive(Debug, Default)]
pub struct ChaosController {
    enabled: Mutex<BTreeSet<Fault>>,
}

impl ChaosController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fault(&self, fault: Fault, enabled: bool) {
        let mut faults = match self.enabled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if enabled {
            faults.insert(fault);
        } else {
            faults.remove(&fault);
        }
    }

    pub fn is_fault_enabled(&self, fault: Fault) -> bool {
        match self.enabled.lock() {
            Ok(guard) => guard.contains(&fault),
            Err(poisoned) => poisoned.into_inner().contains(&fault),
        }
    }

    /// Immutable copy taken once at the start of each `process` call. A single
    /// message's run stays consistent even if an administrative call flips
    /// faults concurrently.
    pub fn snapshot(&self) -> ChaosSnapshot {
        let faults = match self.enabled.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        ChaosSnapshot { enabled: faults }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChaosSnapshot {
    enabled: BTreeSet<Fault>,
}

impl ChaosSnapshot {
    pub fn is_enabled(&self, fault: Fault) -> bool {
        self.enabled.contains(&fault)
    }

    pub fn check(&self, fault: Fault) -> Result<(), ChaosInjectedFailure> {
        if self.enabled.contains(&fault) {
            return Err(ChaosInjectedFailure { fault });
        }
        Ok(())
    }
}
