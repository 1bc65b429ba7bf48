//! Snapshot decoration: name-pattern classification and manual labels.
//!
//! Thin collaborators of the monitoring pipeline. The classifier assigns a
//! coarse category from the process name; the label store keeps user-applied
//! labels in memory. No core logic depends on either.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Ordered name-pattern rules; first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRule {
    pub category: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    rules: Vec<ClassifyRule>,
}

impl ProcessClassifier {
    pub fn new(rules: Vec<ClassifyRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        for rule in &self.rules {
            if rule
                .patterns
                .iter()
                .any(|p| !p.is_empty() && lower.contains(p.as_str()))
            {
                return rule.category.clone();
            }
        }
        "other".to_string()
    }
}

impl Default for ProcessClassifier {
    fn default() -> Self {
        let rule = |category: &str, patterns: &[&str]| ClassifyRule {
            category: category.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        };
        Self::new(vec![
            rule("system", &["systemd", "kthread", "init", "kworker", "launchd"]),
            rule("shell", &["bash", "zsh", "fish", "tcsh"]),
            rule("browser", &["chrome", "chromium", "firefox", "safari", "edge"]),
            rule("database", &["postgres", "mysql", "redis", "mongod", "sqlite"]),
            rule("devtools", &["cargo", "rustc", "gcc", "clang", "node", "python"]),
        ])
    }
}

/// In-memory store of user-applied labels keyed by pid.
#[derive(Clone, Default)]
pub struct LabelStore {
    inner: Arc<Mutex<HashMap<u32, BTreeSet<String>>>>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, pid: u32, label: &str) {
        let mut table = self.lock();
        table.entry(pid).or_default().insert(label.to_string());
    }

    /// Returns true if the label was present.
    pub fn remove(&self, pid: u32, label: &str) -> bool {
        let mut table = self.lock();
        match table.get_mut(&pid) {
            Some(labels) => {
                let removed = labels.remove(label);
                if labels.is_empty() {
                    table.remove(&pid);
                }
                removed
            }
            None => false,
        }
    }

    /// Labels for `pid`, sorted. A vanished or unlabeled pid yields an
    /// empty list, not an error.
    pub fn get(&self, pid: u32) -> Vec<String> {
        self.lock()
            .get(&pid)
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, BTreeSet<String>>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A scored snapshot entry with classification and manual labels merged in.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub category: String,
    pub anomaly: bool,
    pub score: f64,
    pub reasons: Vec<String>,
    pub manual_labels: Vec<String>,
    pub has_manual_labels: bool,
}
