// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable artifact producer for deterministic testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use keeper_core::{ArtifactProducer, Category, KeeperError, ProduceRequest};
use tokio::sync::Mutex;

use crate::mock_store::MemoryStore;

#[derive(Default)]
struct Script {
    failing_units: HashSet<String>,
    omitted: HashMap<String, HashSet<Category>>,
    calls: Vec<ProduceRequest>,
}

/// A producer that "writes" requested artifacts into a [`MemoryStore`].
///
/// Units can be scripted to fail outright, or to report success while
/// leaving out one category.
#[derive(Clone)]
pub struct MockProducer {
    store: MemoryStore,
    script: Arc<Mutex<Script>>,
}

impl MockProducer {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Make every run for `unit` exit unsuccessfully.
    pub async fn fail_unit(&self, unit: &str) {
        self.script.lock().await.failing_units.insert(unit.to_string());
    }

    /// Report success for `unit` without writing its `category` artifact.
    pub async fn omit_category(&self, unit: &str, category: Category) {
        self.script
            .lock()
            .await
            .omitted
            .entry(unit.to_string())
            .or_default()
            .insert(category);
    }

    /// Requests received so far, in call order.
    pub async fn calls(&self) -> Vec<ProduceRequest> {
        self.script.lock().await.calls.clone()
    }

    /// Unit names received so far, in call order.
    pub async fn called_units(&self) -> Vec<String> {
        self.script
            .lock()
            .await
            .calls
            .iter()
            .map(|r| r.unit.name().to_string())
            .collect()
    }
}

#[async_trait]
impl ArtifactProducer for MockProducer {
    async fn produce(&self, request: &ProduceRequest) -> Result<(), KeeperError> {
        let mut script = self.script.lock().await;
        script.calls.push(request.clone());

        let unit = request.unit.name();
        if script.failing_units.contains(unit) {
            return Err(KeeperError::Producer {
                unit: unit.to_string(),
                message: "exit code 1: scripted failure".to_string(),
            });
        }

        let omitted = script.omitted.get(unit);
        for artifact in [&request.application, &request.database] {
            if omitted.is_some_and(|cats| cats.contains(&artifact.category)) {
                continue;
            }
            self.store.insert(artifact.clone());
        }
        Ok(())
    }
}
