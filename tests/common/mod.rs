#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream, FutureExt, StreamExt};
use tempfile::TempDir;
use zenith_core::{
    coach::{GenerationOptions, GenerationStream, InferenceService},
    core::time::FixedClock,
    errors::InferenceError,
    ledger::{LedgerStore, TransactionDraft},
    storage::{JsonFileStore, KeyValueStore, MemoryStore},
};

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Fresh in-memory ledger whose clock reads `today`.
pub fn memory_ledger(today: NaiveDate) -> (Arc<MemoryStore>, LedgerStore) {
    let storage = Arc::new(MemoryStore::new());
    let mut store = LedgerStore::new(storage.clone(), Arc::new(FixedClock::on(today)));
    store.initialize();
    (storage, store)
}

/// Ledger backed by JSON files in a temp directory; keep the guard alive.
pub fn file_ledger(today: NaiveDate) -> (TempDir, Arc<JsonFileStore>, LedgerStore) {
    let temp = TempDir::new().expect("create temp dir");
    let storage = Arc::new(JsonFileStore::new(temp.path()).expect("create json store"));
    let mut store = LedgerStore::new(storage.clone(), Arc::new(FixedClock::on(today)));
    store.initialize();
    (temp, storage, store)
}

pub fn reopen(storage: Arc<dyn KeyValueStore>, today: NaiveDate) -> LedgerStore {
    let mut store = LedgerStore::new(storage, Arc::new(FixedClock::on(today)));
    store.initialize();
    store
}

pub fn spend(store: &mut LedgerStore, amount: f64, category: &str, item: &str, on: NaiveDate) {
    store
        .add(TransactionDraft::new(amount, category, item).on(on))
        .expect("add transaction");
}

/// One scripted generation outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Tokens(Vec<String>),
    /// `generate_stream` itself fails.
    Refuse(String),
    /// Tokens arrive, then the completion handle fails.
    Break(Vec<String>, String),
}

impl Scripted {
    pub fn text(text: &str) -> Self {
        Scripted::Tokens(
            text.split_inclusive(' ')
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Inference double that replays queued outcomes and records every call.
#[derive(Default)]
pub struct ScriptedInference {
    loaded: AtomicBool,
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInference {
    pub fn loaded() -> Arc<Self> {
        let double = Self::default();
        double.loaded.store(true, Ordering::SeqCst);
        Arc::new(double)
    }

    pub fn unloaded() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: Scripted) {
        self.script.lock().expect("script lock").push_back(outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    fn is_model_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load_model(&self, name: &str) -> Result<(), InferenceError> {
        if name.is_empty() {
            return Err(InferenceError::UnknownModel(name.to_string()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<GenerationStream, InferenceError> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            prompt: prompt.to_string(),
            options,
        });
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Scripted::Tokens(Vec::new()));
        match next {
            Scripted::Tokens(tokens) => Ok(GenerationStream::ready(tokens)),
            Scripted::Refuse(message) => Err(InferenceError::Stream(message)),
            Scripted::Break(tokens, message) => Ok(GenerationStream::new(
                stream::iter(tokens).boxed(),
                async move { Err(InferenceError::Stream(message)) }.boxed(),
            )),
        }
    }
}
