//! Scripted rendering engine shared by the integration tests.
//!
//! Encoded output is `<ext>:<size>:<data>` so tests can check what was drawn.

#![allow(dead_code)]

use qrypt::services::{
    Container, ImageFormat, RenderEngine, RenderError, RenderInstance, RenderOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the fake engine was asked to do
#[derive(Debug, Default)]
pub struct Journal {
    pub constructed: AtomicUsize,
    pub detached: AtomicUsize,
    pub attached: Mutex<Vec<Container>>,
    pub updates: Mutex<Vec<RenderOptions>>,
}

impl Journal {
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub fn detached(&self) -> usize {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn attached(&self) -> Vec<Container> {
        self.attached.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<RenderOptions> {
        self.updates.lock().unwrap().clone()
    }
}

pub struct FakeEngine {
    journal: Arc<Journal>,
    /// Payloads containing this text fail at export
    fail_on: Option<String>,
}

impl FakeEngine {
    pub fn new() -> (Arc<Self>, Arc<Journal>) {
        Self::failing_on(None)
    }

    pub fn failing_on(fail_on: Option<&str>) -> (Arc<Self>, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let engine = Arc::new(Self {
            journal: journal.clone(),
            fail_on: fail_on.map(str::to_string),
        });
        (engine, journal)
    }
}

impl RenderEngine for FakeEngine {
    fn construct(&self, options: &RenderOptions) -> Result<Box<dyn RenderInstance>, RenderError> {
        self.journal.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeInstance {
            options: options.clone(),
            journal: self.journal.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

struct FakeInstance {
    options: RenderOptions,
    journal: Arc<Journal>,
    fail_on: Option<String>,
}

impl RenderInstance for FakeInstance {
    fn update(&mut self, options: &RenderOptions) -> Result<(), RenderError> {
        self.journal.updates.lock().unwrap().push(options.clone());
        self.options = options.clone();
        Ok(())
    }

    fn append(&mut self, container: Container) -> Result<(), RenderError> {
        self.journal.attached.lock().unwrap().push(container);
        Ok(())
    }

    fn detach(&mut self) {
        self.journal.detached.fetch_add(1, Ordering::SeqCst);
    }

    fn raw_data(&mut self, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
        if let Some(needle) = &self.fail_on {
            if self.options.data.contains(needle.as_str()) {
                return Err(RenderError::Engine(format!("cannot encode {}", self.options.data)));
            }
        }

        let encoded = format!(
            "{}:{}:{}",
            format.extension(),
            self.options.width,
            self.options.data
        );
        Ok(encoded.into_bytes())
    }
}
