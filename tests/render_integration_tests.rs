//! Integration tests for RenderAdapter
//!
//! These tests verify:
//! - Preview requests made before the engine loads are applied on resume
//! - Downloads export at full resolution and restore the preview

mod common;

use camino::Utf8PathBuf;
use common::FakeEngine;
use qrypt::models::{ExportSize, StyleState};
use qrypt::services::{Container, EngineHandle, EnsureOutcome, ImageFormat, RenderAdapter};
use tempfile::TempDir;

#[test]
fn test_deferred_until_engine_installed() {
    let handle = EngineHandle::new();
    let mut adapter = RenderAdapter::new(handle.clone());

    let style = StyleState::default();
    assert_eq!(
        adapter.ensure("https://first.com", &style, None).unwrap(),
        EnsureOutcome::Deferred
    );
    assert_eq!(
        adapter.ensure("https://second.com", &style, None).unwrap(),
        EnsureOutcome::Deferred
    );
    assert_eq!(adapter.resume().unwrap(), None);

    let (engine, journal) = FakeEngine::new();
    handle.install(engine);

    assert_eq!(adapter.resume().unwrap(), Some(EnsureOutcome::Created));
    assert!(!adapter.has_pending());
    assert_eq!(journal.constructed(), 1);
    assert_eq!(journal.attached(), [Container::Preview]);
    assert_eq!(
        adapter.preview_options().map(|o| o.data.as_str()),
        Some("https://second.com")
    );
}

#[test]
fn test_download_writes_full_resolution_file() {
    let temp_dir = TempDir::new().unwrap();
    let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

    let (engine, journal) = FakeEngine::new();
    let mut adapter = RenderAdapter::new(EngineHandle::with_engine(engine));
    adapter
        .ensure("https://a.com", &StyleState::default(), None)
        .unwrap();

    let path = adapter
        .download(ImageFormat::Png, ExportSize::new(1024).unwrap(), &dir, "qr-code")
        .unwrap();

    assert_eq!(path, dir.join("qr-code.png"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "png:1024:https://a.com");

    // Export options, then the preview restored
    let updates = journal.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!((updates[0].width, updates[0].image_margin), (1024, 20));
    assert_eq!((updates[1].width, updates[1].image_margin), (300, 5));
}

#[test]
fn test_drop_detaches_preview() {
    let (engine, journal) = FakeEngine::new();
    {
        let mut adapter = RenderAdapter::new(EngineHandle::with_engine(engine));
        adapter
            .ensure("https://a.com", &StyleState::default(), None)
            .unwrap();
        assert!(adapter.is_attached());
    }

    assert_eq!(journal.detached(), 1);
}
