//! Unit tests for Engine
//!
//! Tests the global logger API and the FrameDriver that the winit host wraps.
//!
//! LOGGER is a global OnceLock shared across all tests, so tests that replace
//! it are marked with #[serial].

use crate::ember3d::{Application, Engine, EngineConfig, Error, FrameDriver, Result};
use crate::ember3d::log::{Logger, LogEntry, LogSeverity};
use crate::gpu::MockGpuContext;
use crate::graphics::{FrameTime, GraphicsManager};
use crate::scene::{Camera3D, Node, Scene, Transform3D};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Captures entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });
    entries
}

/// Camera-only scene, records every update
#[derive(Default)]
struct Recorder {
    setups: usize,
    updates: Vec<FrameTime>,
    fail_setup: bool,
}

impl Application for Recorder {
    fn setup(&mut self, _graphics: &mut GraphicsManager, scene: &mut Scene) -> Result<()> {
        self.setups += 1;
        if self.fail_setup {
            return Err(Error::InitializationFailed("assets missing".to_string()));
        }
        let root = scene.add_root(Node::new("root"));
        let camera = scene.add_node(Node::camera("camera", Camera3D::default(), Transform3D::IDENTITY));
        scene.push_child(root, camera)?;
        scene.set_main_camera(camera)
    }

    fn update(&mut self, _scene: &mut Scene, frame: &FrameTime) {
        self.updates.push(*frame);
    }
}

// ============================================================================
// LOGGER API TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_custom_logger() {
    let entries = capture();

    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    Engine::log(LogSeverity::Warn, "test", "Message 2".to_string());

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].severity, LogSeverity::Warn);
    assert!(entries[0].file.is_none());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = capture();

    Engine::log_detailed(LogSeverity::Error, "ember3d::Scene", "boom".to_string(), "scene.rs", 42);

    let entries = entries.lock().unwrap();
    assert_eq!(entries[0].source, "ember3d::Scene");
    assert_eq!(entries[0].file, Some("scene.rs"));
    assert_eq!(entries[0].line, Some(42));
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let entries = capture();
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, "test", "to console".to_string());

    assert!(entries.lock().unwrap().is_empty());
}

// ============================================================================
// FRAME DRIVER TESTS
// ============================================================================

#[test]
fn test_driver_runs_setup_once() {
    let driver = FrameDriver::new(
        Box::new(MockGpuContext::new()),
        &EngineConfig::default(),
        Recorder::default(),
    )
    .unwrap();

    assert_eq!(driver.app().setups, 1);
    assert_eq!(driver.scene().name(), "ember3d");
    assert!(driver.scene().main_camera().is_some());
}

#[test]
fn test_driver_setup_error_propagates() {
    let app = Recorder { fail_setup: true, ..Recorder::default() };

    let result = FrameDriver::new(Box::new(MockGpuContext::new()), &EngineConfig::default(), app);

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_driver_updates_each_frame_with_clamped_delta() {
    let config = EngineConfig::default().with_title("clock");
    let mut driver = FrameDriver::new(Box::new(MockGpuContext::new()), &config, Recorder::default()).unwrap();

    driver.frame(1.0).unwrap();
    driver.frame(1.016).unwrap();
    driver.frame(30.0).unwrap();

    let updates = &driver.app().updates;
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].dt, 0.0);
    assert!((updates[1].dt - 0.016).abs() < 1e-4);
    assert_eq!(updates[2].dt, config.graphics.max_delta_time);
    assert_eq!(updates[2].frame_index, 2);
}
