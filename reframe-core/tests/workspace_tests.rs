//! Tests for the temporary workspace lifecycle.
//!
//! These tests verify:
//! - clean followed by create yields an empty, existing workspace
//! - clean never fails for absent workspaces
//! - keep_frames leaves frames in place
//! - the shared `temp` root is only removed once empty
//! - extracted frames list in numeric order without gaps

mod common;

use std::fs;
use std::sync::Arc;

use common::{FakeTranscoder, create_dummy_file, fake_gateway};
use reframe_core::processing::extract_frames;
use reframe_core::temp_files::{TempWorkspace, workspace_path};
use tempfile::tempdir;

#[test]
fn test_clean_then_create_yields_empty_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let target = dir.path().join("clip.mp4");
    let ws = TempWorkspace::for_target(&target);

    ws.create()?;
    fs::write(ws.path().join("0001.png"), b"stale")?;
    ws.clean(false)?;
    ws.create()?;

    assert!(ws.path().is_dir());
    assert_eq!(fs::read_dir(ws.path())?.count(), 0);
    assert_eq!(ws.path(), workspace_path(&target));
    Ok(())
}

#[test]
fn test_clean_absent_workspace_is_noop() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let ws = TempWorkspace::for_target(&dir.path().join("never.mp4"));
    ws.clean(false)?;
    ws.clean(true)?;
    assert!(!dir.path().join("temp").exists());
    Ok(())
}

#[test]
fn test_keep_frames_preserves_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
    ws.create()?;
    fs::write(ws.path().join("0001.png"), b"frame")?;

    ws.clean(true)?;
    assert!(ws.path().join("0001.png").is_file());
    Ok(())
}

#[test]
fn test_shared_temp_root_removed_only_when_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let first = TempWorkspace::for_target(&dir.path().join("first.mp4"));
    let second = TempWorkspace::for_target(&dir.path().join("second.mp4"));
    first.create()?;
    second.create()?;

    first.clean(false)?;
    assert!(dir.path().join("temp").is_dir());
    assert!(second.path().is_dir());

    second.clean(false)?;
    assert!(!dir.path().join("temp").exists());
    Ok(())
}

#[test]
fn test_extracted_frames_list_in_order_without_gaps() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let target = create_dummy_file(dir.path(), "clip.mp4");
    let fake = Arc::new(FakeTranscoder::new().frames(12));

    extract_frames(&fake_gateway(&fake), &target)?;
    let ws = TempWorkspace::for_target(&target);
    fs::write(ws.path().join("notes.txt"), b"not a frame")?;

    let frames = ws.list_frames()?;
    let names: Vec<String> = frames
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let expected: Vec<String> = (1..=12).map(|i| format!("{i:04}.png")).collect();
    assert_eq!(names, expected);
    Ok(())
}

#[test]
fn test_list_frames_of_missing_workspace_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let ws = TempWorkspace::for_target(&dir.path().join("nothing.mp4"));
    assert!(ws.list_frames()?.is_empty());
    Ok(())
}
