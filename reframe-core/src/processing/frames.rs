//! Frame extraction and video assembly.
//!
//! Both directions go through ffmpeg with argument lists fixed here. Frames
//! are always written as 8-bit RGB PNGs named by the workspace frame
//! pattern; assembly always converts back with a BT.601 to BT.709 colorspace
//! pass so the output does not come out washed out.

use std::path::Path;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::Gateway;
use crate::status::SCOPE_CORE;
use crate::temp_files::TempWorkspace;

/// Pixel format frames are decoded into.
pub const EXTRACT_PIX_FMT: &str = "rgb24";

/// Pixel format of the assembled video.
pub const OUTPUT_PIX_FMT: &str = "yuv420p";

/// Colorspace normalization applied during assembly. Not configurable.
pub const COLORSPACE_FILTER: &str = "colorspace=bt709:iall=bt601-6-625:fast=1";

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// ffmpeg arguments (after the fixed prefix) that decode `target` into the
/// workspace frame sequence.
pub fn extract_args(target: &Path, workspace: &TempWorkspace) -> Vec<String> {
    vec![
        "-i".to_string(),
        path_arg(target),
        "-pix_fmt".to_string(),
        EXTRACT_PIX_FMT.to_string(),
        path_arg(&workspace.frame_pattern()),
    ]
}

/// ffmpeg arguments (after the fixed prefix) that encode the workspace frame
/// sequence into the temporary output at `fps`.
pub fn create_video_args(config: &CoreConfig, workspace: &TempWorkspace, fps: f64) -> Vec<String> {
    vec![
        "-r".to_string(),
        fps.to_string(),
        "-i".to_string(),
        path_arg(&workspace.frame_pattern()),
        "-c:v".to_string(),
        config.video_encoder.clone(),
        "-crf".to_string(),
        config.video_quality.to_string(),
        "-pix_fmt".to_string(),
        OUTPUT_PIX_FMT.to_string(),
        "-vf".to_string(),
        COLORSPACE_FILTER.to_string(),
        "-y".to_string(),
        path_arg(&workspace.temp_output_path()),
    ]
}

/// Creates the workspace for `target` and decodes every frame into it.
pub fn extract_frames(gateway: &Gateway, target: &Path) -> CoreResult<()> {
    let workspace = TempWorkspace::for_target(target);
    workspace.create()?;

    gateway
        .status()
        .update(SCOPE_CORE, "Extracting frames...");
    if !gateway.run_transcode(&extract_args(target, &workspace)) {
        return Err(CoreError::FrameExtraction(target.to_path_buf()));
    }
    Ok(())
}

/// Encodes the processed frames of `target` into the workspace's temporary
/// video at `fps`, using the configured encoder and quality.
pub fn create_video(
    gateway: &Gateway,
    config: &CoreConfig,
    target: &Path,
    fps: f64,
) -> CoreResult<()> {
    let workspace = TempWorkspace::for_target(target);
    gateway
        .status()
        .update(SCOPE_CORE, format!("Creating video with {fps} fps..."));
    if !gateway.run_transcode(&create_video_args(config, &workspace, fps)) {
        return Err(CoreError::VideoAssembly(workspace.temp_output_path()));
    }
    Ok(())
}
