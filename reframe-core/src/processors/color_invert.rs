//! Color inversion processor.
//!
//! Replaces every channel value `v` with `255 - v`. Needs no model, so it is
//! always available and handy for checking a pipeline end to end.

use std::path::Path;

use super::{Frame, FrameProcessor};
use crate::ProcessingJob;
use crate::discovery::{is_image, is_video};
use crate::status::StatusReporter;

pub const NAME: &str = "color_invert";
pub const SCOPE: &str = "REFRAME.COLOR-INVERT";

#[derive(Debug, Clone, Default)]
pub struct ColorInvert {
    status: StatusReporter,
}

impl ColorInvert {
    pub fn new(status: StatusReporter) -> Self {
        Self { status }
    }
}

impl FrameProcessor for ColorInvert {
    fn name(&self) -> &str {
        NAME
    }

    fn scope(&self) -> &str {
        SCOPE
    }

    fn status(&self) -> &StatusReporter {
        &self.status
    }

    fn pre_check(&self) -> bool {
        true
    }

    fn pre_start(&self, job: &ProcessingJob) -> bool {
        if !is_image(&job.target_path) && !is_video(&job.target_path) {
            self.status.error(SCOPE, "Select an image or video for target path.");
            return false;
        }
        true
    }

    fn process_frame(&self, _source: Option<&Path>, mut frame: Frame) -> anyhow::Result<Frame> {
        image::imageops::invert(&mut frame);
        Ok(frame)
    }
}
