// ============================================================================
// reframe-core/src/processors/face_enhancer.rs
// ============================================================================
//
// FACE ENHANCER: Restores faces found in a frame
//
// The enhancement model itself lives outside this crate behind the
// EnhancementBackend trait. This processor owns its lifecycle:
// - pre_check verifies the model file is on disk (downloading is not our job)
// - the backend is loaded at most once, on first use, by the BackendLoader
// - every call into the backend goes through one mutex, because model
//   instances are generally not safe to drive from several threads
//
// Frames without a detected face pass through unchanged.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use once_cell::sync::OnceCell;

use super::{Frame, FrameProcessor};
use crate::ProcessingJob;
use crate::discovery::{is_image, is_video};
use crate::status::StatusReporter;

pub const NAME: &str = "face_enhancer";
pub const SCOPE: &str = "REFRAME.FACE-ENHANCER";

/// Model file expected inside the models directory.
pub const MODEL_FILE: &str = "GFPGANv1.4.pth";

/// A loaded enhancement model.
pub trait EnhancementBackend: Send {
    /// True if the frame contains at least one face worth enhancing.
    fn detect_face(&mut self, frame: &Frame) -> anyhow::Result<bool>;

    /// Returns the frame with faces restored and pasted back.
    fn enhance(&mut self, frame: Frame) -> anyhow::Result<Frame>;
}

/// Builds a backend from a model file.
pub type BackendLoader =
    Arc<dyn Fn(&Path) -> anyhow::Result<Box<dyn EnhancementBackend>> + Send + Sync>;

/// Wraps a closure as a [`BackendLoader`].
pub fn backend_loader<F>(load: F) -> BackendLoader
where
    F: Fn(&Path) -> anyhow::Result<Box<dyn EnhancementBackend>> + Send + Sync + 'static,
{
    Arc::new(load)
}

pub struct FaceEnhancer {
    model_path: PathBuf,
    loader: BackendLoader,
    backend: OnceCell<Mutex<Box<dyn EnhancementBackend>>>,
    status: StatusReporter,
}

impl fmt::Debug for FaceEnhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceEnhancer")
            .field("model_path", &self.model_path)
            .field("loaded", &self.backend.get().is_some())
            .finish()
    }
}

impl FaceEnhancer {
    pub fn new(model_path: PathBuf, loader: BackendLoader, status: StatusReporter) -> Self {
        Self {
            model_path,
            loader,
            backend: OnceCell::new(),
            status,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.get().is_some()
    }

    fn backend(&self) -> anyhow::Result<&Mutex<Box<dyn EnhancementBackend>>> {
        self.backend.get_or_try_init(|| {
            log::info!("[{SCOPE}] Loading enhancement model from {}", self.model_path.display());
            match (self.loader)(&self.model_path) {
                Ok(backend) => Ok(Mutex::new(backend)),
                Err(e) => {
                    self.status
                        .error(SCOPE, format!("Error initializing enhancement model: {e:#}"));
                    Err(e)
                }
            }
        })
    }
}

impl FrameProcessor for FaceEnhancer {
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
        if !self.model_path.is_file() {
            self.status.error(
                SCOPE,
                format!("Model file not found at {}.", self.model_path.display()),
            );
            return false;
        }
        true
    }

    fn pre_start(&self, job: &ProcessingJob) -> bool {
        if !is_image(&job.target_path) && !is_video(&job.target_path) {
            self.status.error(SCOPE, "Select an image or video for target path.");
            return false;
        }
        true
    }

    fn process_frame(&self, _source: Option<&Path>, frame: Frame) -> anyhow::Result<Frame> {
        let gate = self.backend()?;
        let mut backend = gate
            .lock()
            .map_err(|_| anyhow!("enhancement backend lock poisoned"))?;

        if !backend.detect_face(&frame)? {
            return Ok(frame);
        }
        backend.enhance(frame).inspect_err(|e| {
            self.status.error(SCOPE, format!("Error enhancing face: {e:#}"));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Brightens every pixel of frames whose first pixel is non-black.
    struct Brighten;

    impl EnhancementBackend for Brighten {
        fn detect_face(&mut self, frame: &Frame) -> anyhow::Result<bool> {
            Ok(frame.get_pixel(0, 0) != &Rgb([0, 0, 0]))
        }

        fn enhance(&mut self, mut frame: Frame) -> anyhow::Result<Frame> {
            for pixel in frame.pixels_mut() {
                pixel.0 = pixel.0.map(|v| v.saturating_add(10));
            }
            Ok(frame)
        }
    }

    fn counting_loader(loads: Arc<AtomicUsize>) -> BackendLoader {
        backend_loader(move |_path| {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Brighten) as Box<dyn EnhancementBackend>)
        })
    }

    #[test]
    fn test_backend_loads_once_across_threads() {
        let loads = Arc::new(AtomicUsize::new(0));
        let enhancer = Arc::new(FaceEnhancer::new(
            PathBuf::from("unused.onnx"),
            counting_loader(Arc::clone(&loads)),
            StatusReporter::headless(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let enhancer = Arc::clone(&enhancer);
                std::thread::spawn(move || {
                    let frame = Frame::from_pixel(2, 2, Rgb([100, 100, 100]));
                    enhancer.process_frame(None, frame).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().get_pixel(1, 1), &Rgb([110, 110, 110]));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(enhancer.is_loaded());
    }

    #[test]
    fn test_frame_without_face_passes_through() {
        let enhancer = FaceEnhancer::new(
            PathBuf::from("unused.onnx"),
            counting_loader(Arc::new(AtomicUsize::new(0))),
            StatusReporter::headless(),
        );
        let frame = Frame::from_pixel(2, 2, Rgb([0, 0, 0]));
        let out = enhancer.process_frame(None, frame.clone()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_loader_failure_is_retried_on_next_frame() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let loader = backend_loader(move |_path| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow!("model file is corrupt"))
            } else {
                Ok(Box::new(Brighten) as Box<dyn EnhancementBackend>)
            }
        });
        let enhancer =
            FaceEnhancer::new(PathBuf::from("unused.onnx"), loader, StatusReporter::headless());

        let frame = Frame::from_pixel(1, 1, Rgb([50, 50, 50]));
        assert!(enhancer.process_frame(None, frame.clone()).is_err());
        assert!(!enhancer.is_loaded());
        assert!(enhancer.process_frame(None, frame).is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pre_check_requires_model_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let model = dir.path().join(MODEL_FILE);
        let enhancer = FaceEnhancer::new(
            model.clone(),
            counting_loader(Arc::new(AtomicUsize::new(0))),
            StatusReporter::headless(),
        );
        assert!(!enhancer.pre_check());
        std::fs::write(&model, b"weights")?;
        assert!(enhancer.pre_check());
        assert!(enhancer.pre_check());
        Ok(())
    }
}
