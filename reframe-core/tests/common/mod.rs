// reframe-core/tests/common/mod.rs

// --- Shared test infrastructure ---
//
// FakeTranscoder stands in for ffmpeg and the ffprobe crate. It recognizes the three ffmpeg
// invocations the pipeline makes and emulates them on the filesystem:
// - extraction (`-pix_fmt rgb24`): writes synthetic PNG frames
// - assembly (`-r <fps> ... -crf`): concatenates the raw RGB bytes of every
//   frame into the temporary output
// - remux (`-c:v copy`): copies the temporary output to the final path
//
// Every call is recorded so tests can assert on argument lists.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use reframe_core::error::{CoreError, CoreResult};
use reframe_core::util::CommandOutput;
use reframe_core::{Gateway, StatusReporter, Transcoder};

pub const FRAME_WIDTH: u32 = 8;
pub const FRAME_HEIGHT: u32 = 6;
pub const FRAME_BYTES: usize = (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize;

/// Deterministic, distinct content for frame `index` (1-based). The blue
/// channel of every pixel carries the index.
pub fn synthetic_frame(index: u32) -> RgbImage {
    RgbImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
        Rgb([
            ((index * 13 + x * 17) % 256) as u8,
            ((index * 29 + y * 11) % 256) as u8,
            (index % 256) as u8,
        ])
    })
}

/// Splits an assembled output written by the fake back into frames.
pub fn decode_assembled(path: &Path) -> Vec<RgbImage> {
    let bytes = fs::read(path).expect("assembled output is readable");
    assert_eq!(bytes.len() % FRAME_BYTES, 0, "assembled output has a partial frame");
    bytes
        .chunks(FRAME_BYTES)
        .map(|chunk| {
            RgbImage::from_raw(FRAME_WIDTH, FRAME_HEIGHT, chunk.to_vec()).expect("frame size")
        })
        .collect()
}

/// Writes a placeholder file; the fake never reads targets.
pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, b"dummy content").expect("Failed to create dummy file");
    path
}

/// Writes `count` synthetic PNG frames named `0001.png`.. into `dir`.
pub fn write_frames(dir: &Path, count: u32) -> Vec<PathBuf> {
    fs::create_dir_all(dir).expect("frame dir");
    (1..=count)
        .map(|index| {
            let path = dir.join(format!("{index:04}.png"));
            synthetic_frame(index).save(&path).expect("frame written");
            path
        })
        .collect()
}

fn ok() -> CoreResult<CommandOutput> {
    Ok(CommandOutput {
        exit_code: Some(0),
        stdout: String::new(),
        stderr: String::new(),
    })
}

fn failed(stderr: &str) -> CoreResult<CommandOutput> {
    Ok(CommandOutput {
        exit_code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn frame_path(pattern: &str, index: u32) -> PathBuf {
    PathBuf::from(pattern.replace("%04d", &format!("{index:04}")))
}

#[derive(Debug)]
pub struct FakeTranscoder {
    frame_count: u32,
    probe_output: Option<String>,
    fail_extract: bool,
    fail_assemble: bool,
    fail_remux: bool,
    ffmpeg_calls: Mutex<Vec<Vec<String>>>,
    probe_calls: Mutex<Vec<PathBuf>>,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            frame_count: 10,
            probe_output: Some("25/1\n".to_string()),
            fail_extract: false,
            fail_assemble: false,
            fail_remux: false,
            ffmpeg_calls: Mutex::new(Vec::new()),
            probe_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(mut self, count: u32) -> Self {
        self.frame_count = count;
        self
    }

    /// Raw `r_frame_rate` the probe reports; `None` makes the probe fail.
    pub fn probe_output(mut self, output: Option<&str>) -> Self {
        self.probe_output = output.map(str::to_string);
        self
    }

    pub fn failing_extract(mut self) -> Self {
        self.fail_extract = true;
        self
    }

    pub fn failing_assemble(mut self) -> Self {
        self.fail_assemble = true;
        self
    }

    pub fn failing_remux(mut self) -> Self {
        self.fail_remux = true;
        self
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.ffmpeg_calls.lock().unwrap().clone()
    }

    pub fn get_probe_calls(&self) -> Vec<PathBuf> {
        self.probe_calls.lock().unwrap().clone()
    }

    fn extract(&self, args: &[String]) -> CoreResult<CommandOutput> {
        if self.fail_extract {
            return failed("Invalid data found when processing input");
        }
        let pattern = args.last().expect("output pattern");
        for index in 1..=self.frame_count {
            synthetic_frame(index)
                .save(frame_path(pattern, index))
                .expect("fake extraction writes frame");
        }
        ok()
    }

    fn assemble(&self, args: &[String]) -> CoreResult<CommandOutput> {
        if self.fail_assemble {
            return failed("Unknown encoder");
        }
        let pattern = arg_after(args, "-i").expect("input pattern");
        let mut bytes = Vec::new();
        let mut index = 1;
        loop {
            let path = frame_path(pattern, index);
            if !path.exists() {
                break;
            }
            let frame = image::open(&path).expect("fake assembly reads frame").to_rgb8();
            bytes.extend_from_slice(frame.as_raw());
            index += 1;
        }
        fs::write(args.last().expect("output path"), bytes).expect("fake assembly writes");
        ok()
    }

    fn remux(&self, args: &[String]) -> CoreResult<CommandOutput> {
        if self.fail_remux {
            return failed("Stream map '1:a:0' matches no streams.");
        }
        let temp_output = arg_after(args, "-i").expect("video input");
        fs::copy(temp_output, args.last().expect("output path")).expect("fake remux copies");
        ok()
    }
}

impl Transcoder for FakeTranscoder {
    fn ffmpeg(&self, args: &[String]) -> CoreResult<CommandOutput> {
        self.ffmpeg_calls.lock().unwrap().push(args.to_vec());

        if arg_after(args, "-pix_fmt") == Some("rgb24") {
            self.extract(args)
        } else if arg_after(args, "-c:v") == Some("copy") {
            self.remux(args)
        } else if args.iter().any(|a| a == "-r") {
            self.assemble(args)
        } else {
            failed("unrecognized invocation")
        }
    }

    fn probe_frame_rate(&self, target: &Path) -> CoreResult<String> {
        self.probe_calls.lock().unwrap().push(target.to_path_buf());
        match &self.probe_output {
            Some(raw) => Ok(raw.clone()),
            None => Err(CoreError::FfprobeParse(format!(
                "No video stream found in {}",
                target.display()
            ))),
        }
    }
}

/// Gateway over `fake` with a headless status reporter.
pub fn fake_gateway(fake: &Arc<FakeTranscoder>) -> Gateway {
    Gateway::new(fake.clone(), "error", StatusReporter::headless())
}

/// Gateway over `fake` whose status messages are collected in the returned
/// vector.
pub fn recording_gateway(fake: &Arc<FakeTranscoder>) -> (Gateway, Arc<Mutex<Vec<String>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let status = StatusReporter::with_ui(move |msg| sink.lock().unwrap().push(msg.to_string()));
    (Gateway::new(fake.clone(), "error", status), messages)
}
