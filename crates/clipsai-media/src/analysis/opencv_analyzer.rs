//! OpenCV frame analyzer: Haar-cascade faces, Sobel gradient activity and
//! Canny edge density.

use opencv::core::{self, Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_POS_FRAMES};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::debug;

use clipsai_models::{FocalPoint, TimeWindow};

use super::scoring::{
    normalized_motion, sample_frame_indices, select_focal_point, FaceRegion, FrameSignals,
};
use super::FrameAnalyzer;
use crate::config::AnalysisConfig;
use crate::error::{MediaError, MediaResult};

const SCALE_FACTOR: f64 = 1.1;
const MIN_NEIGHBORS: i32 = 4;
const CANNY_LOW: f64 = 50.0;
const CANNY_HIGH: f64 = 150.0;

thread_local! {
    // detect_multi_scale needs &mut, so every blocking thread keeps its own
    static CASCADE: RefCell<Option<(PathBuf, CascadeClassifier)>> = const { RefCell::new(None) };
}

/// Load a face cascade. Fails when the file is missing or not a cascade.
fn load_cascade(path: &Path) -> MediaResult<CascadeClassifier> {
    if !path.exists() {
        return Err(MediaError::analysis_failed(format!(
            "face cascade not found: {}",
            path.display()
        )));
    }

    let cascade = CascadeClassifier::new(&path.to_string_lossy()).map_err(cv_error)?;
    if cascade.empty().map_err(cv_error)? {
        return Err(MediaError::analysis_failed(format!(
            "face cascade could not be loaded: {}",
            path.display()
        )));
    }
    Ok(cascade)
}

/// Run `f` with this thread's classifier for `path`, loading it on first use.
fn with_cascade<T>(
    path: &Path,
    f: impl FnOnce(&mut CascadeClassifier) -> MediaResult<T>,
) -> MediaResult<T> {
    CASCADE.with(|slot| {
        let mut slot = slot.borrow_mut();
        let loaded = matches!(&*slot, Some((loaded_path, _)) if loaded_path == path);
        if !loaded {
            *slot = Some((path.to_path_buf(), load_cascade(path)?));
        }
        match slot.as_mut() {
            Some((_, cascade)) => f(cascade),
            None => Err(MediaError::analysis_failed("face cascade not loaded")),
        }
    })
}

pub struct OpenCvAnalyzer {
    cascade_path: PathBuf,
    sample_count: usize,
}

impl OpenCvAnalyzer {
    /// Check that the configured face cascade loads.
    ///
    /// Classifiers are loaded again lazily on each analysis thread.
    pub fn load(config: &AnalysisConfig) -> MediaResult<Self> {
        load_cascade(&config.face_cascade_path)?;
        Ok(Self {
            cascade_path: config.face_cascade_path.clone(),
            sample_count: config.sample_count,
        })
    }

    fn measure(&self, frame: &Mat) -> MediaResult<FrameSignals> {
        let mut gray = Mat::default();
        imgproc::cvt_color(
            frame,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(cv_error)?;

        Ok(FrameSignals {
            frame_width: frame.cols().max(0) as u32,
            frame_height: frame.rows().max(0) as u32,
            faces: self.detect_faces(&gray)?,
            motion: gradient_activity(&gray)?,
            edges: edge_density(&gray)?,
        })
    }

    fn detect_faces(&self, gray: &Mat) -> MediaResult<Vec<FaceRegion>> {
        let mut faces: Vector<Rect> = Vector::new();
        with_cascade(&self.cascade_path, |cascade| {
            cascade
                .detect_multi_scale(
                    gray,
                    &mut faces,
                    SCALE_FACTOR,
                    MIN_NEIGHBORS,
                    0,
                    Size::default(),
                    Size::default(),
                )
                .map_err(cv_error)
        })?;

        Ok(faces
            .iter()
            .map(|r| FaceRegion::new(r.x as f64, r.y as f64, r.width as f64, r.height as f64))
            .collect())
    }
}

impl FrameAnalyzer for OpenCvAnalyzer {
    fn analyze(&self, path: &Path, window: TimeWindow) -> MediaResult<FocalPoint> {
        let mut cap = VideoCapture::from_file(&path.to_string_lossy(), CAP_ANY).map_err(cv_error)?;
        if !cap.is_opened().unwrap_or(false) {
            return Err(MediaError::analysis_failed(format!(
                "cannot open video: {}",
                path.display()
            )));
        }

        let fps = cap.get(CAP_PROP_FPS).map_err(cv_error)?;
        let indices = sample_frame_indices(fps, window, self.sample_count);

        let mut samples = Vec::with_capacity(indices.len());
        let mut frame = Mat::default();
        for index in indices {
            cap.set(CAP_PROP_POS_FRAMES, index as f64).map_err(cv_error)?;
            if !cap.read(&mut frame).unwrap_or(false) || frame.empty() {
                continue;
            }
            samples.push(self.measure(&frame)?);
        }

        let point = select_focal_point(&samples);
        debug!(
            path = %path.display(),
            samples = samples.len(),
            center_x = point.center_x,
            center_y = point.center_y,
            confidence = point.confidence,
            "Visual analysis complete"
        );
        Ok(point)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "opencv"
    }
}

/// Mean Sobel gradient magnitude, scaled by 1/255 and capped at 1.
fn gradient_activity(gray: &Mat) -> MediaResult<f64> {
    let mut gx = Mat::default();
    let mut gy = Mat::default();
    imgproc::sobel(gray, &mut gx, core::CV_64F, 1, 0, 3, 1.0, 0.0, core::BORDER_DEFAULT)
        .map_err(cv_error)?;
    imgproc::sobel(gray, &mut gy, core::CV_64F, 0, 1, 3, 1.0, 0.0, core::BORDER_DEFAULT)
        .map_err(cv_error)?;

    let mut magnitude = Mat::default();
    core::magnitude(&gx, &gy, &mut magnitude).map_err(cv_error)?;

    let mean = core::mean(&magnitude, &core::no_array()).map_err(cv_error)?;
    Ok(normalized_motion(mean[0]))
}

/// Fraction of pixels Canny marks as edges.
fn edge_density(gray: &Mat) -> MediaResult<f64> {
    let mut edges = Mat::default();
    imgproc::canny(gray, &mut edges, CANNY_LOW, CANNY_HIGH, 3, false).map_err(cv_error)?;

    let total = (edges.rows() as i64 * edges.cols() as i64).max(1);
    let edge_pixels = core::count_non_zero(&edges).map_err(cv_error)?;
    Ok(edge_pixels as f64 / total as f64)
}

fn cv_error(e: opencv::Error) -> MediaError {
    MediaError::analysis_failed(e.to_string())
}
