//! End-to-end tests of `generate_masks` with the linked and external services.
//!
//! Run with: `cargo test -p stencil-core`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use stencil_core::buffer::Array2D;
use stencil_core::error::MaskError;
use stencil_core::image::RgbImage;
use stencil_core::masks::{
    ExternalMaskManager, LinkedMaskManager, MaskDecoder, MaskGeometry, generate_masks,
};
use stencil_core::params::{
    AreaMask, AreaShape, ExternalMask, LinkedMask, Mask, ParametricMask, ProcParams,
    ShapeGeometry, ShapeMode, ToolMasks,
};
use stencil_core::progress::ProgressListener;

const EPSILON: f32 = 1e-5;
const SIZE: u32 = 20;

#[derive(Default)]
struct RecordingListener {
    errors: Mutex<Vec<String>>,
    progress: Mutex<Vec<f64>>,
}

impl ProgressListener for RecordingListener {
    fn set_progress(&self, progress: f64) {
        self.progress.lock().unwrap().push(progress);
    }

    fn set_progress_str(&self, _status: &str) {}

    fn error(&self, description: &str) {
        self.errors.lock().unwrap().push(description.to_string());
    }
}

/// Decoder double: a vertical ramp for any path except ones containing "broken".
#[derive(Default)]
struct CountingDecoder {
    calls: AtomicUsize,
}

impl MaskDecoder for CountingDecoder {
    fn decode(&self, path: &Path) -> Result<Array2D<f32>, MaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if path.to_string_lossy().contains("broken") {
            return Err(MaskError::EmptyMask(path.to_path_buf()));
        }
        Ok(Array2D::from_fn(8, 8, |_, y| y as f32 / 7.0))
    }
}

fn gradient_image() -> RgbImage {
    RgbImage::from_fn(SIZE, SIZE, |x, y| {
        [x as f32 / SIZE as f32, y as f32 / SIZE as f32, 0.4]
    })
}

fn geometry() -> MaskGeometry {
    MaskGeometry::full_frame(SIZE, SIZE)
}

fn rect_area(feather: f32) -> AreaMask {
    AreaMask {
        enabled: true,
        inverted: false,
        shapes: vec![AreaShape {
            mode: ShapeMode::Add,
            feather,
            geometry: ShapeGeometry::Rectangle {
                center: [0.5, 0.5],
                width: 0.5,
                height: 0.5,
                angle: 0.0,
                roundness: 0.0,
            },
        }],
    }
}

fn named(name: &str, mask: Mask) -> Mask {
    Mask {
        name: name.to_string(),
        ..mask
    }
}

fn linked_to(tool: &str, name: &str, inverted: bool) -> Mask {
    Mask {
        linked: LinkedMask {
            enabled: true,
            inverted,
            tool: tool.to_string(),
            name: name.to_string(),
        },
        ..Mask::default()
    }
}

fn all_close(buf: &Array2D<f32>, value: f32) -> bool {
    buf.as_slice().iter().all(|&v| (v - value).abs() < EPSILON)
}

#[test]
fn test_one_pair_per_mask_sized_to_the_crop() {
    let img = RgbImage::filled(12, 7, [0.3, 0.3, 0.3]);
    let geom = MaskGeometry {
        offset_x: 4,
        offset_y: 2,
        ..MaskGeometry::full_frame(30, 20)
    };
    let masks = vec![
        Mask::default(),
        Mask {
            enabled: false,
            area: rect_area(0.0),
            ..Mask::default()
        },
        Mask {
            area: rect_area(0.1),
            ..Mask::default()
        },
    ];
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::new(4);

    let out = generate_masks(&img, "local", &mut linked, &external, &masks, &geom, true, None, None);

    assert_eq!(out.lightness.len(), 3);
    assert_eq!(out.chroma.len(), 3);
    for (l, c) in out.lightness.iter().zip(&out.chroma) {
        assert_eq!(l.dimensions(), (12, 7));
        assert_eq!(c.dimensions(), (12, 7));
    }
    assert!(all_close(&out.lightness[0], 1.0), "no source is neutral");
    assert!(all_close(&out.chroma[1], 1.0), "disabled mask is neutral");
    assert!(out.preview.is_none());
}

#[test]
fn test_full_range_hue_selects_every_pixel() {
    let mask = Mask {
        parametric: ParametricMask {
            enabled: true,
            hue: vec![[0.0, 1.0], [1.0, 1.0]],
            ..ParametricMask::default()
        },
        ..Mask::default()
    };
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::new(1);
    let out = generate_masks(
        &gradient_image(),
        "color",
        &mut linked,
        &external,
        &[mask],
        &geometry(),
        false,
        None,
        None,
    );
    assert!(all_close(&out.lightness[0], 1.0));
    assert!(all_close(&out.chroma[0], 1.0));
}

#[test]
fn test_area_edge_hard_without_feather_graded_with_it() {
    let img = gradient_image();
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::new(1);
    let masks = [
        Mask {
            area: rect_area(0.0),
            ..Mask::default()
        },
        Mask {
            area: rect_area(0.2),
            ..Mask::default()
        },
    ];
    let out = generate_masks(&img, "local", &mut linked, &external, &masks, &geometry(), true, None, None);

    let hard = out.lightness[0].row(10);
    assert!(hard.iter().all(|&v| v == 0.0 || v == 1.0), "hard edge: {hard:?}");
    assert_eq!(hard[4], 0.0);
    assert_eq!(hard[5], 1.0);

    let soft = out.lightness[1].row(10);
    assert!(soft.iter().any(|&v| v > 0.0 && v < 1.0), "feathered edge: {soft:?}");
    for x in 1..=10 {
        assert!(soft[x] >= soft[x - 1], "not monotonic at {x}: {soft:?}");
    }
}

#[test]
fn test_source_order_does_not_matter() {
    let img = gradient_image();
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::with_decoder(2, Arc::new(CountingDecoder::default()));
    let mask = Mask {
        area: rect_area(0.1),
        external: ExternalMask {
            enabled: true,
            inverted: false,
            path: PathBuf::from("ramp.png"),
            feather: 0.0,
        },
        ..Mask::default()
    };
    let out = generate_masks(&img, "local", &mut linked, &external, &[mask.clone()], &geometry(), false, None, None);

    // Area alone times the ramp alone gives the same composite.
    let area_only = Mask {
        external: ExternalMask::default(),
        ..mask
    };
    let area = generate_masks(&img, "local", &mut linked, &external, &[area_only], &geometry(), false, None, None);
    let mut ramp = Array2D::new(0, 0);
    let guide = Array2D::filled(SIZE as usize, SIZE as usize, 0.5);
    assert!(external.apply_mask(Path::new("ramp.png"), false, 0.0, 0, 0, SIZE, SIZE, &guide, &mut ramp, false, None));

    for ((&c, &a), &r) in out.lightness[0]
        .as_slice()
        .iter()
        .zip(area.lightness[0].as_slice())
        .zip(ramp.as_slice())
    {
        assert!((c - a * r).abs() < EPSILON);
    }
}

#[test]
fn test_linked_mask_flows_from_producer_to_consumer() {
    let img = gradient_image();
    let producer = vec![named(
        "sky",
        Mask {
            area: rect_area(0.05),
            ..Mask::default()
        },
    )];
    let consumer = vec![linked_to("color", "sky", false), linked_to("color", "sky", true)];
    let params = ProcParams {
        tools: vec![
            ToolMasks::new("color", producer.clone()),
            ToolMasks::new("local", consumer.clone()),
        ],
    };

    let mut linked = LinkedMaskManager::new();
    linked.init(&params);
    assert!(linked.is_needed("color", "sky"));
    let external = ExternalMaskManager::new(1);

    let produced = generate_masks(&img, "color", &mut linked, &external, &producer, &geometry(), true, None, None);
    assert_eq!(linked.len(), 1);
    let consumed = generate_masks(&img, "local", &mut linked, &external, &consumer, &geometry(), true, None, None);

    assert_eq!(consumed.lightness[0], produced.lightness[0]);
    assert_eq!(consumed.chroma[0], produced.chroma[0]);
    for (&inv, &orig) in consumed.lightness[1]
        .as_slice()
        .iter()
        .zip(produced.lightness[0].as_slice())
    {
        assert!((inv - (1.0 - orig)).abs() < EPSILON);
    }
}

#[test]
fn test_missing_linked_mask_is_neutral_and_reported() {
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::new(1);
    let listener = RecordingListener::default();
    let out = generate_masks(
        &gradient_image(),
        "local",
        &mut linked,
        &external,
        &[linked_to("color", "nowhere", false)],
        &geometry(),
        false,
        None,
        Some(&listener),
    );
    assert!(all_close(&out.lightness[0], 1.0));
    assert!(all_close(&out.chroma[0], 1.0));
    let errors = listener.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("nowhere"), "{errors:?}");
}

#[test]
fn test_failed_external_mask_is_neutral_and_reported() {
    let mut linked = LinkedMaskManager::new();
    let decoder = Arc::new(CountingDecoder::default());
    let external = ExternalMaskManager::with_decoder(2, decoder.clone());
    let listener = RecordingListener::default();
    let mask = Mask {
        external: ExternalMask {
            enabled: true,
            inverted: false,
            path: PathBuf::from("broken.tif"),
            feather: 3.0,
        },
        ..Mask::default()
    };
    let out = generate_masks(
        &gradient_image(),
        "local",
        &mut linked,
        &external,
        &[mask],
        &geometry(),
        false,
        None,
        Some(&listener),
    );
    assert!(all_close(&out.lightness[0], 1.0));
    assert_eq!(listener.errors.lock().unwrap().len(), 1);
    assert_eq!(*listener.progress.lock().unwrap(), vec![1.0]);
}

#[test]
fn test_external_mask_shared_between_regions_decodes_once() {
    let mut linked = LinkedMaskManager::new();
    let decoder = Arc::new(CountingDecoder::default());
    let external = ExternalMaskManager::with_decoder(2, decoder.clone());
    let mask = Mask {
        external: ExternalMask {
            enabled: true,
            inverted: false,
            path: PathBuf::from("ramp.png"),
            feather: 0.0,
        },
        ..Mask::default()
    };
    let out = generate_masks(
        &gradient_image(),
        "local",
        &mut linked,
        &external,
        &[mask.clone(), mask],
        &geometry(),
        true,
        None,
        None,
    );
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.lightness[0], out.lightness[1]);
    assert!(out.lightness[0][(5, 0)] < out.lightness[0][(5, 19)]);
}

#[test]
fn test_mask_inversion_and_preview() {
    let mut linked = LinkedMaskManager::new();
    let external = ExternalMaskManager::new(1);
    let masks = [
        Mask {
            area: rect_area(0.0),
            ..Mask::default()
        },
        Mask {
            inverted: true,
            area: rect_area(0.0),
            ..Mask::default()
        },
    ];
    let out = generate_masks(
        &gradient_image(),
        "local",
        &mut linked,
        &external,
        &masks,
        &geometry(),
        false,
        Some(1),
        None,
    );
    for (&a, &b) in out.lightness[0].as_slice().iter().zip(out.lightness[1].as_slice()) {
        assert_eq!(a, 1.0 - b);
    }
    let preview = out.preview.expect("preview requested");
    assert_eq!((preview.width, preview.height), (SIZE, SIZE));
    assert_eq!(preview.pixel(0, 0), [1.0; 3]);
    assert_eq!(preview.pixel(10, 10), [0.0; 3]);
}

#[test]
fn test_parallel_matches_sequential() {
    let img = gradient_image();
    let external = ExternalMaskManager::new(1);
    let mask = Mask {
        parametric: ParametricMask {
            enabled: true,
            blur: 1.5,
            lightness: vec![[0.0, 0.0], [1.0, 1.0]],
            ..ParametricMask::default()
        },
        area: rect_area(0.1),
        postprocess: stencil_core::params::MaskPostprocess {
            blur: 1.0,
            smoothing: 2.0,
        },
        ..Mask::default()
    };
    let mut linked = LinkedMaskManager::new();
    let seq = generate_masks(&img, "local", &mut linked, &external, &[mask.clone()], &geometry(), false, None, None);
    let par = generate_masks(&img, "local", &mut linked, &external, &[mask], &geometry(), true, None, None);
    assert_eq!(seq.lightness, par.lightness);
    assert_eq!(seq.chroma, par.chroma);
}

#[test]
fn test_huge_blur_and_smoothing_stay_finite() {
    let img = RgbImage::from_fn(8, 8, |x, _| [x as f32 / 8.0, 0.2, 0.3]);
    let external = ExternalMaskManager::new(1);
    let mut linked = LinkedMaskManager::new();
    let masks = [
        Mask {
            area: rect_area(0.0),
            postprocess: stencil_core::params::MaskPostprocess {
                blur: 1e20,
                smoothing: 0.0,
            },
            ..Mask::default()
        },
        Mask {
            area: rect_area(0.0),
            postprocess: stencil_core::params::MaskPostprocess {
                blur: 0.0,
                smoothing: 1e20,
            },
            ..Mask::default()
        },
        Mask {
            parametric: ParametricMask {
                enabled: true,
                blur: f32::MAX,
                ..ParametricMask::default()
            },
            postprocess: stencil_core::params::MaskPostprocess {
                blur: 1e30,
                smoothing: 1e30,
            },
            ..Mask::default()
        },
    ];
    let out = generate_masks(
        &img,
        "local",
        &mut linked,
        &external,
        &masks,
        &MaskGeometry::full_frame(8, 8),
        true,
        None,
        None,
    );
    for buf in out.lightness.iter().chain(&out.chroma) {
        assert_eq!(buf.dimensions(), (8, 8));
        for &v in buf.as_slice() {
            assert!(v.is_finite() && (0.0..=1.0).contains(&v), "{v}");
        }
    }
}

#[test]
fn test_linked_mask_of_other_size_is_neutral_and_reported() {
    let mut linked = LinkedMaskManager::new();
    linked.mark_needed("color", "sky");
    let small = Array2D::filled(4, 4, 0.25_f32);
    assert!(linked.store_mask("color", "sky", &small, &small, false));

    let external = ExternalMaskManager::new(1);
    let listener = RecordingListener::default();
    let out = generate_masks(
        &gradient_image(),
        "local",
        &mut linked,
        &external,
        &[linked_to("color", "sky", false)],
        &geometry(),
        false,
        None,
        Some(&listener),
    );
    assert!(all_close(&out.lightness[0], 1.0));
    assert!(all_close(&out.chroma[0], 1.0));
    let errors = listener.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("color/sky"), "{errors:?}");
}
