//! Integration tests for image loading and letterboxing

mod common;

use common::*;
use slidesync::image_loader::{LoadedImage, LETTERBOX_COLOR};
use slidesync::{Error, Resolution, SlideSegment};
use tempfile::TempDir;

fn pixel(img: &LoadedImage, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * img.width + x) * 4) as usize;
    [img.data[i], img.data[i + 1], img.data[i + 2], img.data[i + 3]]
}

/// Test loading a JPEG image
#[test]
fn test_load_jpeg() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.jpg");

    let original = generate_test_image(200, 150, [255, 128, 64, 255]);
    save_jpeg(&original, &path, 85).unwrap();

    let loaded = LoadedImage::from_path(&path).unwrap();

    assert_eq!(loaded.width, 200);
    assert_eq!(loaded.height, 150);
    assert_eq!(loaded.data.len(), (200 * 150 * 4) as usize);
}

/// Test loading a PNG image
#[test]
fn test_load_png() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.png");

    let original = generate_test_image(200, 150, [255, 128, 64, 255]);
    save_png(&original, &path).unwrap();

    let loaded = LoadedImage::from_path(&path).unwrap();

    assert_eq!(loaded.width, 200);
    assert_eq!(loaded.height, 150);
}

/// Test loading an image whose extension lies about its format
#[test]
fn test_load_misnamed_png() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("actually_png.jpg");

    save_png(&generate_test_image(20, 10, [0, 0, 0, 255]), temp_dir.path().join("x.png")).unwrap();
    std::fs::rename(temp_dir.path().join("x.png"), &path).unwrap();

    let loaded = LoadedImage::from_path(&path).unwrap();
    assert_eq!((loaded.width, loaded.height), (20, 10));
}

/// Test loading a non-existent file names the file
#[test]
fn test_load_nonexistent() {
    match LoadedImage::from_path("/nonexistent/path/image.png") {
        Err(Error::ImageLoad { path, .. }) => {
            assert_eq!(path.to_str(), Some("/nonexistent/path/image.png"))
        }
        other => panic!("expected ImageLoad, got {other:?}"),
    }
}

/// Test a corrupt file fails with ImageLoad
#[test]
fn test_load_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(
        LoadedImage::from_path(&path),
        Err(Error::ImageLoad { .. })
    ));
}

/// 800x600 into 1920x1080: scaled to 1440x1080 with 240px side bars
#[test]
fn test_letterbox_side_bars() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("slide.png");
    save_png(&generate_test_image(800, 600, [200, 200, 200, 255]), &path).unwrap();

    let segment = SlideSegment::compose(&path, 2.5, Resolution::new(1920, 1080)).unwrap();
    let frame = &segment.frame;

    assert_eq!((frame.width, frame.height), (1920, 1080));
    assert_eq!(frame.data.len(), 1920 * 1080 * 4);
    assert_eq!(segment.duration_seconds, 2.5);

    // Bars
    assert_eq!(pixel(frame, 0, 540), LETTERBOX_COLOR);
    assert_eq!(pixel(frame, 239, 540), LETTERBOX_COLOR);
    assert_eq!(pixel(frame, 1680, 540), LETTERBOX_COLOR);
    assert_eq!(pixel(frame, 1919, 0), LETTERBOX_COLOR);

    // Picture spans the full height between the bars
    assert_ne!(pixel(frame, 960, 0), LETTERBOX_COLOR);
    assert_ne!(pixel(frame, 960, 1079), LETTERBOX_COLOR);
    assert_ne!(pixel(frame, 241, 540), LETTERBOX_COLOR);
}

/// A slide already at the output size is kept as is
#[test]
fn test_letterbox_exact_size() {
    let img = LoadedImage::from_dynamic_image(image::DynamicImage::ImageRgba8(
        generate_test_image(64, 36, [10, 20, 30, 255]),
    ));
    let boxed = img.letterbox(Resolution::new(64, 36)).unwrap();
    assert_eq!(boxed.data, img.data);
}
