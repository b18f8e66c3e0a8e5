//! Common test utilities

#![allow(dead_code)]

use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Generate a test image with a solid color and optional gradient
pub fn generate_test_image(width: u32, height: u32, base_color: [u8; 4]) -> RgbaImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        // Add subtle gradient to make frames distinguishable
        let r = base_color[0].saturating_add((x % 50) as u8);
        let g = base_color[1].saturating_add((y % 50) as u8);
        let b = base_color[2];
        let a = base_color[3];
        *pixel = Rgba([r, g, b, a]);
    }

    img
}

/// Generate a numbered test image (useful for slideshow testing)
pub fn generate_numbered_image(width: u32, height: u32, number: u32) -> RgbaImage {
    let colors = [
        [255, 100, 100, 255], // Red-ish
        [100, 255, 100, 255], // Green-ish
        [100, 100, 255, 255], // Blue-ish
        [255, 255, 100, 255], // Yellow-ish
        [255, 100, 255, 255], // Magenta-ish
        [100, 255, 255, 255], // Cyan-ish
    ];

    let color = colors[(number as usize) % colors.len()];
    generate_test_image(width, height, color)
}

/// Save a test image as JPEG
pub fn save_jpeg<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> std::io::Result<()> {
    // Convert RGBA to RGB for JPEG
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = std::fs::File::create(path)?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(std::io::Error::other)?;

    Ok(())
}

/// Save a test image as PNG
pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> std::io::Result<()> {
    img.save(path).map_err(std::io::Error::other)
}

/// Write numbered PNG slides `slide_0.png`.. into `dir`
pub fn write_slides(dir: &Path, sizes: &[(u32, u32)]) -> Vec<String> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, (w, h))| {
            let name = format!("slide_{}.png", i);
            save_png(&generate_numbered_image(*w, *h, i as u32), dir.join(&name)).unwrap();
            name
        })
        .collect()
}

/// Write a timing table from (filename, start_time) pairs
pub fn write_timing_csv(path: &Path, rows: &[(&str, &str)]) {
    let mut csv = String::from("filename,start_time\n");
    for (name, start) in rows {
        csv.push_str(&format!("{},{}\n", name, start));
    }
    std::fs::write(path, csv).unwrap();
}

/// Whether ffmpeg and ffprobe are on PATH
pub fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    })
}

/// Generate a sine tone of `seconds` with ffmpeg
pub fn generate_tone(path: &Path, seconds: f64) -> PathBuf {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:sample_rate=44100:duration={}", seconds),
            "-c:a",
            "pcm_s16le",
        ])
        .arg(path)
        .status()
        .expect("failed to run ffmpeg");
    assert!(status.success(), "ffmpeg could not generate test audio");
    path.to_path_buf()
}

/// Verify that a file exists and has non-zero size
pub fn verify_file_exists_with_size<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}

/// Parse MP4 header to verify it's a valid MP4 file
pub fn verify_mp4_header<P: AsRef<Path>>(path: P) -> bool {
    use std::io::Read;

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err() {
        return false;
    }

    // MP4 files have 'ftyp' box at offset 4
    &header[4..8] == b"ftyp"
}

/// Names of the entries in a directory
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.jpg");

        let img = generate_test_image(100, 100, [255, 0, 0, 255]);
        save_jpeg(&img, &path, 85).unwrap();

        assert!(verify_file_exists_with_size(&path));
    }

    #[test]
    fn test_write_timing_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timing.csv");
        write_timing_csv(&path, &[("a.png", "0"), ("b.png", "0:30")]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "filename,start_time\na.png,0\nb.png,0:30\n");
    }
}
