//! FFI (Foreign Function Interface) for C/Go interoperability

use crate::error::ErrorCode;
use crate::{available, sync, EncodeOptions, Job, OutputSpec, Resolution, ValidationMode};
use libc::c_char;
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;

/// FFI result structure
#[repr(C)]
pub struct FfiResult {
    pub code: ErrorCode,
    pub message: *mut c_char,
}

impl FfiResult {
    fn ok() -> Self {
        Self {
            code: ErrorCode::Ok,
            message: ptr::null_mut(),
        }
    }

    fn error(code: ErrorCode, message: &str) -> Self {
        let c_message = CString::new(message.replace('\0', " "))
            .unwrap_or_else(|_| CString::from(c"Unknown error"));
        Self {
            code,
            message: c_message.into_raw(),
        }
    }
}

/// FFI output settings
#[repr(C)]
pub struct FfiOutputSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub end_padding: f64,
    /// Encoder threads; 0 selects the default
    pub threads: u32,
    /// Non-zero rejects slides sharing a start time
    pub strict: u8,
}

/// Borrow a required C string as a path
unsafe fn required_path(ptr: *const c_char, what: &str) -> Result<PathBuf, FfiResult> {
    if ptr.is_null() {
        return Err(FfiResult::error(
            ErrorCode::InvalidInput,
            &format!("{} is null", what),
        ));
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Ok(PathBuf::from(s)),
        Err(_) => Err(FfiResult::error(
            ErrorCode::InvalidInput,
            &format!("Invalid {}", what),
        )),
    }
}

/// Borrow an optional C string as a path
unsafe fn optional_path(ptr: *const c_char, what: &str) -> Result<Option<PathBuf>, FfiResult> {
    if ptr.is_null() {
        Ok(None)
    } else {
        required_path(ptr, what).map(Some)
    }
}

/// Check that ffmpeg with H.264 and AAC support is available
///
/// # Safety
/// - `ffmpeg_path` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn slidesync_available(ffmpeg_path: *const c_char) -> FfiResult {
    let ffmpeg_path = match optional_path(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(result) => return result,
    };

    match available(ffmpeg_path.as_deref()) {
        Ok(_) => FfiResult::ok(),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Build a slideshow video from an audio file, a timing table and an image directory
///
/// # Safety
/// - `audio_path`, `timing_path`, `images_dir` and `output_path` must be valid
///   null-terminated strings
/// - `spec` must point to a valid `FfiOutputSpec` or be null (defaults)
/// - `ffmpeg_path` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn slidesync_sync(
    audio_path: *const c_char,
    timing_path: *const c_char,
    images_dir: *const c_char,
    output_path: *const c_char,
    spec: *const FfiOutputSpec,
    ffmpeg_path: *const c_char,
) -> FfiResult {
    let paths = (|| {
        Ok::<_, FfiResult>((
            required_path(audio_path, "audio path")?,
            required_path(timing_path, "timing table path")?,
            required_path(images_dir, "image directory")?,
            required_path(output_path, "output path")?,
            optional_path(ffmpeg_path, "ffmpeg path")?,
        ))
    })();

    let (audio, timing, images, output, ffmpeg) = match paths {
        Ok(p) => p,
        Err(result) => return result,
    };

    let mut job = Job::new(audio, timing, images, output);
    job.spec = match spec.as_ref() {
        Some(s) => OutputSpec {
            resolution: Resolution::new(s.width, s.height),
            fps: s.fps,
            end_padding: s.end_padding,
            encode: EncodeOptions {
                threads: if s.threads == 0 {
                    EncodeOptions::default().threads
                } else {
                    s.threads
                },
                ..Default::default()
            },
        },
        None => OutputSpec::default(),
    };
    job.spec.encode.ffmpeg_path = ffmpeg;
    if spec.as_ref().is_some_and(|s| s.strict != 0) {
        job.mode = ValidationMode::Strict;
    }

    match sync(&job) {
        Ok(_) => FfiResult::ok(),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Free a result's message string
///
/// # Safety
/// - `result` must point to a valid `FfiResult` that was returned by a slidesync function
#[no_mangle]
pub unsafe extern "C" fn slidesync_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }

    let result = &mut *result;
    if !result.message.is_null() {
        // Reclaim the CString and let it drop
        let _ = CString::from_raw(result.message);
        result.message = ptr::null_mut();
    }
}

/// Get version string
#[no_mangle]
pub extern "C" fn slidesync_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
