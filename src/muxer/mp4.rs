//! MP4 container inspection

use super::ContainerInfo;
use crate::{Error, Result};
use mp4::{BoxHeader, BoxType, MediaType, Mp4Reader};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

/// Read track layout and duration of an MP4 file
pub fn inspect<P: AsRef<Path>>(path: P) -> Result<ContainerInfo> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
    let size = file
        .metadata()
        .map_err(|e| Error::file_access(path, e))?
        .len();

    let mut reader = BufReader::new(file);
    let boxes = top_level_boxes(&mut reader, size)?;
    reader.seek(SeekFrom::Start(0))?;

    let mp4 = Mp4Reader::read_header(reader, size)
        .map_err(|e| Error::Encoding(format!("Unreadable MP4 {}: {}", path.display(), e)))?;

    let mut info = ContainerInfo {
        duration: mp4.duration().as_secs_f64(),
        has_h264_video: false,
        has_aac_audio: false,
        fast_start: position(&boxes, BoxType::MoovBox) < position(&boxes, BoxType::MdatBox),
    };

    for track in mp4.tracks().values() {
        match track.media_type() {
            Ok(MediaType::H264) => info.has_h264_video = true,
            Ok(MediaType::AAC) => info.has_aac_audio = true,
            _ => {}
        }
    }

    Ok(info)
}

/// Types of the top-level boxes, in file order
fn top_level_boxes<R: std::io::Read + Seek>(reader: &mut R, size: u64) -> Result<Vec<BoxType>> {
    let mut boxes = Vec::new();
    let mut offset = 0u64;

    while offset + 8 <= size {
        reader.seek(SeekFrom::Start(offset))?;
        let header = BoxHeader::read(reader)
            .map_err(|e| Error::Encoding(format!("Malformed MP4 box at {}: {}", offset, e)))?;
        boxes.push(header.name);

        // A zero size means the box runs to the end of the file
        if header.size == 0 {
            break;
        }
        offset += header.size;
    }

    Ok(boxes)
}

fn position(boxes: &[BoxType], kind: BoxType) -> usize {
    boxes.iter().position(|b| *b == kind).unwrap_or(usize::MAX)
}
