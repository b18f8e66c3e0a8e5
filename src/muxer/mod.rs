//! Output container checks

pub mod mp4;

use crate::{Error, Result};

/// What an encoded container holds
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    /// Movie duration in seconds
    pub duration: f64,
    /// An H.264 video track is present
    pub has_h264_video: bool,
    /// An AAC audio track is present
    pub has_aac_audio: bool,
    /// `moov` precedes `mdat`
    pub fast_start: bool,
}

impl ContainerInfo {
    /// Require the H.264 + AAC pairing and the fast-start layout
    pub fn verify(&self) -> Result<()> {
        if !self.has_h264_video {
            return Err(Error::Encoding("Output has no H.264 video track".to_string()));
        }
        if !self.has_aac_audio {
            return Err(Error::Encoding("Output has no AAC audio track".to_string()));
        }
        if !self.fast_start {
            return Err(Error::Encoding(
                "Output metadata is not placed before media data".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ContainerInfo {
        ContainerInfo {
            duration: 10.0,
            has_h264_video: true,
            has_aac_audio: true,
            fast_start: true,
        }
    }

    #[test]
    fn test_verify_complete() {
        assert!(info().verify().is_ok());
    }

    #[test]
    fn test_verify_missing_audio() {
        let mut i = info();
        i.has_aac_audio = false;
        assert!(matches!(i.verify(), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_verify_not_fast_start() {
        let mut i = info();
        i.fast_start = false;
        assert!(matches!(i.verify(), Err(Error::Encoding(_))));
    }
}
