//! Tag-derived [`TrackMetadata`], read independently of the audio signal
//! via `lofty`. Never touches `FeatureRecord` — retagging a file should not
//! require re-analysis.

use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Accessor;

use crate::errors::{ExtractionError, ExtractionResult};
use crate::types::TrackMetadata;

/// Reads title/artist/album/genre/bitrate from `path`'s tags, if any.
/// A file with no readable tag still succeeds, with every field `None`.
///
/// # Errors
/// `FileMissing` if `path` does not exist; `DecodeFailed` if the file can't
/// be probed at all (corrupt header, unrecognized container).
pub fn read_tags(path: &Path) -> ExtractionResult<TrackMetadata> {
    super::check_exists(path)?;

    let tagged_file = Probe::open(path)
        .and_then(lofty::probe::Probe::read)
        .map_err(|e| ExtractionError::DecodeFailed(e.to_string()))?;

    let properties = tagged_file.properties();
    let bitrate_kbps = properties.audio_bitrate();

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(TrackMetadata {
            bitrate_kbps,
            ..TrackMetadata::default()
        });
    };

    Ok(TrackMetadata {
        title: tag.title().map(|s| s.replace('\0', "")),
        artist: tag.artist().map(|s| s.replace('\0', "")),
        album: tag.album().map(|s| s.replace('\0', "")),
        genre: tag.genre().map(|s| s.replace('\0', "")),
        bitrate_kbps,
        can_pitch_shift: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_missing_file_is_reported_as_missing() {
        let result = read_tags(Path::new("/does/not/exist.flac"));
        assert!(matches!(result, Err(ExtractionError::FileMissing(_))));
    }
}
