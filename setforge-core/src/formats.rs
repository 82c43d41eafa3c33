//! Playlist export: the handful of formats a DJ actually loads a set into.
//! JSON and CSV are plain serialization; M3U8 and the library-XML formats
//! (Rekordbox/Traktor/Serato) are hand-written per their own conventions,
//! including each program's own key-code notation.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use setforge_features::CamelotCode;
use setforge_validator::{Playlist, QualityScore};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize playlist to JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Serialize)]
struct PlaylistInfo {
    name: String,
    created: i64,
    total_tracks: usize,
    total_duration: f64,
}

#[derive(Debug, Serialize)]
struct JsonTrack<'a> {
    position: usize,
    file_path: &'a std::path::Path,
    metadata: &'a setforge_features::TrackMetadata,
    analysis: Option<&'a setforge_features::FeatureRecord>,
}

#[derive(Debug, Serialize)]
struct JsonPlaylist<'a> {
    playlist_info: PlaylistInfo,
    quality: &'a QualityScore,
    tracks: Vec<JsonTrack<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    energy_curve: Option<&'a [f64]>,
}

/// Serializes a playlist to the JSON export schema.
///
/// # Errors
/// Returns an error if `serde_json` fails to serialize the playlist.
#[inline]
pub fn to_json(
    name: &str,
    playlist: &Playlist,
    quality: &QualityScore,
    energy_curve: Option<&[f64]>,
) -> Result<String, FormatError> {
    let total_duration = playlist
        .iter()
        .filter_map(|entry| entry.record.as_ref())
        .map(|record| record.duration_seconds)
        .sum();

    let doc = JsonPlaylist {
        playlist_info: PlaylistInfo {
            name: name.to_string(),
            created: now_epoch_seconds(),
            total_tracks: playlist.len(),
            total_duration,
        },
        quality,
        tracks: playlist
            .iter()
            .enumerate()
            .map(|(position, entry)| JsonTrack {
                position,
                file_path: &entry.path,
                metadata: &entry.metadata,
                analysis: entry.record.as_ref(),
            })
            .collect(),
        energy_curve,
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Writes the M3U8 playlist format: `EXTM3U` header, one `EXTINF` (plus
/// optional `EXTBPM`/`EXTKEY`/`EXTENERGY`) line per track, then its path.
#[must_use]
#[inline]
pub fn to_m3u8(playlist: &Playlist) -> String {
    let mut out = String::from("#EXTM3U\n");
    for entry in playlist {
        let title = entry.metadata.title.as_deref().unwrap_or("Unknown Title");
        let artist = entry.metadata.artist.as_deref().unwrap_or("Unknown Artist");
        let duration = entry
            .record
            .as_ref()
            .map_or(-1.0, |r| r.duration_seconds)
            .round() as i64;

        let _ = writeln!(out, "#EXTINF:{duration},{artist} - {title}");
        if let Some(record) = &entry.record {
            let _ = writeln!(out, "#EXTBPM:{:.1}", record.bpm);
            let _ = writeln!(out, "#EXTKEY:{}", record.key);
            let _ = writeln!(out, "#EXTENERGY:{:.2}", record.energy_score);
        }
        let _ = writeln!(out, "{}", entry.path.display());
    }
    out
}

/// Writes the full CSV export, one row per track. Tracks missing analysis
/// leave the numeric columns blank rather than a sentinel.
///
/// # Errors
/// Returns an error if the underlying CSV writer fails.
#[inline]
pub fn to_csv(playlist: &Playlist) -> Result<String, FormatError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "position",
        "file_path",
        "title",
        "artist",
        "album",
        "genre",
        "duration",
        "bpm",
        "key",
        "energy_score",
        "mood_dark",
        "mood_euphoric",
        "mood_driving",
        "mood_experimental",
        "mood_progressive",
        "mood_peak_time",
        "spectral_centroid_hz",
        "onset_density_per_s",
    ])?;

    for (position, entry) in playlist.iter().enumerate() {
        let position = position.to_string();
        let path = entry.path.display().to_string();
        let title = entry.metadata.title.clone().unwrap_or_default();
        let artist = entry.metadata.artist.clone().unwrap_or_default();
        let album = entry.metadata.album.clone().unwrap_or_default();
        let genre = entry.metadata.genre.clone().unwrap_or_default();

        match &entry.record {
            Some(record) => {
                writer.write_record([
                    position.as_str(),
                    path.as_str(),
                    title.as_str(),
                    artist.as_str(),
                    album.as_str(),
                    genre.as_str(),
                    &record.duration_seconds.to_string(),
                    &record.bpm.to_string(),
                    &record.key.to_string(),
                    &record.energy_score.to_string(),
                    &record.mood.get(setforge_features::MoodKind::Dark).to_string(),
                    &record.mood.get(setforge_features::MoodKind::Euphoric).to_string(),
                    &record.mood.get(setforge_features::MoodKind::Driving).to_string(),
                    &record.mood.get(setforge_features::MoodKind::Experimental).to_string(),
                    &record.mood.get(setforge_features::MoodKind::Progressive).to_string(),
                    &record.mood.get(setforge_features::MoodKind::PeakTime).to_string(),
                    &record.spectral_centroid_hz.to_string(),
                    &record.onset_density_per_s.to_string(),
                ])?;
            }
            None => {
                writer.write_record([
                    position.as_str(),
                    path.as_str(),
                    title.as_str(),
                    artist.as_str(),
                    album.as_str(),
                    genre.as_str(),
                    "", "", "", "", "", "", "", "", "", "", "", "",
                ])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FormatError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// DJ-software library export: Rekordbox, Traktor and Serato all nest a
/// `COLLECTION` of tracks plus a `PLAYLISTS` tree referencing them by index,
/// differing mainly in attribute names and key-code notation.
mod xml {
    use super::CamelotCode;
    use setforge_validator::Playlist;
    use std::fmt::Write as _;

    pub fn escape(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    /// Shared skeleton: `root_tag` names the document element, `key_of`
    /// translates a track's Camelot code into that program's own notation.
    pub fn collection_document(
        playlist: &Playlist,
        root_tag: &str,
        key_of: impl Fn(CamelotCode) -> String,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(out, "<{root_tag}>");
        let _ = writeln!(out, r#"  <COLLECTION Entries="{}">"#, playlist.len());

        for (i, entry) in playlist.iter().enumerate() {
            let title = escape(entry.metadata.title.as_deref().unwrap_or(""));
            let artist = escape(entry.metadata.artist.as_deref().unwrap_or(""));
            let album = escape(entry.metadata.album.as_deref().unwrap_or(""));
            let location = escape(&entry.path.display().to_string());
            let (bpm, key, duration) = entry
                .record
                .as_ref()
                .map(|r| (r.bpm, key_of(r.camelot), r.duration_seconds))
                .unwrap_or((0.0, String::new(), 0.0));

            let _ = writeln!(
                out,
                r#"    <TRACK TrackID="{id}" Name="{title}" Artist="{artist}" Album="{album}" Location="{location}" TotalTime="{duration:.0}" AverageBpm="{bpm:.2}" Tonality="{key}"/>"#,
                id = i + 1,
            );
        }

        let _ = writeln!(out, "  </COLLECTION>");
        let _ = writeln!(out, "  <PLAYLISTS>");
        let _ = writeln!(out, r#"    <NODE Type="1" Name="Playlist" Entries="{}">"#, playlist.len());
        for i in 0..playlist.len() {
            let _ = writeln!(out, r#"      <TRACK Key="{}"/>"#, i + 1);
        }
        let _ = writeln!(out, "    </NODE>");
        let _ = writeln!(out, "  </PLAYLISTS>");
        let _ = writeln!(out, "</{root_tag}>");
        out
    }
}

/// Camelot shorthand (e.g. `8B`) is Rekordbox's own key-code notation, so no
/// translation is needed beyond the bijection C1 already owns.
#[must_use]
#[inline]
pub fn to_rekordbox(playlist: &Playlist) -> String {
    xml::collection_document(playlist, "DJ_PLAYLISTS", |code| code.to_string())
}

/// Traktor's Open Key notation shares the Camelot wheel's circle-of-fifths
/// ordering but numbers it from C = 1 instead of C = 8, using `d`/`m`
/// (dur/moll) in place of Camelot's `B`/`A`.
fn traktor_key_code(code: CamelotCode) -> String {
    let number = ((u32::from(code.number) + 4) % 12) + 1;
    let letter = if code.is_minor { 'm' } else { 'd' };
    format!("{number}{letter}")
}

#[must_use]
#[inline]
pub fn to_traktor(playlist: &Playlist) -> String {
    xml::collection_document(playlist, "NML", traktor_key_code)
}

/// Serato's key display follows the same Camelot shorthand as Rekordbox.
#[must_use]
#[inline]
pub fn to_serato(playlist: &Playlist) -> String {
    xml::collection_document(playlist, "SERATO_LIBRARY", |code| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, FeatureFlags, FeatureRecord, KeyName, MoodKind, MoodVector, TrackId, TrackMetadata};
    use setforge_validator::PlaylistEntry;

    fn sample_playlist() -> Playlist {
        let key = KeyName::c_major();
        let record = FeatureRecord {
            track_id: TrackId::new("/a.flac"),
            duration_seconds: 210.0,
            bpm: 128.0,
            key,
            camelot: camelot_of(key),
            energy_score: 6.5,
            rms_loudness_db: -12.0,
            spectral_centroid_hz: 2800.0,
            onset_density_per_s: 3.2,
            mood: MoodVector::new([(MoodKind::Driving, 0.8)]),
            mood_label: MoodKind::Driving,
            mood_confidence: 0.8,
            analyzed_at: 0,
            source_mtime: 0,
            errors: FeatureFlags::empty(),
        };
        let metadata = TrackMetadata {
            title: Some("Track A".to_string()),
            artist: Some("Artist A".to_string()),
            ..Default::default()
        };
        vec![PlaylistEntry::new("/a.flac", record, metadata)]
    }

    #[test]
    fn json_round_trips_through_serde_value() {
        let playlist = sample_playlist();
        let quality = QualityScore {
            percent: 100.0,
            category_scores: Default::default(),
        };
        let json = to_json("My Set", &playlist, &quality, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["playlist_info"]["total_tracks"], 1);
        assert_eq!(value["tracks"][0]["position"], 0);
    }

    #[test]
    fn m3u8_carries_extended_tags() {
        let playlist = sample_playlist();
        let m3u8 = to_m3u8(&playlist);
        assert!(m3u8.starts_with("#EXTM3U\n"));
        assert!(m3u8.contains("#EXTINF:210,Artist A - Track A"));
        assert!(m3u8.contains("#EXTBPM:128.0"));
        assert!(m3u8.contains("/a.flac"));
    }

    #[test]
    fn csv_has_one_data_row_per_track() {
        let playlist = sample_playlist();
        let csv_text = to_csv(&playlist).unwrap();
        assert_eq!(csv_text.lines().count(), 2);
        assert!(csv_text.lines().next().unwrap().starts_with("position,file_path"));
    }

    #[test]
    fn rekordbox_key_is_the_camelot_shorthand() {
        let playlist = sample_playlist();
        let xml = to_rekordbox(&playlist);
        assert!(xml.contains(r#"Tonality="8B""#));
    }

    #[test]
    fn traktor_renumbers_c_major_to_one_d() {
        let playlist = sample_playlist();
        let xml = to_traktor(&playlist);
        assert!(xml.contains(r#"Tonality="1d""#));
    }
}
