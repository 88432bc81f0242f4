//! Clip library
//!
//! Clips are identified by the leading digits of their file name
//! (`"12.mp3"`, `"12_take2.wav"` → 12). Files without leading digits or with an
//! unsupported extension never reach the matcher.

use crate::audio::decoder::decode_bytes;
use crate::audio::resampler::normalize_sample_rate;
use crate::audio::AudioClip;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions accepted as clips (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac"];

/// Clips keyed by id
pub type ClipLibrary = BTreeMap<u32, Arc<ClipSource>>;

/// One input clip: raw bytes plus its decoded audio, decoded on first use
pub struct ClipSource {
    pub id: u32,
    pub file_name: String,
    pub raw_bytes: Arc<[u8]>,
    decoded: OnceLock<AudioClip>,
}

impl ClipSource {
    pub fn new(id: u32, file_name: impl Into<String>, raw_bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            raw_bytes: raw_bytes.into(),
            decoded: OnceLock::new(),
        }
    }

    /// Decoded audio at the master sample rate.
    ///
    /// Decodes on the first call and caches the result; a failed decode is not
    /// cached.
    pub fn decoded(&self) -> Result<&AudioClip> {
        if let Some(clip) = self.decoded.get() {
            return Ok(clip);
        }
        let clip = normalize_sample_rate(decode_bytes(Arc::clone(&self.raw_bytes), &self.file_name)?)?;
        Ok(self.decoded.get_or_init(|| clip))
    }

    /// Whether the audio has already been decoded
    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }
}

impl std::fmt::Debug for ClipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipSource")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("size", &self.raw_bytes.len())
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

/// Clip id from a file name: its leading ASCII digits
pub fn clip_id_from_name(file_name: &str) -> Option<u32> {
    let digits: &str = {
        let end = file_name
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(file_name.len());
        &file_name[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Whether `file_name` has a supported clip extension
pub fn has_supported_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Build a library from `(file name, bytes)` pairs.
///
/// Names are processed in sorted order; when two files share an id the first
/// one wins.
pub fn library_from_files<I>(files: I) -> ClipLibrary
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut files: Vec<_> = files.into_iter().collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut library = ClipLibrary::new();
    for (file_name, bytes) in files {
        if !has_supported_extension(&file_name) {
            debug!(file_name = %file_name, "Ignoring file with unsupported extension");
            continue;
        }
        let Some(id) = clip_id_from_name(&file_name) else {
            debug!(file_name = %file_name, "Ignoring file without a numeric id");
            continue;
        };
        if let Some(existing) = library.get(&id) {
            warn!(
                clip_id = id,
                file_name = %file_name,
                kept = %existing.file_name,
                "Duplicate clip id, ignoring file"
            );
            continue;
        }
        library.insert(id, Arc::new(ClipSource::new(id, file_name, bytes)));
    }
    library
}

/// Load every supported clip directly inside `dir`
pub fn scan_directory(dir: &Path) -> Result<ClipLibrary> {
    if !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Clip directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping file with non UTF-8 name");
            continue;
        };
        if !has_supported_extension(&file_name) || clip_id_from_name(&file_name).is_none() {
            debug!(file_name = %file_name, "Skipping non-clip file");
            continue;
        }
        let bytes = std::fs::read(entry.path())?;
        files.push((file_name, bytes));
    }

    let library = library_from_files(files);
    info!(dir = %dir.display(), clips = library.len(), "Clip library loaded");
    Ok(library)
}
