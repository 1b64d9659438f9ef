//! Directory-backed storage substrate.
//!
//! One JSON file per raw key. Key characters outside `[A-Za-z0-9_-]` are
//! percent-encoded into the file name so any key round-trips. Keys whose
//! encoded form is too long for a file name are stored under `~<sha256>.json`
//! with the encoded key on the file's first line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

use super::{Result, Storage, StorageError};

const FILE_EXTENSION: &str = ".json";

/// Marks digest-named files; never produced by `encode_key`.
const HASHED_MARKER: char = '~';

/// Longest encoded key stored verbatim. Leaves room for the extension and the
/// temp-file decoration under the common 255-byte name limit.
const MAX_PLAIN_STEM: usize = 200;

/// Where a key lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileName {
    /// File name is the encoded key
    Plain(String),
    /// File name is a digest; `header` is the encoded key stored inside
    Hashed { file: String, header: String },
}

impl FileName {
    fn for_key(key: &str) -> Self {
        let stem = encode_key(key);
        if stem.len() <= MAX_PLAIN_STEM {
            return FileName::Plain(format!("{}{}", stem, FILE_EXTENSION));
        }
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        FileName::Hashed {
            file: format!("{}{}{}", HASHED_MARKER, digest, FILE_EXTENSION),
            header: stem,
        }
    }

    fn file(&self) -> &str {
        match self {
            FileName::Plain(file) | FileName::Hashed { file, .. } => file,
        }
    }
}

// == File Storage ==
/// Stores each key as a file inside a directory, with an optional byte quota.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Refuses writes that would push the directory past `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// XDG-compliant cache directory (`~/.cache/motor_cache/` on Linux).
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "motor_cache").map(|dirs| dirs.cache_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &FileName) -> PathBuf {
        self.dir.join(name.file())
    }

    /// Reads the encoded key from the first line of a digest-named file.
    fn read_header(&self, path: &Path) -> Result<Option<String>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut line = String::new();
        match BufReader::new(file).read_line(&mut line) {
            Ok(_) => Ok(line.strip_suffix('\n').and_then(decode_stem)),
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Total size of stored files, skipping `exclude`.
    fn used_bytes_excluding(&self, exclude: &Path) -> Result<u64> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path == exclude || !is_store_file(&entry.file_name().to_string_lossy()) {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let name = FileName::for_key(key);
        let content = match fs::read_to_string(self.path_for(&name)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                // Not UTF-8: hand back something that fails to parse so the
                // cache treats it as a corrupt entry.
                return Ok(Some(String::new()));
            }
            Err(e) => return Err(e.into()),
        };

        match &name {
            FileName::Plain(_) => Ok(Some(content)),
            FileName::Hashed { header, .. } => match content.split_once('\n') {
                Some((stored, value)) if stored == header => Ok(Some(value.to_string())),
                // Digest collision or damaged header: not this key
                _ => Ok(None),
            },
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let name = FileName::for_key(key);
        let path = self.path_for(&name);
        let content = match &name {
            FileName::Plain(_) => value.to_string(),
            FileName::Hashed { header, .. } => format!("{}\n{}", header, value),
        };

        if let Some(quota) = self.quota_bytes {
            let used = self.used_bytes_excluding(&path)?;
            if used + content.len() as u64 > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        // Write then rename so readers never see a half-written file
        let tmp = self.dir.join(format!(".{}.tmp", name.file()));
        let written = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            // Temp files sit outside the quota; never leave one behind
            let _ = fs::remove_file(&tmp);
            return Err(classify_write_error(e));
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(&FileName::for_key(key))) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let key = if file_name.starts_with(HASHED_MARKER) && is_store_file(&file_name) {
                self.read_header(&entry.path())?
            } else {
                decode_file_name(&file_name)
            };
            keys.extend(key);
        }
        keys.sort();
        Ok(keys)
    }
}

/// A full disk is the file-system flavour of a quota failure.
fn classify_write_error(e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::StorageFull => StorageError::QuotaExceeded,
        _ => StorageError::Io(e),
    }
}

/// True for files this store owns: entry files, not temp or foreign files.
fn is_store_file(name: &str) -> bool {
    !name.starts_with('.') && name.ends_with(FILE_EXTENSION)
}

fn encode_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

fn decode_file_name(name: &str) -> Option<String> {
    if !is_store_file(name) || name.starts_with(HASHED_MARKER) {
        return None;
    }
    decode_stem(name.strip_suffix(FILE_EXTENSION)?)
}

fn decode_stem(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let digits = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(digits, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
