use std::{
    fmt, fs,
    io::{self, BufReader, BufWriter, Write},
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, StoreErr};

const VERSIONS_DIR: &str = "versions";
const CURRENT_FILE: &str = "CURRENT";
const STAGING_PREFIX: &str = ".staging-";

/// A published set of artifacts.
///
/// Ids look like `v<epoch millis, 13 digits>-<8 hex digits>`, so ordering
/// by id is ordering by publish time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    id: String,
    published_at_ms: u64,
}

impl Version {
    fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        let suffix: u32 = rand::random();

        Self {
            id: format!("v{millis:013}-{suffix:08x}"),
            published_at_ms: millis,
        }
    }

    /// Parses a version id.
    ///
    /// # Returns
    /// `None` if `id` is not a well formed version id.
    pub fn parse(id: &str) -> Option<Self> {
        let (millis, suffix) = id.strip_prefix('v')?.split_once('-')?;

        let well_formed = millis.len() == 13
            && millis.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == 8
            && suffix.bytes().all(|b| b.is_ascii_hexdigit());

        if !well_formed {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            published_at_ms: millis.parse().ok()?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn published_at_ms(&self) -> u64 {
        self.published_at_ms
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A directory of versioned JSON artifacts with a `CURRENT` pointer.
///
/// Writers build a version in a private staging directory and publish it
/// with two renames, so readers only ever see complete versions.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens a store, creating its directories if needed.
    ///
    /// # Arguments
    /// * `root` - The store's root directory.
    ///
    /// # Errors
    /// `StoreErr::Io` if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let versions = root.join(VERSIONS_DIR);
        fs::create_dir_all(&versions).map_err(StoreErr::io(&versions))?;

        Ok(Self { root })
    }

    fn version_dir(&self, version: &Version) -> PathBuf {
        self.root.join(VERSIONS_DIR).join(version.id())
    }

    /// Starts writing a new version.
    ///
    /// # Returns
    /// A `Staging` that becomes visible only after `Staging::commit`.
    pub fn stage(&self) -> Result<Staging> {
        let version = Version::generate();
        let dir = self.root.join(format!("{STAGING_PREFIX}{}", version.id()));
        fs::create_dir(&dir).map_err(StoreErr::io(&dir))?;

        log::debug!("staging model version {version} in {}", dir.display());

        Ok(Staging {
            root: self.root.clone(),
            version,
            dir,
            committed: false,
        })
    }

    /// Returns the active version.
    ///
    /// # Returns
    /// `None` if nothing has been published yet.
    ///
    /// # Errors
    /// `StoreErr::UnknownVersion` if `CURRENT` names a version that doesn't exist.
    pub fn current(&self) -> Result<Option<Version>> {
        let path = self.root.join(CURRENT_FILE);
        let id = match fs::read_to_string(&path) {
            Ok(id) => id,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreErr::Io { path, source: e }),
        };

        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        self.version(id).map(Some)
    }

    /// Resolves a published version by id.
    ///
    /// # Errors
    /// `StoreErr::UnknownVersion` if `id` is malformed or was never published.
    pub fn version(&self, id: &str) -> Result<Version> {
        let version = Version::parse(id).ok_or_else(|| StoreErr::UnknownVersion(id.to_string()))?;

        if !self.version_dir(&version).is_dir() {
            return Err(StoreErr::UnknownVersion(id.to_string()));
        }

        Ok(version)
    }

    /// Lists the published versions, oldest first.
    pub fn versions(&self) -> Result<Vec<Version>> {
        let dir = self.root.join(VERSIONS_DIR);
        let entries = fs::read_dir(&dir).map_err(StoreErr::io(&dir))?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreErr::io(&dir))?;
            let Some(version) = entry.file_name().to_str().and_then(Version::parse) else {
                continue;
            };
            if entry.path().is_dir() {
                versions.push(version);
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Reads an artifact of a published version.
    ///
    /// # Arguments
    /// * `version` - The version to read from.
    /// * `name` - The artifact name, without extension.
    ///
    /// # Errors
    /// `StoreErr::Io` if the file can't be opened, `StoreErr::Serde` if it
    /// doesn't deserialize into `T`.
    pub fn load<T: DeserializeOwned>(&self, version: &Version, name: &str) -> Result<T> {
        check_name(name)?;
        let path = self.version_dir(version).join(format!("{name}.json"));
        let file = fs::File::open(&path).map_err(StoreErr::io(&path))?;

        serde_json::from_reader(BufReader::new(file)).map_err(StoreErr::serde(&path))
    }

    /// Deletes the oldest versions until at most `keep` remain.
    ///
    /// Only versions strictly older than the current one are deleted. A
    /// newer version may already be in `versions/` while its writer has yet
    /// to swap `CURRENT`, so it must survive.
    ///
    /// # Returns
    /// The deleted versions.
    pub fn prune(&self, keep: usize) -> Result<Vec<Version>> {
        let Some(current) = self.current()? else {
            return Ok(Vec::new());
        };
        let versions = self.versions()?;
        let mut excess = versions.len().saturating_sub(keep);

        let mut removed = Vec::new();
        for version in versions {
            if excess == 0 || version >= current {
                break;
            }

            let dir = self.version_dir(&version);
            fs::remove_dir_all(&dir).map_err(StoreErr::io(&dir))?;
            removed.push(version);
            excess -= 1;
        }

        if !removed.is_empty() {
            log::info!("pruned {} old model versions", removed.len());
        }

        Ok(removed)
    }
}

/// An unpublished version being written.
///
/// Dropping it without calling `commit` discards everything written.
#[derive(Debug)]
pub struct Staging {
    root: PathBuf,
    version: Version,
    dir: PathBuf,
    committed: bool,
}

impl Staging {
    /// Serializes `value` as the artifact `name` and syncs it to disk.
    ///
    /// # Errors
    /// `StoreErr::InvalidName` if `name` isn't a plain file stem, otherwise
    /// any io or serialization failure.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        check_name(name)?;
        let path = self.dir.join(format!("{name}.json"));
        let file = fs::File::create(&path).map_err(StoreErr::io(&path))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value).map_err(StoreErr::serde(&path))?;
        writer.flush().map_err(StoreErr::io(&path))?;

        let file = writer
            .into_inner()
            .map_err(|e| StoreErr::Io {
                path: path.clone(),
                source: e.into_error(),
            })?;
        file.sync_all().map_err(StoreErr::io(&path))?;

        log::debug!("wrote artifact {name} for version {}", self.version);
        Ok(())
    }

    /// Publishes the staged version and makes it current.
    ///
    /// The version directory is moved into place first and `CURRENT` is
    /// replaced afterwards, so `CURRENT` never names an incomplete version.
    pub fn commit(mut self) -> Result<Version> {
        let target = self.root.join(VERSIONS_DIR).join(self.version.id());
        fs::rename(&self.dir, &target).map_err(StoreErr::io(&target))?;
        self.committed = true;

        let pointer = self.root.join(CURRENT_FILE);
        let tmp = self
            .root
            .join(format!("{CURRENT_FILE}.{}.tmp", self.version.id()));

        let swap = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(self.version.id().as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &pointer)
        };

        if let Err(e) = swap() {
            let _ = fs::remove_file(&tmp);
            return Err(StoreErr::Io {
                path: pointer,
                source: e,
            });
        }

        log::info!("published model version {}", self.version);
        Ok(self.version.clone())
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        if let Err(e) = fs::remove_dir_all(&self.dir) {
            log::warn!(
                "failed to discard staging dir {}: {e}",
                self.dir.display()
            );
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if !plain {
        return Err(StoreErr::InvalidName(name.to_string()));
    }

    Ok(())
}
