//! Flat-file CSV backend for the profile store.
//!
//! One append-only file, header row present, one row per completed profile
//! submission. Every field is either numeric or a closed enum token, so no
//! value ever contains a comma and no quoting layer is needed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::profile::{ActivityLevel, Goal, Profile, Sex};
use crate::store::traits::ProfileStore;

/// Exact column layout of the storage file.
pub const HEADER: &str = "user_id,sex,weight,height,age,activity_level,goal,calories";

/// CSV-file-backed profile store.
///
/// Single writer per process; appends are serialized through an internal
/// lock so interleaved submissions never tear a row.
pub struct CsvProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvProfileStore {
    /// Open the store at `path`, creating the file (and parent directories)
    /// with a header row if it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                // Sanity-check the header so a foreign file isn't appended to.
                let contents = tokio::fs::read_to_string(&path).await?;
                if let Some(first) = contents.lines().next()
                    && first.trim() != HEADER
                {
                    return Err(StorageError::BadHeader(first.trim().to_string()));
                }
            }
            _ => {
                tokio::fs::write(&path, format!("{HEADER}\n")).await?;
                tracing::info!(path = %path.display(), "Created new profile store");
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for CsvProfileStore {
    async fn append(&self, profile: &Profile) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", encode_row(profile)).as_bytes())
            .await?;
        file.flush().await?;

        tracing::debug!(user_id = %profile.user_id, "Appended profile record");
        Ok(())
    }

    async fn latest_valid_for(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;

        // Newest rows are at the end; scan backwards, skipping the header.
        let rows: Vec<&str> = contents.lines().skip(1).collect();
        for line in rows.into_iter().rev() {
            if line.trim().is_empty() {
                continue;
            }
            match decode_row(line) {
                Some(profile) if profile.user_id == user_id => return Ok(Some(profile)),
                Some(_) => continue,
                None => {
                    tracing::debug!(row = line, "Skipping malformed profile row");
                }
            }
        }
        Ok(None)
    }
}

fn encode_row(p: &Profile) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        p.user_id,
        p.sex.as_token(),
        p.weight_kg,
        p.height_cm,
        p.age_years,
        p.activity.as_token(),
        p.goal.as_token(),
        p.calories.map(|c| c.to_string()).unwrap_or_default(),
    )
}

/// Parse one row. Returns `None` for any row that is missing fields or has
/// a non-coercible value — the caller skips it and keeps scanning.
fn decode_row(line: &str) -> Option<Profile> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 8 {
        return None;
    }

    let user_id = fields[0];
    if user_id.is_empty() {
        return None;
    }

    let calories = if fields[7].is_empty() {
        None
    } else {
        Some(fields[7].parse::<u32>().ok()?)
    };

    Some(Profile {
        user_id: user_id.to_string(),
        sex: Sex::from_token(fields[1])?,
        weight_kg: fields[2].parse().ok()?,
        height_cm: fields[3].parse().ok()?,
        age_years: fields[4].parse().ok()?,
        activity: ActivityLevel::from_token(fields[5])?,
        goal: Goal::from_token(fields[6])?,
        calories,
    })
}
