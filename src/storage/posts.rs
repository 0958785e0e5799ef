use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use thiserror::Error;
use time::Date;

use super::{corrupt_backup_key, seed, StorageHandle, POSTS_KEY};
use crate::config::CorruptBlobPolicy;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub content: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub categories: Vec<String>,
}

impl PostRecord {
    pub fn has_category(&self, category: &str) -> bool {
        let wanted = category.to_lowercase();
        self.categories
            .iter()
            .any(|candidate| candidate.to_lowercase() == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub date: Date,
    pub content: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("posts blob '{key}' is corrupt")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    Seeded { count: usize },
    Recovered { backup_key: String, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct PostStore {
    posts: Vec<PostRecord>,
}

impl PostStore {
    pub fn from_posts(posts: Vec<PostRecord>) -> Self {
        Self { posts }
    }

    pub fn load(storage: &StorageHandle) -> Result<(Self, LoadOutcome)> {
        let raw = storage
            .read_blob(POSTS_KEY)
            .context("reading posts blob")?
            .filter(|raw| !raw.trim().is_empty());
        let Some(raw) = raw else {
            let store = Self::from_posts(seed::seed_posts());
            store.save(storage).context("persisting seed posts")?;
            tracing::info!(count = store.len(), "seeded first-run posts");
            let count = store.len();
            return Ok((store, LoadOutcome::Seeded { count }));
        };

        match serde_json::from_str::<Vec<PostRecord>>(&raw) {
            Ok(posts) => {
                let count = posts.len();
                tracing::debug!(count, "loaded posts blob");
                Ok((Self::from_posts(posts), LoadOutcome::Loaded { count }))
            }
            Err(err) => match storage.options().on_corrupt {
                CorruptBlobPolicy::Fail => Err(StoreError::Corrupt {
                    key: POSTS_KEY.to_string(),
                    source: err,
                }
                .into()),
                CorruptBlobPolicy::Reset => {
                    let backup_key = corrupt_backup_key(POSTS_KEY);
                    storage
                        .write_blob(&backup_key, &raw)
                        .with_context(|| format!("backing up corrupt posts blob to {backup_key}"))?;
                    tracing::warn!(?err, %backup_key, "posts blob is corrupt, starting empty");
                    Ok((
                        Self::default(),
                        LoadOutcome::Recovered {
                            backup_key,
                            reason: err.to_string(),
                        },
                    ))
                }
            },
        }
    }

    pub fn save(&self, storage: &StorageHandle) -> Result<()> {
        let json = serde_json::to_string(&self.posts).context("serialising posts")?;
        storage
            .write_blob(POSTS_KEY, &json)
            .context("writing posts blob")
    }

    pub fn next_id(&self) -> Option<i64> {
        match self.posts.iter().map(|post| post.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    pub fn create(&mut self, storage: &StorageHandle, draft: NewPost) -> Result<PostRecord> {
        let id = self
            .next_id()
            .ok_or_else(|| anyhow!("no post id left after {}", i64::MAX))
            .with_context(|| format!("creating post \"{}\"", draft.title))?;
        let record = PostRecord {
            id,
            title: draft.title,
            date: draft.date,
            content: draft.content,
            categories: draft.categories,
        };
        self.posts.insert(0, record.clone());
        if let Err(err) = self.save(storage) {
            self.posts.remove(0);
            return Err(err.context(format!("persisting post #{}", record.id)));
        }
        tracing::info!(id = record.id, title = %record.title, "created post");
        Ok(record)
    }

    pub fn find(&self, id: i64) -> Option<&PostRecord> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut distinct: IndexMap<String, String> = IndexMap::new();
        for category in self.posts.iter().flat_map(|post| post.categories.iter()) {
            let trimmed = category.trim();
            if trimmed.is_empty() {
                continue;
            }
            distinct
                .entry(trimmed.to_lowercase())
                .or_insert_with(|| trimmed.to_string());
        }
        distinct.sort_by(|a_key, a, b_key, b| a_key.cmp(b_key).then_with(|| a.cmp(b)));
        distinct.into_values().collect()
    }

    pub fn clear(storage: &StorageHandle) -> Result<()> {
        storage
            .remove_blob(POSTS_KEY)
            .context("clearing posts blob")?;
        tracing::info!("cleared posts blob");
        Ok(())
    }
}
