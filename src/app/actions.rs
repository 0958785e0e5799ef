use anyhow::Result;

use crate::storage::{NewPost, PostRecord, PostStore, StorageHandle};
use crate::theme::{self, DisplayMode};

pub struct ActionDispatcher<'a> {
    storage: &'a StorageHandle,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(storage: &'a StorageHandle) -> Self {
        Self { storage }
    }

    pub fn create_post(&self, store: &mut PostStore, draft: NewPost) -> Result<PostRecord> {
        store.create(self.storage, draft)
    }

    pub fn toggle_display_mode(&self, current: DisplayMode) -> Result<DisplayMode> {
        theme::toggle(self.storage, current)
    }

    pub fn reset_posts(&self) -> Result<()> {
        PostStore::clear(self.storage)
    }
}
