use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-resume mutexes. Audit appends and revert's read-modify-append for one
/// resume run one at a time; different resumes never contend.
#[derive(Clone, Default)]
pub struct ResumeLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl ResumeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, resume_id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            map.entry(resume_id).or_default().clone()
        };
        slot.lock_owned().await
    }
}
