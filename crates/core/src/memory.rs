//! In-memory object store
//!
//! A single-process stand-in for the remote store. It paginates like S3
//! (lexicographic key order, opaque continuation token) and can be told to
//! fail individual operations, which makes it the fixture for session and
//! executor tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::stream;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Put,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    failing: HashSet<Operation>,
    /// Break get streams after this many bytes
    stream_failure_after: Option<usize>,
    list_requests: usize,
}

/// Object store backed by in-process maps
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    page_size: usize,
    chunk_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: 1000,
            chunk_size: 8 * 1024,
        }
    }

    /// Cap pages at `page_size` keys regardless of what the caller asks for
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Split downloaded bodies into chunks of `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Create an empty bucket so that listing it succeeds
    pub fn create_bucket(&self, bucket: &str) {
        self.state().buckets.entry(bucket.to_string()).or_default();
    }

    /// Store an object directly, creating the bucket if needed
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.state()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Content of an object, if present
    pub fn contents(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Keys in a bucket, in listing order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every call of `op` fail with `StoreUnavailable`
    pub fn fail(&self, op: Operation) {
        self.state().failing.insert(op);
    }

    /// Undo a previous `fail`
    pub fn recover(&self, op: Operation) {
        self.state().failing.remove(&op);
    }

    /// Make get streams fail after `bytes` bytes have been delivered
    pub fn break_streams_after(&self, bytes: usize) {
        self.state().stream_failure_after = Some(bytes);
    }

    /// Number of list requests served so far (one per page)
    pub fn list_requests(&self) -> usize {
        self.state().list_requests
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(state: &State, op: Operation) -> Result<()> {
        if state.failing.contains(&op) {
            Err(Error::StoreUnavailable(format!(
                "injected failure for {op:?}"
            )))
        } else {
            Ok(())
        }
    }

    fn bucket<'a>(
        state: &'a mut State,
        bucket: &str,
    ) -> Result<&'a mut BTreeMap<String, Vec<u8>>> {
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket '{bucket}'")))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        let mut state = self.state();
        state.list_requests += 1;
        Self::check(&state, Operation::List)?;

        let limit = options
            .max_keys
            .and_then(|m| usize::try_from(m).ok())
            .filter(|m| *m > 0)
            .map_or(self.page_size, |m| m.min(self.page_size));
        let objects = Self::bucket(&mut state, bucket)?;

        let after = options.continuation_token;
        let mut remaining = objects
            .iter()
            .filter(|(key, _)| after.as_deref().is_none_or(|token| key.as_str() > token));

        let items: Vec<ObjectInfo> = remaining
            .by_ref()
            .take(limit)
            .map(|(key, data)| ObjectInfo::new(key.clone(), data.len() as u64))
            .collect();
        let truncated = remaining.next().is_some();
        let continuation_token = if truncated {
            items.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListResult {
            items,
            truncated,
            continuation_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let mut state = self.state();
        Self::check(&state, Operation::Get)?;
        let failure_after = state.stream_failure_after;
        let data = Self::bucket(&mut state, bucket)?
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))?;

        let content_length = Some(data.len() as u64);
        let mut chunks: Vec<Result<Vec<u8>>> = Vec::new();
        let mut delivered = 0usize;
        for chunk in data.chunks(self.chunk_size) {
            if let Some(limit) = failure_after {
                if delivered + chunk.len() > limit {
                    let head = &chunk[..limit - delivered];
                    if !head.is_empty() {
                        chunks.push(Ok(head.to_vec()));
                    }
                    chunks.push(Err(Error::StoreUnavailable(
                        "connection reset while reading body".into(),
                    )));
                    break;
                }
            }
            delivered += chunk.len();
            chunks.push(Ok(chunk.to_vec()));
        }

        Ok(ObjectBody {
            content_length,
            chunks: Box::pin(stream::iter(chunks)),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let mut state = self.state();
        Self::check(&state, Operation::Put)?;
        let info = ObjectInfo::new(key, data.len() as u64);
        Self::bucket(&mut state, bucket)?.insert(key.to_string(), data);
        Ok(info)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.state();
        Self::check(&state, Operation::Delete)?;
        Self::bucket(&mut state, bucket)?.remove(key);
        Ok(())
    }
}
