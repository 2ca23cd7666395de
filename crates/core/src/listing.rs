//! Full bucket listing
//!
//! Follows continuation tokens until the store reports the listing complete,
//! so callers always see every object regardless of page size.

use crate::error::Result;
use crate::traits::{ListOptions, ObjectInfo, ObjectStore};

/// Maximum keys requested per page
pub const PAGE_SIZE: i32 = 1000;

/// Snapshot of a bucket's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Empty,
    NonEmpty(Vec<ObjectInfo>),
}

impl Listing {
    pub fn objects(&self) -> &[ObjectInfo] {
        match self {
            Listing::Empty => &[],
            Listing::NonEmpty(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty)
    }

    pub fn total_size(&self) -> u64 {
        self.objects().iter().map(|o| o.size_bytes).sum()
    }
}

impl From<Vec<ObjectInfo>> for Listing {
    fn from(items: Vec<ObjectInfo>) -> Self {
        if items.is_empty() {
            Listing::Empty
        } else {
            Listing::NonEmpty(items)
        }
    }
}

/// List every object in `bucket`, aggregating all pages in server order
pub async fn list_all<S>(store: &S, bucket: &str) -> Result<Listing>
where
    S: ObjectStore + ?Sized,
{
    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let options = ListOptions {
            max_keys: Some(PAGE_SIZE),
            continuation_token: continuation_token.take(),
        };

        let page = store.list_objects(bucket, options).await?;
        pages += 1;
        items.extend(page.items);

        if !page.truncated {
            break;
        }
        match page.continuation_token {
            Some(token) => continuation_token = Some(token),
            None => {
                tracing::warn!(bucket, "truncated listing without continuation token");
                break;
            }
        }
    }

    tracing::debug!(bucket, pages, objects = items.len(), "listed bucket");
    Ok(Listing::from(items))
}
