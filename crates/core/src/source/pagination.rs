//! Server-driven pagination as a lazy stream of pages.

use std::future::Future;

use futures::stream::{self, Stream, TryStreamExt};

/// One page of records plus the server's continuation flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

/// Lazily walk pages 1, 2, 3, ... until a page reports `has_more == false`.
///
/// Pages are requested strictly one after another because the cursor is
/// driven by the previous response. The stream ends after the first error.
pub fn paginate<T, E, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>, E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    stream::try_unfold((fetch, Some(1u32)), |(mut fetch, next)| async move {
        let Some(page_number) = next else {
            return Ok::<_, E>(None);
        };
        let page = fetch(page_number).await?;
        let next = page.has_more.then(|| page_number + 1);
        Ok(Some((page, (fetch, next))))
    })
}

/// Drain [`paginate`] into a single list, failing on the first page error.
pub async fn collect_pages<T, E, F, Fut>(fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    paginate(fetch)
        .try_fold(Vec::new(), |mut items, page| async move {
            items.extend(page.items);
            Ok::<_, E>(items)
        })
        .await
}
