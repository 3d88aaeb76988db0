//! Lazy, forward-only page streams.
//!
//! A page is requested only when the consumer polls for it. The stream ends
//! after the first page shorter than the requested size, so an exact multiple
//! of the page size costs one extra, empty request. Streams are not restartable.

use std::future::Future;

use futures::stream::{self, Stream};

use super::error::{GatewayError, GatewayResult};
use super::model::{PullRequest, Repository};
use super::PlatformGateway;

/// Build a page stream from a `fetch(page)` function. Pages are 1-based.
pub fn paginate<'a, T, F, Fut>(
    page_size: u32,
    fetch: F,
) -> impl Stream<Item = GatewayResult<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = GatewayResult<Vec<T>>> + 'a,
{
    stream::try_unfold((fetch, Some(1u32)), move |(mut fetch, next)| async move {
        let Some(page) = next else {
            return Ok::<_, GatewayError>(None);
        };
        let items = fetch(page).await?;
        let next = if items.len() < page_size as usize {
            None
        } else {
            Some(page + 1)
        };
        Ok(Some((items, (fetch, next))))
    })
}

/// Pages of organization repositories.
pub fn organization_repositories<'a>(
    gateway: &'a dyn PlatformGateway,
    page_size: u32,
) -> impl Stream<Item = GatewayResult<Vec<Repository>>> + 'a {
    paginate(page_size, move |page| {
        gateway.organization_repositories(page, page_size)
    })
}

/// Pages of open pull requests of `repository`.
pub fn open_pull_requests<'a>(
    gateway: &'a dyn PlatformGateway,
    repository: &'a Repository,
    page_size: u32,
) -> impl Stream<Item = GatewayResult<Vec<PullRequest>>> + 'a {
    paginate(page_size, move |page| {
        gateway.open_pull_requests(repository, page, page_size)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn collect_pages(total: u32, page_size: u32) -> (Vec<Vec<u32>>, u32) {
        let calls = AtomicU32::new(0);
        let pages = paginate(page_size, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let start = (page - 1) * page_size;
                let end = (start + page_size).min(total);
                Ok::<_, GatewayError>((start..end.max(start)).collect::<Vec<u32>>())
            }
        });
        let collected: Vec<Vec<u32>> = pages.try_collect().await.unwrap();
        (collected, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_stops_after_short_page() {
        let (pages, calls) = collect_pages(25, 10).await;
        assert_eq!(calls, 3);
        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_exact_multiple_costs_one_empty_request() {
        let (pages, calls) = collect_pages(20, 10).await;
        assert_eq!(calls, 3);
        assert!(pages[2].is_empty());
    }

    #[tokio::test]
    async fn test_pages_are_fetched_lazily() {
        let calls = AtomicU32::new(0);
        let pages = paginate(2, |_page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, GatewayError>(vec![1, 2]) }
        });
        futures::pin_mut!(pages);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let first = pages.try_next().await.unwrap();
        assert_eq!(first, Some(vec![1, 2]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_yielded() {
        let pages = paginate(10, |_page| async {
            Err::<Vec<u32>, _>(GatewayError::Transport("reset".to_string()))
        });
        futures::pin_mut!(pages);
        assert!(pages.try_next().await.is_err());
    }
}
