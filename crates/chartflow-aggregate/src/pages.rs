//! Page sources.
//!
//! The dashboard's REST client returns one page per request together with a
//! continuation token; [`paginate`] turns such a fetcher into a
//! [`PageStream`]. [`from_pages`] serves pages that are already in memory.

use std::future::Future;

use chartflow_core::BoxError;
use futures::stream::{self, StreamExt};

use crate::fetch::PageStream;

/// One page returned by a token-paginated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<P> {
    /// Points on this page.
    pub items: Vec<P>,
    /// Token for the next page; `None` or empty on the last page.
    pub next_page_token: Option<String>,
}

impl<P> Page<P> {
    /// Creates the last page.
    pub fn last(items: Vec<P>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// Creates a page followed by another one.
    pub fn with_next(items: Vec<P>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(token.into()),
        }
    }
}

/// Serves in-memory pages in order.
pub fn from_pages<P: Send + 'static>(pages: Vec<Vec<P>>) -> PageStream<P> {
    stream::iter(pages.into_iter().map(Ok)).boxed()
}

/// A source that yields no pages at all.
pub fn empty<P: Send + 'static>() -> PageStream<P> {
    stream::empty().boxed()
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Drives a token-paginated fetcher until it stops returning a token.
///
/// `fetch_page` receives `None` for the first request and the previous
/// page's token afterwards. A failed request is yielded once and ends the
/// stream.
pub fn paginate<P, F, Fut>(fetch_page: F) -> PageStream<P>
where
    P: Send + 'static,
    F: FnMut(Option<String>) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<Page<P>, BoxError>> + Send + 'static,
{
    stream::unfold(
        (fetch_page, Cursor::Start),
        |(mut fetch_page, cursor)| async move {
            let token = match cursor {
                Cursor::Done => return None,
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            match fetch_page(token).await {
                Ok(page) => {
                    let next = match page.next_page_token {
                        Some(token) if !token.is_empty() => Cursor::Next(token),
                        _ => Cursor::Done,
                    };
                    Some((Ok(page.items), (fetch_page, next)))
                }
                Err(e) => Some((Err(e), (fetch_page, Cursor::Done))),
            }
        },
    )
    .boxed()
}
