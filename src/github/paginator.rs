//! Link-header pagination over [`GithubClient`].
//!
//! A page that fails to load ends the listing: callers get whatever was
//! collected up to that point, so a short list may be a partial one.

use crate::github::cache::RequestOptions;
use crate::github::client::GithubClient;
use futures::{stream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub const PAGE_SIZE: u32 = 100;

/// Where a page keeps its items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageItems {
    /// The body is the array of items.
    Root,
    /// The body is an object holding the array under this field.
    Field(&'static str),
}

/// Streams every item of a listing, fetching one page at a time.
pub fn paginate<'a, T>(
    client: &'a GithubClient,
    endpoint: &'a str,
    items: PageItems,
) -> impl Stream<Item = T> + 'a
where
    T: DeserializeOwned + 'a,
{
    stream::unfold(Some(1u32), move |page| async move {
        let page = page?;
        let (batch, has_next) = fetch_page::<T>(client, endpoint, items, page).await?;
        Some((batch, has_next.then_some(page + 1)))
    })
    .flat_map(stream::iter)
}

pub async fn fetch_all<T: DeserializeOwned>(
    client: &GithubClient,
    endpoint: &str,
    items: PageItems,
) -> Vec<T> {
    paginate(client, endpoint, items).collect().await
}

async fn fetch_page<T: DeserializeOwned>(
    client: &GithubClient,
    endpoint: &str,
    items: PageItems,
    page: u32,
) -> Option<(Vec<T>, bool)> {
    let options = RequestOptions::page(PAGE_SIZE, page);
    let response = match client.get(endpoint, Some(&options)).await {
        Ok(response) if response.is_ok() => response,
        Ok(response) => {
            warn!(%endpoint, page, status = response.status, "Stopped paginating, results may be partial");
            return None;
        }
        Err(e) => {
            warn!(%endpoint, page, error = %e, "Stopped paginating, results may be partial");
            return None;
        }
    };

    let has_next = response.has_next_page();
    let values = match (items, response.data) {
        (PageItems::Root, Value::Array(values)) => values,
        (PageItems::Field(field), Value::Object(mut object)) => match object.remove(field) {
            Some(Value::Array(values)) => values,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    let batch = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(%endpoint, page, error = %e, "Skipping malformed item");
                None
            }
        })
        .collect();
    Some((batch, has_next))
}
