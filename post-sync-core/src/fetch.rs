use std::future::Future;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::ListPage;

/// Drain a cursor-paginated listing, concatenating results in order.
///
/// `list` is called with `None` first and then with each `next_cursor` until a
/// response reports no further pages. Any error aborts the whole listing.
pub async fn fetch_all<T, F, Fut>(label: &str, mut list: F) -> Result<Vec<T>, FetchError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage<T>, FetchError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut requests = 0usize;

    loop {
        let page = list(cursor.take()).await?;
        requests += 1;
        debug!(listing = label, request = requests, count = page.results.len(), has_more = page.has_more, "Fetched listing page");
        items.extend(page.results);

        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            (true, None) => {
                warn!(listing = label, "Listing reported more results without a cursor, stopping");
                break;
            }
            (false, _) => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn concatenates_pages_in_order() {
        let seen = Mutex::new(Vec::new());
        let items = fetch_all("numbers", |cursor: Option<String>| {
            seen.lock().unwrap().push(cursor.clone());
            async move {
                let page = match cursor.as_deref() {
                    None => ListPage::more(vec![1, 2], "c1"),
                    Some("c1") => ListPage::more(vec![3], "c2"),
                    Some("c2") => ListPage::last(vec![4, 5]),
                    Some(other) => {
                        return Err::<ListPage<i32>, FetchError>(
                            format!("unexpected cursor {other}").into(),
                        )
                    }
                };
                Ok(page)
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn error_on_a_later_page_fails_the_listing() {
        let result = fetch_all("numbers", |cursor: Option<String>| async move {
            match cursor {
                None => Ok(ListPage::more(vec![1], "c1")),
                Some(_) => Err::<ListPage<i32>, FetchError>("rate limited".into()),
            }
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "rate limited");
    }

    #[tokio::test]
    async fn missing_cursor_ends_the_listing() {
        let mut calls = 0;
        let items = fetch_all("numbers", |_cursor: Option<String>| {
            calls += 1;
            async {
                Ok::<_, FetchError>(ListPage {
                    results: vec![7],
                    has_more: true,
                    next_cursor: None,
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![7]);
        assert_eq!(calls, 1);
    }
}
