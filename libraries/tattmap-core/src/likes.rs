//! Like aggregation for result pages

use crate::error::Result;
use crate::traits::LikeCounter;
use crate::types::{Artist, ArtistWithLikes, UserId};

/// Attach like counts to a page of artists with a single grouped lookup.
///
/// Order is preserved and artists nobody liked get `0`. An empty page does
/// not touch the counter.
pub async fn attach_like_counts(
    counter: &dyn LikeCounter,
    artists: Vec<Artist>,
) -> Result<Vec<ArtistWithLikes>> {
    if artists.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<UserId> = artists.iter().map(|a| a.user_id.clone()).collect();
    let counts = counter.count_likes(&ids).await?;

    Ok(artists
        .into_iter()
        .map(|artist| {
            let likes = counts.get(&artist.user_id).copied().unwrap_or(0);
            ArtistWithLikes { artist, likes }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCounts {
        counts: HashMap<UserId, i64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LikeCounter for FixedCounts {
        async fn count_likes(&self, _ids: &[UserId]) -> Result<HashMap<UserId, i64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.counts.clone())
        }
    }

    fn artist(user_id: &str) -> Artist {
        Artist {
            user_id: UserId::new(user_id),
            ..Artist::default()
        }
    }

    #[tokio::test]
    async fn test_missing_counts_default_to_zero() {
        let counter = FixedCounts {
            counts: HashMap::from([(UserId::new("b"), 3)]),
            calls: AtomicUsize::new(0),
        };

        let page = attach_like_counts(&counter, vec![artist("a"), artist("b")])
            .await
            .unwrap();

        assert_eq!(page[0].artist.user_id.as_str(), "a");
        assert_eq!(page[0].likes, 0);
        assert_eq!(page[1].likes, 3);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_page_skips_lookup() {
        let counter = FixedCounts {
            counts: HashMap::new(),
            calls: AtomicUsize::new(0),
        };

        let page = attach_like_counts(&counter, Vec::new()).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }
}
