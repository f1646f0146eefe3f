//! Visibility and ownership rules
//!
//! Everything here is pure: the decisions depend only on the records passed
//! in and the moment `now`, never on the database.

use chrono::{DateTime, Utc};

use crate::models::{PostScope, PostWithMeta, User};

/// Whether the public may see `post` at `now`.
///
/// A post is visible when it is published, its publication date is not in
/// the future and it either has no category or its category is published.
/// `repositories::post::VISIBLE_CONDITION` is the SQL form of this rule.
pub fn is_publicly_visible(post: &PostWithMeta, now: DateTime<Utc>) -> bool {
    post.post.is_published
        && post.post.pub_date <= now
        && post.category.as_ref().map_or(true, |c| c.is_published)
}

/// Whether `viewer` wrote the record owned by `author_id`
pub fn is_author(viewer: Option<&User>, author_id: i64) -> bool {
    viewer.is_some_and(|user| user.id == author_id)
}

/// Whether `viewer` may open the detail page of `post`.
///
/// Authors always see their own posts so they can preview scheduled and
/// unpublished ones.
pub fn can_view(viewer: Option<&User>, post: &PostWithMeta, now: DateTime<Utc>) -> bool {
    is_author(viewer, post.post.author_id) || is_publicly_visible(post, now)
}

/// Keep the posts `viewer` is allowed to see, preserving their order
pub fn visible_posts_for<I>(
    viewer: Option<&User>,
    posts: I,
    now: DateTime<Utc>,
) -> Vec<PostWithMeta>
where
    I: IntoIterator<Item = PostWithMeta>,
{
    posts
        .into_iter()
        .filter(|post| can_view(viewer, post, now))
        .collect()
}

/// Which of `owner_id`'s posts a profile page lists to `viewer`
pub fn profile_scope(viewer: Option<&User>, owner_id: i64, now: DateTime<Utc>) -> PostScope {
    if is_author(viewer, owner_id) {
        PostScope::All
    } else {
        PostScope::Visible(now)
    }
}

/// Outcome of an edit or delete attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// The actor owns the record
    Allow,
    /// Anyone else is sent back to the post page without an error
    RedirectToView,
}

/// Decide whether `actor` may change a post or comment written by `author_id`
pub fn authorize_mutation(actor: Option<&User>, author_id: i64) -> Authorization {
    if is_author(actor, author_id) {
        Authorization::Allow
    } else {
        Authorization::RedirectToView
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, PostCategory};
    use chrono::Duration;
    use proptest::prelude::*;

    fn user(id: i64) -> User {
        let mut user = User::new(format!("user{}", id), "hash".to_string(), false);
        user.id = id;
        user
    }

    fn post(
        author_id: i64,
        is_published: bool,
        pub_date: DateTime<Utc>,
        category_published: Option<bool>,
    ) -> PostWithMeta {
        PostWithMeta {
            post: Post {
                id: 1,
                title: "title".to_string(),
                text: "text".to_string(),
                pub_date,
                is_published,
                created_at: pub_date,
                author_id,
                category_id: category_published.map(|_| 1),
                location_id: None,
                image: None,
            },
            author_username: format!("user{}", author_id),
            category: category_published.map(|is_published| PostCategory {
                id: 1,
                title: "Category".to_string(),
                slug: "category".to_string(),
                is_published,
            }),
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn test_visible_when_all_conditions_hold() {
        let now = Utc::now();
        assert!(is_publicly_visible(&post(1, true, now, None), now));
        assert!(is_publicly_visible(&post(1, true, now - Duration::days(1), Some(true)), now));
    }

    #[test]
    fn test_each_condition_hides_post() {
        let now = Utc::now();
        let past = now - Duration::hours(1);

        assert!(!is_publicly_visible(&post(1, false, past, None), now));
        assert!(!is_publicly_visible(&post(1, true, now + Duration::seconds(1), None), now));
        assert!(!is_publicly_visible(&post(1, true, past, Some(false)), now));
    }

    #[test]
    fn test_author_sees_hidden_post() {
        let now = Utc::now();
        let scheduled = post(7, true, now + Duration::days(1), Some(true));

        assert!(can_view(Some(&user(7)), &scheduled, now));
        assert!(!can_view(Some(&user(8)), &scheduled, now));
        assert!(!can_view(None, &scheduled, now));
    }

    #[test]
    fn test_visible_posts_for_keeps_order() {
        let now = Utc::now();
        let mut posts = vec![
            post(3, true, now - Duration::hours(3), None),
            post(3, false, now - Duration::hours(2), None),
            post(3, true, now + Duration::hours(1), Some(true)),
            post(4, true, now - Duration::hours(1), Some(true)),
        ];
        for (i, p) in posts.iter_mut().enumerate() {
            p.post.id = i as i64 + 1;
        }
        let ids = |v: Vec<PostWithMeta>| v.into_iter().map(|p| p.post.id).collect::<Vec<_>>();

        assert_eq!(ids(visible_posts_for(None, posts.clone(), now)), vec![1, 4]);
        assert_eq!(
            ids(visible_posts_for(Some(&user(3)), posts.clone(), now)),
            vec![1, 2, 3, 4]
        );
        assert_eq!(ids(visible_posts_for(Some(&user(4)), posts, now)), vec![1, 4]);
    }

    #[test]
    fn test_profile_scope() {
        let now = Utc::now();
        assert_eq!(profile_scope(Some(&user(5)), 5, now), PostScope::All);
        assert_eq!(profile_scope(Some(&user(6)), 5, now), PostScope::Visible(now));
        assert_eq!(profile_scope(None, 5, now), PostScope::Visible(now));
    }

    #[test]
    fn test_authorize_mutation() {
        assert_eq!(authorize_mutation(Some(&user(1)), 1), Authorization::Allow);
        assert_eq!(
            authorize_mutation(Some(&user(2)), 1),
            Authorization::RedirectToView
        );
        assert_eq!(authorize_mutation(None, 1), Authorization::RedirectToView);
    }

    proptest! {
        /// A post dated after `now` is never publicly visible.
        #[test]
        fn future_posts_never_visible(
            offset_secs in 1i64..=10 * 365 * 24 * 3600,
            is_published in any::<bool>(),
            category in proptest::option::of(any::<bool>()),
        ) {
            let now = Utc::now();
            let p = post(1, is_published, now + Duration::seconds(offset_secs), category);
            prop_assert!(!is_publicly_visible(&p, now));
        }

        /// Visibility is exactly the conjunction of the three conditions.
        #[test]
        fn visibility_is_conjunction(
            offset_secs in -100_000i64..=100_000,
            is_published in any::<bool>(),
            category in proptest::option::of(any::<bool>()),
        ) {
            let now = Utc::now();
            let p = post(1, is_published, now + Duration::seconds(offset_secs), category);
            let expected = is_published && offset_secs <= 0 && category.unwrap_or(true);
            prop_assert_eq!(is_publicly_visible(&p, now), expected);
        }
    }
}
