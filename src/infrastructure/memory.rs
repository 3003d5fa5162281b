//! In-process storage backend.
//!
//! [`MemoryStore`] implements every repository trait over a single mutex-guarded
//! state. It backs `STORAGE_BACKEND=memory` and the HTTP integration tests.
//!
//! The lock is never held across an `.await`, so each trait call is one atomic
//! critical section. This gives the same guarantees the PostgreSQL backend gets
//! from its constraints: unique slugs and emails, atomic click increments, and
//! cascading click deletion.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::domain::entities::{
    Click, DailyClicks, Link, LinkPatch, NewClick, NewLink, NewUser, ReferrerCount, User,
};
use crate::domain::repositories::{
    ClickRepository, LinkRepository, StatsRepository, UserRepository,
};
use crate::error::AppError;

#[derive(Default)]
struct State {
    links: BTreeMap<i64, Link>,
    clicks: Vec<Click>,
    users: BTreeMap<i64, User>,
    next_link_id: i64,
    next_click_id: i64,
    next_user_id: i64,
}

impl State {
    fn slug_taken(&self, slug: &str, except_id: Option<i64>) -> bool {
        self.links
            .values()
            .any(|l| l.slug == slug && Some(l.id) != except_id)
    }

    fn visible(link: &Link, owner_id: Option<i64>) -> bool {
        owner_id.is_none_or(|owner| link.is_owned_by(owner))
    }

    fn owner_of(&self, link_id: i64) -> Option<i64> {
        self.links.get(&link_id).and_then(|l| l.owner_id)
    }

    fn append_click(&mut self, new_click: NewClick) -> Result<Click, AppError> {
        if !self.links.contains_key(&new_click.link_id) {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": new_click.link_id }),
            ));
        }

        self.next_click_id += 1;
        let click = Click {
            id: self.next_click_id,
            link_id: new_click.link_id,
            clicked_at: Utc::now(),
            referrer: new_click.referrer,
            user_agent: new_click.user_agent,
        };
        self.clicks.push(click.clone());

        Ok(click)
    }

    fn in_scope(&self, link_id: i64, owner_id: Option<i64>) -> bool {
        match owner_id {
            None => true,
            Some(owner) => self.owner_of(link_id) == Some(owner),
        }
    }
}

/// Mutex-guarded storage implementing all repository traits.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("Storage lock poisoned", json!({})))
    }
}

fn slug_conflict(slug: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "links_slug_key", "slug": slug }),
    )
}

fn count_referrers<'a>(referrers: impl Iterator<Item = &'a str>) -> Vec<ReferrerCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for referrer in referrers {
        *counts.entry(referrer).or_default() += 1;
    }

    let mut ranked: Vec<ReferrerCount> = counts
        .into_iter()
        .map(|(referrer, count)| ReferrerCount {
            referrer: referrer.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.referrer.cmp(&b.referrer)));
    ranked
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut state = self.lock()?;

        if state.slug_taken(&new_link.slug, None) {
            return Err(slug_conflict(&new_link.slug));
        }

        state.next_link_id += 1;
        let link = Link {
            id: state.next_link_id,
            slug: new_link.slug,
            original_url: new_link.original_url,
            owner_id: new_link.owner_id,
            click_count: 0,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            password_hash: new_link.password_hash,
            qr_style: new_link.qr_style,
        };
        state.links.insert(link.id, link.clone());

        Ok(link)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let state = self.lock()?;
        Ok(state.links.values().find(|l| l.slug == slug).cloned())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let state = self.lock()?;
        Ok(state.links.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let state = self.lock()?;

        let mut links: Vec<Link> = state
            .links
            .values()
            .filter(|l| l.is_owned_by(owner_id))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(links
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        patch: LinkPatch,
        owner_id: Option<i64>,
    ) -> Result<Option<Link>, AppError> {
        let mut state = self.lock()?;

        match state.links.get(&id) {
            Some(link) if State::visible(link, owner_id) => {}
            _ => return Ok(None),
        }

        if let Some(slug) = &patch.slug
            && state.slug_taken(slug, Some(id))
        {
            return Err(slug_conflict(slug));
        }

        let Some(link) = state.links.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(slug) = patch.slug {
            link.slug = slug;
        }
        if let Some(original_url) = patch.original_url {
            link.original_url = original_url;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        if let Some(password_hash) = patch.password_hash {
            link.password_hash = password_hash;
        }
        if let Some(qr_style) = patch.qr_style {
            link.qr_style = Some(qr_style);
        }

        Ok(Some(link.clone()))
    }

    async fn delete(&self, id: i64, owner_id: Option<i64>) -> Result<bool, AppError> {
        let mut state = self.lock()?;

        match state.links.get(&id) {
            Some(link) if State::visible(link, owner_id) => {}
            _ => return Ok(false),
        }

        state.links.remove(&id);
        state.clicks.retain(|c| c.link_id != id);

        Ok(true)
    }

    async fn bulk_delete(&self, ids: &[i64], owner_id: Option<i64>) -> Result<u64, AppError> {
        let mut state = self.lock()?;

        let doomed: Vec<i64> = state
            .links
            .values()
            .filter(|l| ids.contains(&l.id) && State::visible(l, owner_id))
            .map(|l| l.id)
            .collect();

        for id in &doomed {
            state.links.remove(id);
        }
        state.clicks.retain(|c| !doomed.contains(&c.link_id));

        Ok(doomed.len() as u64)
    }

    async fn increment_clicks(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if let Some(link) = state.links.get_mut(&id) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let state = self.lock()?;
        Ok(state.slug_taken(slug, None))
    }

    async fn is_owner(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let state = self.lock()?;
        Ok(state.links.get(&id).is_some_and(|l| l.is_owned_by(owner_id)))
    }
}

#[async_trait]
impl ClickRepository for MemoryStore {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut state = self.lock()?;
        state.append_click(new_click)
    }

    async fn record_and_increment(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut state = self.lock()?;
        let click = state.append_click(new_click)?;
        if let Some(link) = state.links.get_mut(&click.link_id) {
            link.click_count += 1;
        }
        Ok(click)
    }

    async fn query_by_link(
        &self,
        link_id: i64,
        window_days: i64,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let state = self.lock()?;
        let since = Utc::now() - Duration::days(window_days);

        let mut per_day: BTreeMap<String, i64> = BTreeMap::new();
        for click in state
            .clicks
            .iter()
            .filter(|c| c.link_id == link_id && c.clicked_at >= since)
        {
            let day = click.clicked_at.date_naive().format("%Y-%m-%d").to_string();
            *per_day.entry(day).or_default() += 1;
        }

        Ok(per_day
            .into_iter()
            .map(|(date, count)| DailyClicks { date, count })
            .collect())
    }

    async fn top_referrers(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<ReferrerCount>, AppError> {
        let state = self.lock()?;

        let mut ranked = count_referrers(
            state
                .clicks
                .iter()
                .filter(|c| c.link_id == link_id)
                .filter_map(|c| c.referrer.as_deref()),
        );
        ranked.truncate(limit.max(0) as usize);

        Ok(ranked)
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn total_clicks(&self, owner_id: Option<i64>) -> Result<i64, AppError> {
        let state = self.lock()?;
        Ok(state
            .links
            .values()
            .filter(|l| State::visible(l, owner_id))
            .map(|l| l.click_count)
            .sum())
    }

    async fn total_links(&self, owner_id: Option<i64>) -> Result<i64, AppError> {
        let state = self.lock()?;
        Ok(state
            .links
            .values()
            .filter(|l| State::visible(l, owner_id))
            .count() as i64)
    }

    async fn clicks_in_window(
        &self,
        owner_id: Option<i64>,
        start_offset_days: i64,
        end_offset_days: i64,
    ) -> Result<i64, AppError> {
        let state = self.lock()?;
        let now = Utc::now();
        let start = now - Duration::days(start_offset_days);
        let end = now - Duration::days(end_offset_days);

        Ok(state
            .clicks
            .iter()
            .filter(|c| c.clicked_at >= start && c.clicked_at < end)
            .filter(|c| state.in_scope(c.link_id, owner_id))
            .count() as i64)
    }

    async fn top_referrer(&self, owner_id: Option<i64>) -> Result<Option<ReferrerCount>, AppError> {
        let state = self.lock()?;

        let ranked = count_referrers(
            state
                .clicks
                .iter()
                .filter(|c| state.in_scope(c.link_id, owner_id))
                .filter_map(|c| c.referrer.as_deref()),
        );

        Ok(ranked.into_iter().next())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.lock()?;

        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let state = self.lock()?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_link(slug: &str, owner_id: Option<i64>) -> NewLink {
        NewLink {
            slug: slug.to_string(),
            original_url: "https://example.com".to_string(),
            owner_id,
            expires_at: None,
            password_hash: None,
            qr_style: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let store = MemoryStore::new();
        LinkRepository::create(&store, new_link("promo1", None))
            .await
            .unwrap();

        let err = LinkRepository::create(&store, new_link("promo1", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("mine", Some(1)))
            .await
            .unwrap();

        let patch = LinkPatch {
            original_url: Some("https://evil.example".to_string()),
            ..Default::default()
        };
        let result = store.update(link.id, patch, Some(2)).await.unwrap();
        assert!(result.is_none());

        let unchanged = store.get_by_id(link.id).await.unwrap().unwrap();
        assert_eq!(unchanged.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_rename_onto_existing_slug_conflicts() {
        let store = MemoryStore::new();
        LinkRepository::create(&store, new_link("taken", Some(1)))
            .await
            .unwrap();
        let link = LinkRepository::create(&store, new_link("other", Some(1)))
            .await
            .unwrap();

        let patch = LinkPatch {
            slug: Some("taken".to_string()),
            ..Default::default()
        };
        let err = store.update(link.id, patch, Some(1)).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_clicks() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("gone", Some(1)))
            .await
            .unwrap();
        store
            .record(NewClick::new(link.id, Some("https://a.example"), None))
            .await
            .unwrap();

        assert!(store.delete(link.id, Some(1)).await.unwrap());
        assert!(store.top_referrers(link.id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_skips_foreign_links() {
        let store = MemoryStore::new();
        let a = LinkRepository::create(&store, new_link("aaa", Some(1)))
            .await
            .unwrap();
        let b = LinkRepository::create(&store, new_link("bbb", Some(2)))
            .await
            .unwrap();

        let deleted = store.bulk_delete(&[a.id, b.id], Some(1)).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(store.get_by_id(b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_record_requires_existing_link() {
        let store = MemoryStore::new();
        let err = store.record(NewClick::new(99, None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_record_and_increment_moves_counter_with_log() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("paired", None))
            .await
            .unwrap();

        for _ in 0..3 {
            store
                .record_and_increment(NewClick::new(link.id, Some("https://a.example"), None))
                .await
                .unwrap();
        }

        let reloaded = store.get_by_id(link.id).await.unwrap().unwrap();
        assert_eq!(reloaded.click_count, 3);
        assert_eq!(store.top_referrers(link.id, 5).await.unwrap()[0].count, 3);
    }

    #[tokio::test]
    async fn test_record_and_increment_on_deleted_link_writes_nothing() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("vanish", None))
            .await
            .unwrap();
        store.delete(link.id, None).await.unwrap();

        let err = store
            .record_and_increment(NewClick::new(link.id, Some("https://a.example"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(store.top_referrers(link.id, 5).await.unwrap().is_empty());
        assert_eq!(store.total_clicks(None).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_one_slug_have_one_winner() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    LinkRepository::create(store.as_ref(), new_link("race01", None)).await
                })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn test_referrers_ranked_by_count() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("ranked", None))
            .await
            .unwrap();
        for referrer in ["https://b.example", "https://a.example", "https://b.example"] {
            store
                .record(NewClick::new(link.id, Some(referrer), None))
                .await
                .unwrap();
        }
        store.record(NewClick::new(link.id, None, None)).await.unwrap();

        let top = store.top_referrers(link.id, 5).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].referrer, "https://b.example");
        assert_eq!(top[0].count, 2);
        assert_eq!(
            store.top_referrer(None).await.unwrap(),
            Some(ReferrerCount {
                referrer: "https://b.example".to_string(),
                count: 2
            })
        );
    }

    #[tokio::test]
    async fn test_daily_history_groups_today() {
        let store = MemoryStore::new();
        let link = LinkRepository::create(&store, new_link("daily", None))
            .await
            .unwrap();
        store.record(NewClick::new(link.id, None, None)).await.unwrap();
        store.record(NewClick::new(link.id, None, None)).await.unwrap();

        let history = store.query_by_link(link.id, 30).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].count, 2);
        assert_eq!(history[0].date, Utc::now().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
        };
        UserRepository::create(&store, user.clone()).await.unwrap();

        let err = UserRepository::create(&store, user).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
