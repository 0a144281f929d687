//! Pocket v3 wire types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::core::article::Article;

/// Bulk action that sets an item's tags to exactly the given list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceTagsAction {
    pub action: &'static str,
    pub item_id: String,
    pub tags: String,
}

impl ReplaceTagsAction {
    pub fn new(item_id: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            action: "tags_replace",
            item_id: item_id.into(),
            tags: tags.into(),
        }
    }
}

/// `/v3/send` request body
#[derive(Debug, Serialize)]
pub struct ModifyRequest<'a> {
    pub consumer_key: &'a str,
    pub access_token: &'a str,
    pub actions: &'a [ReplaceTagsAction],
}

/// `/v3/send` response body
#[derive(Debug, Deserialize)]
pub struct ModifyResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub action_results: Vec<serde_json::Value>,
}

/// `/v3/get` request body
#[derive(Debug, Serialize)]
pub struct RetrieveRequest<'a> {
    pub consumer_key: &'a str,
    pub access_token: &'a str,
    pub state: &'a str,
    #[serde(rename = "detailType")]
    pub detail_type: &'a str,
}

/// `/v3/get` response body
#[derive(Debug, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default, deserialize_with = "deserialize_item_list")]
    pub list: BTreeMap<String, RawItem>,
}

/// One saved item as Pocket returns it with `detailType=complete`
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub item_id: String,
    #[serde(default)]
    pub resolved_title: Option<String>,
    #[serde(default)]
    pub given_title: Option<String>,
    #[serde(default)]
    pub resolved_url: Option<String>,
    #[serde(default)]
    pub given_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_sort_id")]
    pub sort_id: Option<u64>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, serde_json::Value>>,
}

fn first_non_empty(a: &Option<String>, b: &Option<String>) -> String {
    a.as_deref()
        .filter(|s| !s.is_empty())
        .or(b.as_deref())
        .unwrap_or_default()
        .to_string()
}

impl RawItem {
    pub fn title(&self) -> String {
        first_non_empty(&self.resolved_title, &self.given_title)
    }

    pub fn url(&self) -> String {
        first_non_empty(&self.resolved_url, &self.given_url)
    }

    pub fn into_article(self) -> Article {
        let title = self.title();
        let url = self.url();
        let tags = self.tags.map(|t| t.into_keys().collect::<Vec<_>>());
        Article::new(self.item_id, title, url, tags.unwrap_or_default())
    }
}

impl RetrieveResponse {
    /// Articles ordered by Pocket's sort id, then item id
    pub fn into_articles(self) -> Vec<Article> {
        let mut items: Vec<RawItem> = self.list.into_values().collect();
        items.sort_by(|a, b| {
            a.sort_id
                .cmp(&b.sort_id)
                .then_with(|| a.item_id.len().cmp(&b.item_id.len()))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        items.into_iter().map(RawItem::into_article).collect()
    }
}

/// Pocket sends `"list": []` instead of `{}` when nothing matches
fn deserialize_item_list<'de, D>(deserializer: D) -> Result<BTreeMap<String, RawItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ItemList {
        Map(BTreeMap<String, RawItem>),
        Empty(Vec<serde_json::Value>),
    }

    Ok(match ItemList::deserialize(deserializer)? {
        ItemList::Map(map) => map,
        ItemList::Empty(_) => BTreeMap::new(),
    })
}

/// `sort_id` arrives as a number, occasionally as a string
fn deserialize_sort_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SortId {
        Num(u64),
        Str(String),
    }

    Ok(match Option::<SortId>::deserialize(deserializer)? {
        Some(SortId::Num(n)) => Some(n),
        Some(SortId::Str(s)) => s.parse().ok(),
        None => None,
    })
}

/// `/v3/oauth/request` response
#[derive(Debug, Deserialize)]
pub struct RequestTokenResponse {
    pub code: String,
}

/// Long-lived credential, persisted as `auth.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub access_token: String,
    #[serde(default)]
    pub username: String,
}
