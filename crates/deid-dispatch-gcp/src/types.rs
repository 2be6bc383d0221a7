//! Cloud Storage JSON API response types
//!
//! Only the fields the listing needs are requested (`fields=` selector), so
//! everything else is left out here as well.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct BucketResource {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectList {
    #[serde(default)]
    pub items: Vec<ObjectResource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ObjectResource {
    pub name: String,
}
