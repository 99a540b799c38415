use serde::{Deserialize, Serialize};

/// Spring Data style page used by the admin and role-request listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i64,
    /// Current page index (0-based).
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<bool>,
}

impl<T> Page<T> {
    pub fn empty(number: i64, size: i64) -> Self {
        Page {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            number,
            size,
            first: Some(true),
            last: Some(true),
        }
    }
}

/// Query parameters shared by the paged admin listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// e.g. `createdAt,desc`
    pub sort: Option<String>,
}

impl PageRequest {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        if let Some(page) = self.page {
            q.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            q.push(("size".to_string(), size.to_string()));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            q.push(("sort".to_string(), sort.to_string()));
        }
        q
    }
}
