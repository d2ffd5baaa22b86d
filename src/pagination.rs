//! Sort and paging parameters of list views
//!
//! These four parameters pass through filter submission untouched.

use crate::filter::Filterable;
use crate::ValidationError;
use reqwest::Url;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const ORDER_BY_PARAM: &str = "orderBy";
pub const ORDER_DIRECTION_PARAM: &str = "orderDirection";
pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const PAGE_INDEX_PARAM: &str = "pageIndex";

/// Parameters preserved verbatim when the filter rewrites the URL
pub const PRESERVED_PARAMS: [&str; 4] = [
    ORDER_BY_PARAM,
    ORDER_DIRECTION_PARAM,
    PAGE_SIZE_PARAM,
    PAGE_INDEX_PARAM,
];

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

/// Page information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One page of a list view
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn empty(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_info: PageInfo {
                page_index: 0,
                page_size,
                total_count: 0,
                has_next_page: false,
                has_previous_page: false,
            },
        }
    }
}

/// Sort/paging parameters of a list view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListParams {
    pub order_by: Option<String>,
    pub order_direction: Option<SortDirection>,
    pub page_size: Option<usize>,
    pub page_index: Option<usize>,
}

impl ListParams {
    /// Read the parameters from `url`, ignoring unparsable values
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                ORDER_BY_PARAM if !value.is_empty() => params.order_by = Some(value.into_owned()),
                ORDER_DIRECTION_PARAM => params.order_direction = value.parse().ok(),
                PAGE_SIZE_PARAM => params.page_size = value.parse().ok(),
                PAGE_INDEX_PARAM => params.page_index = value.parse().ok(),
                _ => {}
            }
        }
        params
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(size) = self.page_size {
            if size == 0 {
                return Err(ValidationError::InvalidField {
                    field: PAGE_SIZE_PARAM,
                    reason: "must be positive".to_string(),
                });
            }
            if size > MAX_PAGE_SIZE {
                return Err(ValidationError::InvalidField {
                    field: PAGE_SIZE_PARAM,
                    reason: format!("cannot exceed {MAX_PAGE_SIZE}"),
                });
            }
        }
        Ok(())
    }

    /// Effective page size
    pub fn limit(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn direction(&self) -> SortDirection {
        self.order_direction.unwrap_or_default()
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(order_by) = &self.order_by {
            pairs.push((ORDER_BY_PARAM, order_by.clone()));
        }
        if let Some(direction) = self.order_direction {
            pairs.push((ORDER_DIRECTION_PARAM, direction.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push((PAGE_SIZE_PARAM, size.to_string()));
        }
        if let Some(index) = self.page_index {
            pairs.push((PAGE_INDEX_PARAM, index.to_string()));
        }
        pairs
    }

    /// Stable sort by `order_by`; records without a key go last
    pub fn sort<R: Filterable>(&self, records: &mut [R]) {
        let Some(field) = self.order_by.as_deref() else {
            return;
        };
        let direction = self.direction();

        records.sort_by(|a, b| {
            match (a.sort_text(field), b.sort_text(field)) {
                (Some(a), Some(b)) => {
                    let ordering = a.to_lowercase().cmp(&b.to_lowercase());
                    match direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// Sort a copy of `records` and cut out the requested page
    ///
    /// An index past the end yields an empty page.
    pub fn page<R: Filterable + Clone>(&self, records: &[R]) -> Page<R> {
        let mut sorted = records.to_vec();
        self.sort(&mut sorted);

        let size = self.limit();
        let index = self.page_index.unwrap_or(0);
        let total = sorted.len();
        let offset = index.saturating_mul(size);

        let items: Vec<R> = sorted.into_iter().skip(offset).take(size).collect();

        Page {
            items,
            page_info: PageInfo {
                page_index: index,
                page_size: size,
                total_count: total,
                has_next_page: offset.saturating_add(size) < total,
                has_previous_page: index > 0,
            },
        }
    }
}
