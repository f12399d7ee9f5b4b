use serde::Serialize;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{FilterOrderInfo, PageParams, SortField};
use crate::config::ApiConfig;

/// Zero-based page window plus the requested ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<FilterOrderInfo>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size: size.max(1), sort: vec![] }
    }

    pub fn with_sort(mut self, sort: Vec<FilterOrderInfo>) -> Self {
        self.sort = sort;
        self
    }

    /// Resolve query-string paging against the configured defaults and cap.
    pub fn from_params(
        params: &PageParams,
        allowed: &[SortField],
        api: &ApiConfig,
    ) -> Result<Self, FilterError> {
        let page = params.page.unwrap_or(0);
        let requested = match params.size {
            None | Some(0) => api.default_page_size,
            Some(size) => size,
        };
        let size = if requested > api.max_page_size {
            tracing::warn!("Page size {} exceeds max {}, capping to max", requested, api.max_page_size);
            api.max_page_size
        } else {
            requested
        };

        let sort = match params.sort.as_deref() {
            Some(spec) => FilterOrder::parse(spec, allowed)?,
            None => vec![],
        };

        Ok(Self::new(page, size).with_sort(sort))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page).saturating_mul(i64::from(self.size))
    }
}

/// One slice of a larger ordered result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size.max(1));
        let total_pages = (total_elements + size - 1) / size;
        let number = request.page;
        Self {
            number_of_elements: content.len(),
            empty: content.is_empty(),
            content,
            number,
            size: request.size,
            total_elements,
            total_pages,
            first: number == 0,
            last: i64::from(number) + 1 >= total_pages,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::types::SortDirection;

    const FIELDS: &[SortField] = &[SortField { name: "name", column: "name" }];

    fn params(page: Option<u32>, size: Option<u32>, sort: Option<&str>) -> PageParams {
        PageParams { page, size, sort: sort.map(str::to_string) }
    }

    #[test]
    fn defaults_apply_when_params_missing() {
        let api = AppConfig::development().api;
        let req = PageRequest::from_params(&PageParams::default(), FIELDS, &api).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.size, api.default_page_size);
        assert!(req.sort.is_empty());
    }

    #[test]
    fn size_is_capped_and_zero_means_default() {
        let api = AppConfig::production().api;
        let req = PageRequest::from_params(&params(Some(2), Some(10_000), None), FIELDS, &api).unwrap();
        assert_eq!(req.size, api.max_page_size);
        assert_eq!(req.offset(), 2 * i64::from(api.max_page_size));

        let req = PageRequest::from_params(&params(None, Some(0), None), FIELDS, &api).unwrap();
        assert_eq!(req.size, api.default_page_size);
    }

    #[test]
    fn sort_is_parsed_against_allowed_fields() {
        let api = AppConfig::development().api;
        let req = PageRequest::from_params(&params(None, None, Some("name,desc")), FIELDS, &api).unwrap();
        assert_eq!(req.sort[0].sort, SortDirection::Desc);

        let err = PageRequest::from_params(&params(None, None, Some("price")), FIELDS, &api);
        assert!(matches!(err, Err(FilterError::InvalidSortField(_))));
    }

    #[test]
    fn page_metadata() {
        let req = PageRequest::new(2, 10);
        let page = Page::new(vec![1, 2, 3, 4, 5], &req, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(page.last);
        assert_eq!(page.number_of_elements, 5);

        let beyond = Page::<i32>::new(vec![], &PageRequest::new(50, 10), 25);
        assert!(beyond.empty);
        assert!(beyond.last);
        assert_eq!(beyond.total_elements, 25);
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = Page::new(vec!["a"], &PageRequest::new(0, 10), 1).map(|s| s.to_uppercase());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["content"][0], "A");
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["numberOfElements"], 1);
    }
}
