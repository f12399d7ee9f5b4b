use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sortable attribute: the name clients send and the column it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub field: SortField,
    pub sort: SortDirection,
}

/// Raw paging parameters as they arrive on the query string. `sort` may repeat,
/// so it is filled from the raw query by `with_sort_from` rather than by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<u32>,
    #[serde(skip)]
    pub sort: Option<String>,
}

impl PageParams {
    pub fn with_sort_from(mut self, raw_query: Option<&str>) -> Self {
        self.sort = sort_from_query(raw_query);
        self
    }
}

/// Every `sort` parameter in order, joined with `;`, so `sort=a&sort=b,desc`
/// reads the same as `sort=a;b,desc`.
pub fn sort_from_query(raw_query: Option<&str>) -> Option<String> {
    let criteria: Vec<String> = url::form_urlencoded::parse(raw_query?.as_bytes())
        .filter(|(key, _)| key == "sort")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    (!criteria.is_empty()).then(|| criteria.join(";"))
}

/// Query strings like `?categoryId=&name=` send empty values; treat them as absent.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(serde::de::Error::custom).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_sort_parameters_are_joined() {
        assert_eq!(
            sort_from_query(Some("page=0&sort=name,asc&sort=price,desc")).as_deref(),
            Some("name,asc;price,desc")
        );
        assert_eq!(sort_from_query(Some("sort=name%2Cdesc")).as_deref(), Some("name,desc"));
        assert_eq!(sort_from_query(Some("sort=&size=3")), None);
        assert_eq!(sort_from_query(None), None);
    }
}
