use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, SortField};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `name,asc`-style sort specs. Several criteria are separated by `;`.
    /// Only fields present in `allowed` are accepted.
    pub fn parse(spec: &str, allowed: &[SortField]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in spec.split(';') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split(',').map(str::trim);
            let name = it.next().unwrap_or_default();
            let field = allowed
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name))
                .copied()
                .ok_or_else(|| FilterError::InvalidSortField(name.to_string()))?;

            let sort = match it.next() {
                None | Some("") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(dir) => return Err(FilterError::InvalidSortDirection(dir.to_string())),
            };

            if !out.iter().any(|o: &FilterOrderInfo| o.field == field) {
                out.push(FilterOrderInfo { field, sort });
            }
        }
        Ok(out)
    }

    /// ORDER BY clause with a trailing tie-breaker so page boundaries are stable.
    pub fn generate(infos: &[FilterOrderInfo], tie_breaker: &str) -> String {
        let mut parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", i.field.column, i.sort.to_sql()))
            .collect();
        if !infos.iter().any(|i| i.field.column == tie_breaker) {
            parts.push(format!("{} ASC", tie_breaker));
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}
