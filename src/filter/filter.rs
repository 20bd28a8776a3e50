use serde::Deserialize;

use super::types::SortOrder;

/// Search/sort/paginate parameters attached to every list endpoint.
///
/// Decoded straight from the query string; every field is optional and a
/// missing or invalid value degrades to a default instead of erroring. List
/// endpoints never 400 on a bad sort or order value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub order: String,
}

impl Filter {
    /// Case- and accent-insensitive substring predicate OR-joined across
    /// `columns`, as one parenthesized fragment with a single bound parameter
    /// (`$param_index` = `%search%`).
    ///
    /// Returns `None` when the search term is empty or no columns are given,
    /// in which case callers add no WHERE condition at all.
    pub fn search_like(&self, param_index: usize, columns: &[&str]) -> Option<(String, String)> {
        let term = self.search.trim();
        if term.is_empty() || columns.is_empty() {
            return None;
        }

        let clauses: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "unaccent(lower({})) LIKE unaccent(lower(${}))",
                    quote_qualified(col),
                    param_index
                )
            })
            .collect();

        Some((format!("({})", clauses.join(" OR ")), format!("%{}%", term)))
    }

    /// Ready-to-use `"<col>" ASC|DESC` clause.
    ///
    /// The sort column falls back to the configured default when empty or not
    /// a valid identifier; the order falls back when not asc/desc. When
    /// `table` is given and the column carries no `.` qualifier, the column
    /// is qualified with it - needed when a list query joins another table
    /// with a same-named column.
    pub fn order_clause(&self, table: Option<&str>) -> String {
        let defaults = &crate::config::config().filter;

        let mut sort = self.sort.trim();
        if sort.is_empty() || !is_valid_sort_ident(sort) {
            sort = defaults.default_sort.as_str();
        }

        let order = SortOrder::parse(&self.order)
            .or_else(|| SortOrder::parse(&defaults.default_order))
            .unwrap_or(SortOrder::Asc);

        let column = if sort.contains('.') {
            quote_qualified(sort)
        } else {
            match table {
                Some(t) => format!("\"{}\".\"{}\"", t, sort),
                None => format!("\"{}\"", sort),
            }
        };

        format!("{} {}", column, order.to_sql())
    }

    /// `(offset, limit)` when pagination is active - both page and limit must
    /// be positive. `None` means the caller returns the full result set.
    pub fn pagination(&self) -> Option<(i64, i64)> {
        if self.page <= 0 || self.limit <= 0 {
            return None;
        }
        let limit = match crate::config::config().filter.max_limit {
            Some(max) if self.limit > max => max,
            _ => self.limit,
        };
        Some(((self.page - 1) * limit, limit))
    }

    /// Total page count for a list response.
    ///
    /// Policy: 0 items with pagination active is 0 pages; with pagination
    /// inactive everything fits on one logical page.
    pub fn pages(&self, total: i64) -> i64 {
        match self.pagination() {
            None => 1,
            Some((_, limit)) => {
                if total <= 0 {
                    0
                } else {
                    (total + limit - 1) / limit
                }
            }
        }
    }

    /// Page size reported in list responses: the effective limit, or the
    /// item count itself when pagination is inactive.
    pub fn page_size(&self, total: i64) -> i64 {
        match self.pagination() {
            Some((_, limit)) => limit,
            None => total,
        }
    }

    /// Current page reported in list responses (1 when unpaginated).
    pub fn current_page(&self) -> i64 {
        match self.pagination() {
            Some(_) => self.page,
            None => 1,
        }
    }
}

/// Quote an identifier that may carry a single `table.` qualifier.
fn quote_qualified(ident: &str) -> String {
    match ident.split_once('.') {
        Some((table, column)) => format!("\"{}\".\"{}\"", table, column),
        None => format!("\"{}\"", ident),
    }
}

/// Sort input comes from the query string, so only plain identifiers (with at
/// most one `.` qualifier) may reach SQL text. Anything else falls back to
/// the configured default.
fn is_valid_sort_ident(ident: &str) -> bool {
    let mut parts = ident.split('.');
    let (first, second) = (parts.next(), parts.next());
    if parts.next().is_some() {
        return false;
    }
    let valid_part = |part: &str| {
        !part.is_empty()
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && part.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false)
    };
    match (first, second) {
        (Some(a), None) => valid_part(a),
        (Some(a), Some(b)) => valid_part(a) && valid_part(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(search: &str, page: i64, limit: i64, sort: &str, order: &str) -> Filter {
        Filter {
            search: search.to_string(),
            page,
            limit,
            sort: sort.to_string(),
            order: order.to_string(),
        }
    }

    #[test]
    fn empty_search_builds_no_predicate() {
        let f = filter("", 1, 10, "", "");
        assert!(f.search_like(1, &["name", "email"]).is_none());

        let blank = filter("   ", 1, 10, "", "");
        assert!(blank.search_like(1, &["name"]).is_none());
    }

    #[test]
    fn search_without_columns_builds_no_predicate() {
        let f = filter("alice", 1, 10, "", "");
        assert!(f.search_like(1, &[]).is_none());
    }

    #[test]
    fn search_builds_one_like_per_column_or_joined() {
        let f = filter("josé", 0, 0, "", "");
        let (sql, param) = f.search_like(3, &["name", "email"]).unwrap();

        assert_eq!(sql.matches("LIKE").count(), 2);
        assert_eq!(sql.matches(" OR ").count(), 1);
        assert!(sql.contains("unaccent(lower(\"name\")) LIKE unaccent(lower($3))"));
        assert!(sql.contains("unaccent(lower(\"email\")) LIKE unaccent(lower($3))"));
        assert_eq!(param, "%josé%");
    }

    #[test]
    fn order_defaults_when_fields_missing() {
        let f = filter("", 0, 0, "", "");
        assert_eq!(f.order_clause(None), "\"created_at\" DESC");
    }

    #[test]
    fn order_normalizes_case_and_falls_back_on_garbage() {
        let f = filter("", 0, 0, "name", "ASC");
        assert_eq!(f.order_clause(None), "\"name\" ASC");

        let g = filter("", 0, 0, "name", "sideways");
        assert_eq!(g.order_clause(None), "\"name\" DESC");
    }

    #[test]
    fn invalid_sort_ident_falls_back_to_default() {
        let f = filter("", 0, 0, "name; DROP TABLE users", "asc");
        assert_eq!(f.order_clause(None), "\"created_at\" ASC");
    }

    #[test]
    fn unqualified_sort_gets_table_prefix() {
        let f = filter("", 0, 0, "name", "asc");
        assert_eq!(f.order_clause(Some("products")), "\"products\".\"name\" ASC");
    }

    #[test]
    fn qualified_sort_keeps_its_own_table() {
        let f = filter("", 0, 0, "departments.name", "asc");
        assert_eq!(f.order_clause(Some("products")), "\"departments\".\"name\" ASC");
    }

    #[test]
    fn pagination_inactive_unless_both_positive() {
        assert!(filter("", 0, 10, "", "").pagination().is_none());
        assert!(filter("", 2, 0, "", "").pagination().is_none());
        assert!(filter("", -1, -5, "", "").pagination().is_none());
    }

    #[test]
    fn pagination_computes_offset() {
        let f = filter("", 3, 20, "", "");
        assert_eq!(f.pagination(), Some((40, 20)));
    }

    #[test]
    fn pages_zero_count_is_zero_when_paginated() {
        let f = filter("", 1, 10, "", "");
        assert_eq!(f.pages(0), 0);
        assert_eq!(f.pages(1), 1);
        assert_eq!(f.pages(10), 1);
        assert_eq!(f.pages(11), 2);
    }

    #[test]
    fn pages_is_one_when_unpaginated() {
        let f = filter("", 0, 0, "", "");
        assert_eq!(f.pages(0), 1);
        assert_eq!(f.pages(250), 1);
    }
}
