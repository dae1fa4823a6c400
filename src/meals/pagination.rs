use thiserror::Error;

/// Rows shown per page on every paginated list.
pub const PAGE_SIZE: i64 = 5;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("The page not found.")]
pub struct PageNotFound;

/// A page number known to be inside the available range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub total_pages: i64,
}

impl PageWindow {
    pub fn first(total_rows: i64) -> Self {
        Self {
            page: 1,
            total_pages: total_pages(total_rows),
        }
    }

    /// Index of the first row on this page.
    pub fn start(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }

    /// Index one past the last row on this page.
    pub fn end(&self) -> i64 {
        self.page * PAGE_SIZE
    }
}

pub fn total_pages(total_rows: i64) -> i64 {
    if total_rows <= 0 {
        0
    } else {
        (total_rows + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// Picks the `page` parameter out of a query string. Repeating it is
/// rejected like any other page that is not a single number.
pub fn page_param(query: &[(String, String)]) -> Result<Option<&str>, PageNotFound> {
    let mut pages = query
        .iter()
        .filter(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str());
    match (pages.next(), pages.next()) {
        (page, None) => Ok(page),
        _ => Err(PageNotFound),
    }
}

/// Validates the raw `page` query parameter against the number of rows.
///
/// A missing or blank parameter means page 1. Anything that is not a
/// positive integer, or points past the last page, is rejected. An empty
/// list still has a page 1.
pub fn resolve_page(requested: Option<&str>, total_rows: i64) -> Result<PageWindow, PageNotFound> {
    let page = match requested.map(str::trim) {
        None | Some("") => 1,
        Some(raw) => raw.parse::<i64>().map_err(|_| PageNotFound)?,
    };

    let total_pages = total_pages(total_rows);
    if page < 1 || page > total_pages.max(1) {
        return Err(PageNotFound);
    }

    Ok(PageWindow { page, total_pages })
}
