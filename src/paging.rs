//! Paging of iterables driven by query arguments
//!
//! `?page=2&size=20` selects a slice, `?pages` asks for the page count instead.

use serde::Serialize;

use crate::handler::{HandlerError, Request};
use crate::http::Response;

/// Page count information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub full_pages: usize,
    pub remainder: usize,
    pub pages: usize,
}

impl PageInfo {
    pub const fn new(full_pages: usize, remainder: usize) -> Self {
        Self {
            full_pages,
            remainder,
            pages: full_pages + (remainder > 0) as usize,
        }
    }
}

/// Page browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browser {
    pub page_arg: String,
    pub size_arg: String,
    pub info_arg: String,
    pub default_page: usize,
    pub default_size: usize,
}

impl Default for Browser {
    fn default() -> Self {
        Self {
            page_arg: "page".to_string(),
            size_arg: "size".to_string(),
            info_arg: "pages".to_string(),
            default_page: 0,
            default_size: 10,
        }
    }
}

impl Browser {
    pub fn page(&self, request: &Request) -> Result<usize, HandlerError> {
        self.usize_arg(request, &self.page_arg, self.default_page)
    }

    /// Page size; zero is rejected with a 400 response
    pub fn size(&self, request: &Request) -> Result<usize, HandlerError> {
        match self.usize_arg(request, &self.size_arg, self.default_size)? {
            0 => Err(Response::error("Page size must be positive.").into()),
            size => Ok(size),
        }
    }

    /// Whether the page count was requested
    pub fn info(&self, request: &Request) -> bool {
        request.has_arg(&self.info_arg)
    }

    /// Whether any paging argument is present
    pub fn wanted(&self, request: &Request) -> bool {
        request.has_arg(&self.page_arg) || request.has_arg(&self.size_arg) || self.info(request)
    }

    /// The requested page of `items`
    pub fn browse<I: IntoIterator>(
        &self,
        request: &Request,
        items: I,
    ) -> Result<impl Iterator<Item = I::Item>, HandlerError> {
        let size = self.size(request)?;
        let first = self.page(request)?.saturating_mul(size);
        Ok(items.into_iter().skip(first).take(size))
    }

    /// Page count of `items` for the requested size
    pub fn pages<I: IntoIterator>(&self, request: &Request, items: I) -> Result<PageInfo, HandlerError> {
        let size = self.size(request)?;
        let count = items.into_iter().count();
        Ok(PageInfo::new(count / size, count % size))
    }

    /// JSON response with either the page count or the requested page
    pub fn respond<I>(&self, request: &Request, items: I) -> Result<Response, HandlerError>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        if self.info(request) {
            return Ok(Response::json(&self.pages(request, items)?)?);
        }
        let page: Vec<I::Item> = self.browse(request, items)?.collect();
        Ok(Response::json(&page)?)
    }

    fn usize_arg(&self, request: &Request, key: &str, default: usize) -> Result<usize, HandlerError> {
        match request.arg(key) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| Response::error(format!("Not a page number: {key}={value}.")).into()),
        }
    }
}
