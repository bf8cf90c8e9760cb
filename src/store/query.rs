//! Catalog filtering, sorting and pagination.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::Product;

pub const DEFAULT_PAGE_SIZE: u32 = 16;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Unknown or missing values sort newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let newest = || b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id()));
        match self {
            Self::Newest => newest(),
            Self::PriceAsc => a.price().cmp(&b.price()).then_with(newest),
            Self::PriceDesc => b.price().cmp(&a.price()).then_with(newest),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Exact category; `all` matches everything.
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self { search: None, category: None, min_price: None, max_price: None, sort: ProductSort::Newest, page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl ProductQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty() && *c != "all")
    }

    pub fn page(&self) -> u32 { self.page.max(1) }
    pub fn page_size(&self) -> u32 { self.page_size.clamp(1, MAX_PAGE_SIZE) }
    pub fn offset(&self) -> u64 { u64::from(self.page() - 1) * u64::from(self.page_size()) }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term() {
            if !product.name().to_lowercase().contains(&term.to_lowercase()) { return false; }
        }
        if let Some(category) = self.category_filter() {
            if product.category() != category { return false; }
        }
        let price = product.price().amount();
        if self.min_price.is_some_and(|min| price < min) { return false; }
        if self.max_price.is_some_and(|max| price > max) { return false; }
        true
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        let total_pages = u32::try_from(total_count.div_ceil(u64::from(page_size.max(1)))).unwrap_or(u32::MAX);
        Self { items, total_pages, current_page: page, total_count }
    }
}
