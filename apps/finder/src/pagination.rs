use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn validate(self) -> Result<(u32, u32), AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok((page, page_size))
    }
}

/// Page-number pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

/// Slices an already-ordered list. Pages past the end are rejected,
/// except page 1 of an empty list.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> Result<Page<T>, AppError> {
    let (page, page_size) = params.validate()?;
    let count = items.len();
    let start = (page as usize - 1).saturating_mul(page_size as usize);

    if page > 1 && start >= count {
        return Err(AppError::NotFound(format!("Invalid page {page}")));
    }

    let results = items.into_iter().skip(start).take(page_size as usize).collect();

    Ok(Page {
        count,
        page,
        page_size,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, page_size: u32) -> PageParams {
        PageParams {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PageParams::default().validate().unwrap(), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(params(0, 10).validate().is_err());
        assert!(params(1, 0).validate().is_err());
        assert!(params(1, 101).validate().is_err());
    }

    #[test]
    fn test_slices_second_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), params(2, 10)).unwrap();
        assert_eq!(page.count, 25);
        assert_eq!(page.results, (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_last_partial_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), params(3, 10)).unwrap();
        assert_eq!(page.results, vec![20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let err = paginate((0..5).collect::<Vec<_>>(), params(2, 10)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_empty_first_page_is_ok() {
        let page = paginate(Vec::<u8>::new(), PageParams::default()).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }
}
