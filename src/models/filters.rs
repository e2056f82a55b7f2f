use chrono::NaiveDateTime;
use uuid::Uuid;

use super::enums::{AppointmentStatus, LabResultStatus, MedicationStatus};

/// 1-indexed pagination window. `per_page` defaults to 20, capped at 100.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

impl Page {
    pub fn clamped(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct LabResultFilter {
    pub category: Option<String>,
    pub status: Option<LabResultStatus>,
}

#[derive(Debug, Default)]
pub struct MedicationFilter {
    pub status: Option<MedicationStatus>,
    pub prescriber_id: Option<Uuid>,
}

#[derive(Debug, Default)]
pub struct MessageFilter {
    pub thread_id: Option<Uuid>,
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults() {
        let page = Page::clamped(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, DEFAULT_PER_PAGE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn page_offset_is_one_indexed() {
        let page = Page::clamped(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn page_clamps_out_of_range_values() {
        let page = Page::clamped(Some(0), Some(10_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);
    }
}
