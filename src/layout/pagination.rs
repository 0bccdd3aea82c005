use crate::config::LayoutConfig;
use crate::label::LabelFormatter;

use super::geometry::Cell;

/// One id on a page, with its label text and grid slot.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelItem {
    pub id: u64,
    pub text: String,
    /// Position within the page, 0-based.
    pub index: u64,
    pub cell: Cell,
}

/// A contiguous run of ids that fills one page, never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// 1-based page number.
    pub number: u64,
    pub first_id: u64,
    pub len: u64,
    columns: u32,
}

impl PagePlan {
    pub fn last_id(&self) -> u64 {
        self.first_id + (self.len - 1)
    }

    /// Labels for this page, generated on demand in ascending id order.
    pub fn items<'a>(&self, formatter: &'a LabelFormatter) -> impl Iterator<Item = LabelItem> + 'a {
        let first = self.first_id;
        let columns = self.columns;
        (0..self.len).map(move |index| {
            let id = first + index;
            LabelItem {
                id,
                text: formatter.format(id),
                index,
                cell: Cell::at(index, columns),
            }
        })
    }
}

/// Splits `[start_id, end_id]` into page plans of at most `columns * rows`
/// ids each. A range with `start_id > end_id` yields nothing.
#[derive(Debug, Clone)]
pub struct Paginator {
    next_id: Option<u64>,
    start_id: u64,
    end_id: u64,
    per_page: u64,
    columns: u32,
    page: u64,
}

impl Paginator {
    pub fn new(start_id: u64, end_id: u64, columns: u32, rows: u32) -> Self {
        let per_page = columns as u64 * rows as u64;
        let next_id = (start_id <= end_id && per_page > 0).then_some(start_id);
        Self {
            next_id,
            start_id,
            end_id,
            per_page,
            columns,
            page: 0,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.start_id, config.end_id, config.columns, config.rows)
    }

    pub fn total_items(&self) -> u64 {
        if self.start_id > self.end_id {
            0
        } else {
            (self.end_id - self.start_id).saturating_add(1)
        }
    }

    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_items().div_ceil(self.per_page)
    }
}

impl Iterator for Paginator {
    type Item = PagePlan;

    fn next(&mut self) -> Option<PagePlan> {
        let first_id = self.next_id?;
        let remaining = (self.end_id - first_id).saturating_add(1);
        let len = remaining.min(self.per_page);

        self.next_id = first_id
            .checked_add(len)
            .filter(|&next| next <= self.end_id);
        self.page += 1;

        Some(PagePlan {
            number: self.page,
            first_id,
            len,
            columns: self.columns,
        })
    }
}
