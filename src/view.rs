use crate::core::task::Task;

/// Page sizes offered by the dashboard's rows-per-page selector.
pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// One page of the filtered task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub visible: Vec<&'a Task>,
    pub total_pages: usize,
    /// Index into the filtered collection of the first row on this page.
    pub start_index: usize,
    /// `start_index + page_size`; may run past `filtered_count` on the last page.
    pub end_index: usize,
    pub filtered_count: usize,
}

impl Page<'_> {
    /// Number shown in the "No" column for the i-th visible row.
    pub fn row_number(&self, i: usize) -> usize {
        self.start_index + i + 1
    }

    /// Footer text, e.g. `11 - 20 of 25`.
    pub fn range_label(&self) -> String {
        if self.visible.is_empty() {
            return format!("0 - 0 of {}", self.filtered_count);
        }
        format!(
            "{} - {} of {}",
            self.start_index + 1,
            self.end_index.min(self.filtered_count),
            self.filtered_count
        )
    }
}

/// Filter `tasks` by `search_term` (case-insensitive, title or description)
/// and cut out page `page` of `page_size` rows.
///
/// Pages are 1-based. Page 0 is read as page 1 and a page size of 0 as 1.
/// A page past the last one yields an empty `visible` list.
pub fn filter_and_paginate<'a>(
    tasks: &'a [Task],
    search_term: &str,
    page: usize,
    page_size: usize,
) -> Page<'a> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let needle = search_term.to_lowercase();

    let filtered: Vec<&Task> = tasks.iter().filter(|t| t.matches(&needle)).collect();
    let filtered_count = filtered.len();

    let start_index = (page - 1).saturating_mul(page_size);
    let end_index = start_index.saturating_add(page_size);

    let visible = if start_index >= filtered_count {
        Vec::new()
    } else {
        filtered[start_index..end_index.min(filtered_count)].to_vec()
    };

    Page {
        visible,
        total_pages: filtered_count.div_ceil(page_size),
        start_index,
        end_index,
        filtered_count,
    }
}

/// Search and pagination parameters of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search_term: String,
    current_page: usize,
    rows_per_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl ViewState {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            search_term: String::new(),
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Changing the search term always returns to page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    /// Changing the page size always returns to page 1.
    pub fn set_rows_per_page(&mut self, rows: usize) {
        self.rows_per_page = rows.max(1);
        self.current_page = 1;
    }

    /// Jump to `page`, clamped into `[1, max(total_pages, 1)]`.
    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.current_page = page.clamp(1, total_pages.max(1));
    }

    pub fn first(&mut self) {
        self.current_page = 1;
    }

    pub fn previous(&mut self, total_pages: usize) {
        self.go_to(self.current_page.saturating_sub(1), total_pages);
    }

    pub fn next(&mut self, total_pages: usize) {
        self.go_to(self.current_page + 1, total_pages);
    }

    pub fn last(&mut self, total_pages: usize) {
        self.go_to(total_pages, total_pages);
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self, total_pages: usize) -> bool {
        self.current_page < total_pages
    }

    pub fn page<'a>(&self, tasks: &'a [Task]) -> Page<'a> {
        filter_and_paginate(tasks, &self.search_term, self.current_page, self.rows_per_page)
    }
}
