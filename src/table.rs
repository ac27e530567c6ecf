//! Columns of the employee table and how their values are shown.

use crate::api::Employee;
use crate::query::{SortColumn, SortOrder};

pub struct TableColumn {
    pub title: &'static str,
    pub sort: SortColumn,
    pub width: u16,
}

pub const COLUMNS: [TableColumn; 8] = [
    TableColumn {
        title: "ID",
        sort: SortColumn::Id,
        width: 5,
    },
    TableColumn {
        title: "Name",
        sort: SortColumn::Name,
        width: 20,
    },
    TableColumn {
        title: "Department",
        sort: SortColumn::Department,
        width: 13,
    },
    TableColumn {
        title: "Position",
        sort: SortColumn::Position,
        width: 11,
    },
    TableColumn {
        title: "Salary",
        sort: SortColumn::Salary,
        width: 10,
    },
    TableColumn {
        title: "Hire Date",
        sort: SortColumn::HireDate,
        width: 12,
    },
    TableColumn {
        title: "Years",
        sort: SortColumn::YearsEmployed,
        width: 7,
    },
    TableColumn {
        title: "Rating",
        sort: SortColumn::PerformanceRating,
        width: 8,
    },
];

/// Header text with a marker on the column the table is sorted by.
pub fn header_title(
    column: &TableColumn,
    sort_column: Option<SortColumn>,
    sort_order: SortOrder,
) -> String {
    if sort_column != Some(column.sort) {
        return column.title.to_string();
    }
    match sort_order {
        SortOrder::Asc => format!("{} ▲", column.title),
        SortOrder::Desc => format!("{} ▼", column.title),
    }
}

pub fn cell(employee: &Employee, column: SortColumn) -> String {
    match column {
        SortColumn::Id => employee.id.to_string(),
        SortColumn::Name => employee.name.clone(),
        SortColumn::Department => employee.department.clone(),
        SortColumn::Position => employee.position.clone(),
        SortColumn::Salary => format_salary(employee.salary),
        SortColumn::HireDate => employee.hire_date.clone(),
        SortColumn::YearsEmployed => employee.years_employed.to_string(),
        SortColumn::PerformanceRating => format_rating(employee.performance_rating),
    }
}

/// `75000` => `$75,000`
pub fn format_salary(salary: i64) -> String {
    let digits = salary.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if salary < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

/// Average salary in whole thousands, `75000.0` => `$75k`.
pub fn format_avg_salary(avg_salary: f64) -> String {
    format!("${}k", (avg_salary / 1000.0).round())
}

pub fn pagination_text(page: u32, total_pages: u32, total_items: u64) -> String {
    format!("Page {page} of {total_pages} ({total_items} items)")
}

/// Which paging buttons are enabled for a page out of `total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl PaginationControls {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let has_previous = page > 1;
        let has_next = page < total_pages;
        Self {
            first: has_previous,
            previous: has_previous,
            next: has_next,
            last: has_next,
        }
    }
}
