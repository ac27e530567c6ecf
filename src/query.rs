//! Client side query state of the table view.
//!
//! `QueryState` is a plain value with pure transitions. `QueryStateHolder` owns the
//! current value for one mounted view and applies the transitions in place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    Five,
    #[default]
    Ten,
    TwentyFive,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Five,
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
    ];

    pub fn value(&self) -> u32 {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
        }
    }

    pub fn from_value(value: u32) -> Option<PageSize> {
        PageSize::ALL.into_iter().find(|p| p.value() == value)
    }

    pub fn next(&self) -> PageSize {
        let idx = PageSize::ALL.iter().position(|p| p == self).unwrap_or(0);
        PageSize::ALL[(idx + 1) % PageSize::ALL.len()]
    }
}

/// Columns the table view can sort by, named as the server expects them in `sort_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Department,
    Position,
    Salary,
    HireDate,
    YearsEmployed,
    PerformanceRating,
}

impl SortColumn {
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Id,
        SortColumn::Name,
        SortColumn::Department,
        SortColumn::Position,
        SortColumn::Salary,
        SortColumn::HireDate,
        SortColumn::YearsEmployed,
        SortColumn::PerformanceRating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::Department => "department",
            SortColumn::Position => "position",
            SortColumn::Salary => "salary",
            SortColumn::HireDate => "hire_date",
            SortColumn::YearsEmployed => "years_employed",
            SortColumn::PerformanceRating => "performance_rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(&self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub page: u32,
    pub page_size: PageSize,
    pub sort_column: Option<SortColumn>,
    pub sort_order: SortOrder,
    pub department: Option<String>,
    pub search: Option<String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::default(),
            sort_column: None,
            sort_order: SortOrder::Asc,
            department: None,
            search: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl QueryState {
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: PageSize) -> Self {
        Self {
            page: 1,
            page_size,
            ..self.clone()
        }
    }

    /// Sorting the current column flips the order, any other column starts ascending.
    pub fn with_sort(&self, column: SortColumn) -> Self {
        let sort_order = if self.sort_column == Some(column) {
            self.sort_order.toggled()
        } else {
            SortOrder::Asc
        };
        Self {
            page: 1,
            sort_column: Some(column),
            sort_order,
            ..self.clone()
        }
    }

    pub fn with_department(&self, department: Option<&str>) -> Self {
        Self {
            page: 1,
            department: non_empty(department),
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: Option<&str>) -> Self {
        Self {
            page: 1,
            search: non_empty(search),
            ..self.clone()
        }
    }

    /// Query string parameters of the `/api/dataframe/data` request for this state.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.value().to_string()),
        ];
        if let Some(column) = self.sort_column {
            params.push(("sort_by", column.as_str().to_string()));
        }
        params.push(("sort_order", self.sort_order.as_str().to_string()));
        if let Some(department) = &self.department {
            params.push(("department", department.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

/// Owns the query state of one mounted table view.
#[derive(Debug, Default)]
pub struct QueryStateHolder {
    state: QueryState,
}

impl QueryStateHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn set_page(&mut self, page: u32) {
        self.state = self.state.with_page(page);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.state = self.state.with_page_size(page_size);
    }

    pub fn set_sort(&mut self, column: SortColumn) {
        self.state = self.state.with_sort(column);
    }

    pub fn set_department_filter(&mut self, department: Option<&str>) {
        self.state = self.state.with_department(department);
    }

    pub fn set_search_term(&mut self, search: Option<&str>) {
        self.state = self.state.with_search(search);
    }

    /// Take over pagination the server answered with, e.g. a clamped page.
    pub fn adopt_pagination(&mut self, page: u32, page_size: u32) {
        self.state.page = page.max(1);
        if let Some(size) = PageSize::from_value(page_size) {
            self.state.page_size = size;
        }
    }
}
