/// A center or program looked up by its natural-key name.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

/// Income payload produced by the row mapper, ready for insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncomeRecord {
    pub month: u32,
    pub year: i32,
    pub center_id: i64,
    pub program_id: i64,
    pub number_of_classes: i64,
    pub number_of_students: i64,
    pub revenue: f64,
}

/// Expense payload. Optional numerics stay `None` when the cell was absent,
/// so "not provided" never collapses into zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpenseRecord {
    pub month: u32,
    pub year: i32,
    pub center_id: i64,
    pub category: String,
    pub item: String,
    pub position: Option<String>,
    pub contract_type: Option<String>,
    pub hours: Option<f64>,
    pub unit_price: Option<f64>,
    pub kilometers: Option<f64>,
    pub travel_allowance: Option<f64>,
    pub responsible: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub amount: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub id: i64,
    pub filename: String,
    pub checksum: String,
    pub income_imported: i64,
    pub expense_imported: i64,
    pub error_count: i64,
    pub import_date: String,
}
