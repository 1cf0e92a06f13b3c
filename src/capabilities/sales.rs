use std::io::ErrorKind;
use std::path::Path;

use csv::{Position, StringRecord};
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use super::LookupError;

const NO_DATA: &str = "No data found for the specified criteria";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalesQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
    pub products_sold: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct SaleRecord {
    date: Date,
    category: String,
    amount: f64,
    quantity: i64,
}

pub(super) async fn get_sales_data(
    path: &Path,
    query: &SalesQuery,
) -> Result<SalesSummary, LookupError> {
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|date| !date.is_empty())
        .map(parse_query_date)
        .transpose()?;

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(LookupError::Data("Sales data file not found".to_string()));
        }
        Err(err) => {
            return Err(LookupError::Data(format!(
                "failed to read {}: {err}",
                path.display()
            )));
        }
    };

    let records = parse_sales_csv(&content)?;
    summarize(&records, date, query.product_category.as_deref())
}

fn parse_query_date(raw: &str) -> Result<Date, LookupError> {
    parse_day(raw)
        .ok_or_else(|| LookupError::Data(format!("invalid date '{raw}': expected YYYY-MM-DD")))
}

fn parse_day(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn parse_cell_date(raw: &str) -> Option<Date> {
    let (day, rest) = raw.split_at_checked(10)?;
    if !(rest.is_empty() || rest.starts_with([' ', 'T'])) {
        return None;
    }
    parse_day(day)
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    date: String,
    category: String,
    amount: String,
    quantity: String,
}

fn parse_sales_csv(content: &str) -> Result<Vec<SaleRecord>, LookupError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    if headers.iter().all(str::is_empty) {
        return Err(LookupError::Data("Sales data file is empty".to_string()));
    }
    for name in ["date", "category", "amount", "quantity"] {
        if !headers.iter().any(|header| header == name) {
            return Err(LookupError::Data(format!(
                "Sales data is missing the `{name}` column"
            )));
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line_no = row.position().map_or(0, Position::line);
        let invalid = |field: &str, value: &str| {
            LookupError::Data(format!(
                "Sales data line {line_no}: invalid {field} '{value}'"
            ))
        };
        let row: SaleRow = row
            .deserialize(Some(&headers))
            .map_err(|err| LookupError::Data(format!("Sales data line {line_no}: {err}")))?;

        records.push(SaleRecord {
            date: parse_cell_date(&row.date).ok_or_else(|| invalid("date", &row.date))?,
            amount: row
                .amount
                .parse::<f64>()
                .map_err(|_| invalid("amount", &row.amount))?,
            quantity: row
                .quantity
                .parse::<i64>()
                .map_err(|_| invalid("quantity", &row.quantity))?,
            category: row.category,
        });
    }

    Ok(records)
}

fn csv_error(err: csv::Error) -> LookupError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => LookupError::Data(format!(
            "Sales data line {}: expected {expected_len} columns, found {len}",
            pos.as_ref().map_or(0, Position::line)
        )),
        _ => LookupError::Data(format!("Sales data could not be read: {err}")),
    }
}

fn summarize(
    records: &[SaleRecord],
    date: Option<Date>,
    product_category: Option<&str>,
) -> Result<SalesSummary, LookupError> {
    let product_category = product_category
        .map(str::trim)
        .filter(|category| !category.is_empty());

    let selected: Vec<&SaleRecord> = records
        .iter()
        .filter(|record| date.is_none_or(|date| record.date == date))
        .filter(|record| {
            product_category.is_none_or(|category| record.category.eq_ignore_ascii_case(category))
        })
        .collect();

    if selected.is_empty() {
        return Err(LookupError::Data(NO_DATA.to_string()));
    }

    let products_sold = selected
        .iter()
        .try_fold(0_i64, |sold, record| sold.checked_add(record.quantity))
        .ok_or_else(|| LookupError::Data("Sales quantities are too large to add up".to_string()))?;
    let total_sales: f64 = selected.iter().map(|record| record.amount).sum();
    let total_orders = selected.len();
    Ok(SalesSummary {
        total_sales,
        total_orders,
        average_order_value: total_sales / total_orders as f64,
        products_sold,
    })
}
