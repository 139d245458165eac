use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub type ExpenseId = i64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(deserialize_with = "de_timestamp")]
    pub date: NaiveDateTime,
    #[serde(default, deserialize_with = "de_opt_group_id")]
    pub receipt_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseUpdate {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: Option<i64>,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(deserialize_with = "de_timestamp")]
    pub end_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub ai_provider: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Insights {
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
    #[serde(default)]
    pub top_categories: Vec<CategorySpend>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthlyTotal {
    pub month: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MonthlyTrends {
    #[serde(default)]
    pub data: Vec<MonthlyTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Parses the timestamp shapes the API emits: RFC 3339, a naive date-time,
/// or a bare calendar date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn de_opt_group_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_expense_from_api_json() {
        let raw = r#"{
            "id": 7,
            "description": "Coffee",
            "amount": 4.5,
            "category": null,
            "date": "2024-05-01T08:30:00",
            "receipt_group_id": "a1b2"
        }"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.id, 7);
        assert_eq!(expense.amount, Decimal::from_str("4.5").unwrap());
        assert_eq!(expense.category, None);
        assert_eq!(expense.receipt_group_id.as_deref(), Some("a1b2"));
        assert_eq!(expense.date.format("%Y-%m-%d").to_string(), "2024-05-01");
    }

    #[test]
    fn test_expense_without_group() {
        let raw = r#"{"id":1,"description":"Rent","amount":1200,"date":"2024-01-01"}"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.amount, Decimal::from(1200));
        assert!(expense.receipt_group_id.is_none());
    }

    #[test]
    fn test_numeric_group_id() {
        let raw = r#"{"id":1,"description":"x","amount":1,"date":"2024-01-01","receipt_group_id":42}"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.receipt_group_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-03-10T12:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-10T12:00:00.123456").is_some());
        assert!(parse_timestamp("2024-03-10").is_some());
        assert!(parse_timestamp("March 10").is_none());
    }

    #[test]
    fn test_update_serializes_amount_as_number() {
        let update = ExpenseUpdate {
            description: "Lunch".into(),
            amount: Decimal::from_str("12.75").unwrap(),
            category: Some("Food".into()),
            date: Utc.from_utc_datetime(
                &NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["amount"], serde_json::json!(12.75));
        assert_eq!(json["category"], "Food");
        assert_eq!(json["date"], "2024-02-01T00:00:00Z");
    }
}
