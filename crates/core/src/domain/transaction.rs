use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::normalize::{parse_amount, parse_date, sanitize_amount};

/// Revenue as it arrives from the ledger: a JSON number or a locale string.
///
/// Any other JSON shape deserializes as empty text and so counts as zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Number(value) => sanitize_amount(*value),
            Self::Text(value) => parse_amount(value),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(number) => Self::Number(number.as_f64().unwrap_or(0.0)),
            Value::String(text) => Self::Text(text.clone()),
            _ => Self::Text(String::new()),
        }
    }
}

impl Default for RawAmount {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_json(&value))
    }
}

const CLIENT_ID_KEYS: &[&str] = &["client_id", "clientId", "client_code"];
const CLIENT_NAME_KEYS: &[&str] = &["client_name", "clientName"];
const SPHERE_KEYS: &[&str] = &["sphere", "businessSphere"];
const PRODUCT_CODE_KEYS: &[&str] = &["product_code", "productCode"];
const PRODUCT_ID_KEYS: &[&str] = &["product_id", "productId"];
const PRODUCT_NAME_KEYS: &[&str] = &["product_name", "productName"];
const REVENUE_KEYS: &[&str] = &["revenue", "amount", "sum"];
const DATE_KEYS: &[&str] = &["date", "transaction_date"];

/// One ledger line exactly as an import batch produced it.
///
/// Older batches stored values under different column names and types, so
/// deserialization never fails: a record that is not an object yields an
/// empty line, codes may be strings or numbers, and when several spellings
/// of a column are present the canonical one wins. The product code is
/// resolved once by [`RawTransaction::normalize`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawTransaction {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub sphere: Option<String>,
    pub product_code: Option<String>,
    pub product_id: Option<String>,
    pub nomenclature_code: Option<String>,
    pub item_code: Option<String>,
    pub product_name: Option<String>,
    pub revenue: Option<RawAmount>,
    /// Raw date text. Non-string JSON dates are kept as their JSON text and
    /// fail to parse later.
    pub date: Option<String>,
    pub manager: Option<String>,
}

impl<'de> Deserialize<'de> for RawTransaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_json(&value))
    }
}

impl RawTransaction {
    pub fn from_json(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };
        let text = |keys: &[&str]| first_text(fields, keys);

        Self {
            client_id: text(CLIENT_ID_KEYS),
            client_name: text(CLIENT_NAME_KEYS),
            sphere: text(SPHERE_KEYS),
            product_code: text(PRODUCT_CODE_KEYS),
            product_id: text(PRODUCT_ID_KEYS),
            nomenclature_code: text(&["nomenclature_code"]),
            item_code: text(&["item_code"]),
            product_name: text(PRODUCT_NAME_KEYS),
            revenue: first_present(fields, REVENUE_KEYS).map(RawAmount::from_json),
            date: first_present(fields, DATE_KEYS).map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }),
            manager: text(&["manager"]),
        }
    }

    /// First non-empty product code in canonical-then-legacy order.
    pub fn resolved_product_code(&self) -> Option<&str> {
        [&self.product_code, &self.product_id, &self.nomenclature_code, &self.item_code]
            .into_iter()
            .find_map(|field| non_empty(field.as_deref()))
    }

    /// Converts the raw line into a typed [`Transaction`].
    ///
    /// Returns `None` when the line has no client identifier. Unparseable
    /// dates are logged and the transaction is kept undated.
    pub fn normalize(&self) -> Option<Transaction> {
        let client_id = non_empty(self.client_id.as_deref())?.to_string();

        let raw_date = non_empty(self.date.as_deref());
        let date = raw_date.and_then(parse_date);
        if let (Some(raw), None) = (raw_date, date) {
            tracing::warn!(
                event_name = "ledger.normalize.unparseable_date",
                client_id = %client_id,
                raw_date = raw,
                "transaction date could not be parsed; excluded from date comparisons"
            );
        }

        Some(Transaction {
            client_id,
            client_name: owned(self.client_name.as_deref()),
            sphere: owned(self.sphere.as_deref()),
            product_code: self.resolved_product_code().unwrap_or_default().to_string(),
            product_name: owned(self.product_name.as_deref()),
            revenue: self.revenue.as_ref().map(RawAmount::to_f64).unwrap_or(0.0),
            date,
            manager: owned(self.manager.as_deref()),
        })
    }
}

/// A normalized ledger line. Revenue is finite and non-negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub client_id: String,
    pub client_name: String,
    pub sphere: String,
    /// Empty when no product column carried a value.
    pub product_code: String,
    pub product_name: String,
    pub revenue: f64,
    pub date: Option<NaiveDateTime>,
    pub manager: String,
}

impl Transaction {
    pub fn has_product(&self) -> bool {
        !self.product_code.is_empty()
    }
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| fields.get(*key)).find(|value| !value.is_null())
}

/// First spelling whose value is a non-blank string or a number.
fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| match fields.get(*key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .find(|text| !text.trim().is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn owned(value: Option<&str>) -> String {
    non_empty(value).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::{RawAmount, RawTransaction};

    fn raw(client_id: &str) -> RawTransaction {
        RawTransaction { client_id: Some(client_id.to_string()), ..RawTransaction::default() }
    }

    #[test]
    fn product_code_prefers_canonical_field() {
        let mut line = raw("C1");
        line.product_code = Some("P-NEW".to_string());
        line.product_id = Some("P-OLD".to_string());
        line.item_code = Some("P-OLDEST".to_string());

        assert_eq!(line.resolved_product_code(), Some("P-NEW"));
    }

    #[test]
    fn product_code_falls_back_in_fixed_order() {
        let mut line = raw("C1");
        line.product_code = Some("   ".to_string());
        line.nomenclature_code = Some("NOM-7".to_string());
        line.item_code = Some("ITEM-7".to_string());

        assert_eq!(line.resolved_product_code(), Some("NOM-7"));

        line.nomenclature_code = None;
        assert_eq!(line.resolved_product_code(), Some("ITEM-7"));
    }

    #[test]
    fn lines_without_client_are_skipped() {
        assert!(RawTransaction::default().normalize().is_none());
        assert!(raw("  ").normalize().is_none());
    }

    #[test]
    fn normalize_parses_revenue_and_tolerates_bad_dates() {
        let mut line = raw(" C1 ");
        line.revenue = Some(RawAmount::Text("1 234,50".to_string()));
        line.date = Some("not a date".to_string());

        let transaction = line.normalize().expect("client id present");
        assert_eq!(transaction.client_id, "C1");
        assert_eq!(transaction.revenue, 1234.5);
        assert_eq!(transaction.date, None);
        assert!(!transaction.has_product());
    }

    #[test]
    fn deserializes_legacy_column_names() {
        let line: RawTransaction = serde_json::from_str(
            r#"{"clientId":"C9","productId":"P1","amount":"10,5","transaction_date":"2024-01-02"}"#,
        )
        .expect("legacy line parses");

        let transaction = line.normalize().expect("client id present");
        assert_eq!(transaction.product_code, "P1");
        assert_eq!(transaction.revenue, 10.5);
        assert!(transaction.date.is_some());
    }

    #[test]
    fn numeric_codes_are_read_as_text() {
        let line: RawTransaction =
            serde_json::from_str(r#"{"client_id":12345,"product_code":700,"revenue":5}"#)
                .expect("numeric codes parse");

        let transaction = line.normalize().expect("client id present");
        assert_eq!(transaction.client_id, "12345");
        assert_eq!(transaction.product_code, "700");
    }

    #[test]
    fn odd_shapes_degrade_instead_of_failing_the_ledger() {
        let ledger: Vec<RawTransaction> = serde_json::from_str(
            r#"[
                {"client_id":"C1","revenue":true,"date":"2024-01-02"},
                {"client_id":"C2","revenue":"10","date":{"$date":"2024-01-02"}},
                {"client_id":["C3"],"revenue":1},
                "not a record",
                {"client_id":"C4","revenue":"7,5","date":"2024-01-03"}
            ]"#,
        )
        .expect("ledger parses");

        let transactions: Vec<_> = ledger.iter().filter_map(RawTransaction::normalize).collect();
        let ids: Vec<_> = transactions.iter().map(|t| t.client_id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C4"]);
        assert_eq!(transactions[0].revenue, 0.0);
        assert!(transactions[0].date.is_some());
        assert_eq!(transactions[1].revenue, 10.0);
        assert_eq!(transactions[1].date, None);
        assert_eq!(transactions[2].revenue, 7.5);
    }

    #[test]
    fn canonical_column_wins_over_legacy_spelling() {
        let line: RawTransaction = serde_json::from_str(
            r#"{"clientId":"OLD","client_id":"NEW","sum":"1","revenue":"2","amount":"3"}"#,
        )
        .expect("duplicate spellings parse");

        assert_eq!(line.client_id.as_deref(), Some("NEW"));
        assert_eq!(line.revenue, Some(RawAmount::Text("2".to_string())));
    }

    #[test]
    fn blank_canonical_column_falls_through_to_legacy_spelling() {
        let line: RawTransaction =
            serde_json::from_str(r#"{"client_id":"  ","client_code":"C7","amount":null,"sum":4}"#)
                .expect("line parses");

        assert_eq!(line.client_id.as_deref(), Some("C7"));
        assert_eq!(line.revenue, Some(RawAmount::Number(4.0)));
    }

    #[test]
    fn numeric_revenue_is_clamped() {
        assert_eq!(RawAmount::Number(-3.0).to_f64(), 0.0);
        assert_eq!(RawAmount::Number(f64::NAN).to_f64(), 0.0);
        assert_eq!(RawAmount::Number(99.5).to_f64(), 99.5);
    }
}
