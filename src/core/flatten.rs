//! Flattener: one tabular row per (bill, line item).
//!
//! Order-preserving and total: every item of every detail yields exactly one
//! row, in input order. Bills without items contribute no rows.

use serde::Serialize;
use serde_json::Value;

use super::models::BillDetail;
use crate::error::Result;

/// Output column names, in order.
pub const COLUMNS: [&str; 13] = [
    "billId",
    "sessionCreated",
    "createdAt",
    "paidAt",
    "finalPrice",
    "finalPriceWithoutTax",
    "paymentMethod",
    "createdBy_userName",
    "items_name",
    "items_amount",
    "items_price",
    "items_vatRate",
    "items_productId",
];

/// One flattened line item with its bill-level fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillRow {
    pub bill_id: String,
    pub session_created: String,
    pub created_at: String,
    pub paid_at: String,
    pub final_price: String,
    pub final_price_without_tax: String,
    pub payment_method: String,
    pub created_by_user_name: String,
    pub item_name: String,
    pub item_amount: String,
    pub item_price: String,
    pub item_vat_rate: String,
    pub item_product_id: String,
}

impl BillRow {
    /// Cells in [`COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 13] {
        [
            &self.bill_id,
            &self.session_created,
            &self.created_at,
            &self.paid_at,
            &self.final_price,
            &self.final_price_without_tax,
            &self.payment_method,
            &self.created_by_user_name,
            &self.item_name,
            &self.item_amount,
            &self.item_price,
            &self.item_vat_rate,
            &self.item_product_id,
        ]
    }
}

/// Render a JSON scalar as a cell.
#[must_use]
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten typed details.
#[must_use]
pub fn flatten(details: &[BillDetail]) -> Vec<BillRow> {
    details
        .iter()
        .flat_map(|bill| {
            let user_name = bill
                .created_by
                .as_ref()
                .map(|c| cell(&c.user_name))
                .unwrap_or_default();
            bill.items.iter().map(move |item| BillRow {
                bill_id: bill.bill_id.clone(),
                session_created: cell(&bill.session_created),
                created_at: cell(&bill.created_at),
                paid_at: cell(&bill.paid_at),
                final_price: cell(&bill.final_price),
                final_price_without_tax: cell(&bill.final_price_without_tax),
                payment_method: cell(&bill.payment_method),
                created_by_user_name: user_name.clone(),
                item_name: cell(&item.name),
                item_amount: cell(&item.amount),
                item_price: cell(&item.price),
                item_vat_rate: cell(&item.vat_rate),
                item_product_id: cell(&item.product_id),
            })
        })
        .collect()
}

/// Flatten raw detail documents as stored.
///
/// # Errors
///
/// Returns `ParseResponse` if a document is not a bill detail.
pub fn flatten_documents(docs: &[Value]) -> Result<Vec<BillRow>> {
    let details = docs
        .iter()
        .map(BillDetail::from_document)
        .collect::<Result<Vec<_>>>()?;
    Ok(flatten(&details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_bill_detail;
    use serde_json::json;

    #[test]
    fn row_count_is_sum_of_items() {
        let docs = vec![make_bill_detail("b1", 3), make_bill_detail("b2", 1)];
        let rows = flatten_documents(&docs).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn rows_preserve_input_order() {
        let docs = vec![
            make_bill_detail("b2", 2),
            make_bill_detail("b1", 1),
            make_bill_detail("b3", 1),
        ];
        let ids: Vec<_> = flatten_documents(&docs)
            .unwrap()
            .into_iter()
            .map(|r| r.bill_id)
            .collect();
        assert_eq!(ids, vec!["b2", "b2", "b1", "b3"]);
    }

    #[test]
    fn bill_fields_are_copied_onto_every_item_row() {
        let doc = json!({
            "billId": "b1",
            "sessionCreated": "2024-03-01T08:00:00Z",
            "createdAt": "2024-03-01T09:15:00Z",
            "paidAt": "2024-03-01T09:20:00Z",
            "finalPrice": "150.00",
            "finalPriceWithoutTax": "130.43",
            "paymentMethod": "card",
            "createdBy": {"userName": "anna"},
            "items": [
                {"name": "Espresso", "amount": 2, "price": "50.00", "vatRate": 15, "productId": "p-1"},
                {"name": "Cake", "amount": 1, "price": "50.00", "vatRate": 15, "productId": 77}
            ]
        });

        let rows = flatten_documents(&[doc]).unwrap();

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.bill_id, "b1");
            assert_eq!(row.final_price, "150.00");
            assert_eq!(row.payment_method, "card");
            assert_eq!(row.created_by_user_name, "anna");
        }
        assert_eq!(rows[0].item_name, "Espresso");
        assert_eq!(rows[0].item_amount, "2");
        assert_eq!(rows[1].item_product_id, "77");
    }

    #[test]
    fn bill_without_items_yields_no_rows() {
        let rows = flatten_documents(&[json!({"billId": "b1"})]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_scalars_render_empty() {
        let rows = flatten_documents(&[json!({"billId": "b1", "items": [{}]})]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].paid_at, "");
        assert_eq!(rows[0].created_by_user_name, "");
        assert_eq!(rows[0].item_name, "");
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(flatten_documents(&[json!(["not", "a", "bill"])]).is_err());
    }

    #[test]
    fn null_items_yield_no_rows() {
        let rows = flatten_documents(&[
            json!({"billId": "b1", "items": null}),
            json!({"billId": "b2", "createdBy": null, "items": [{"name": "Tea"}]}),
        ])
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bill_id, "b2");
        assert_eq!(rows[0].created_by_user_name, "");
    }

    #[test]
    fn cells_follow_column_order() {
        let row = BillRow {
            bill_id: "id".to_string(),
            item_product_id: "pid".to_string(),
            ..BillRow::default()
        };
        let cells = row.cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "id");
        assert_eq!(cells[12], "pid");
    }
}
