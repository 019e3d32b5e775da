use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Ingredient, IngredientStatus};

/// Create payload. The serde aliases accept the legacy localized field
/// names still sent by the older admin clients.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    #[serde(alias = "codigo")]
    pub code: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "categoria")]
    pub category: String,
    #[serde(alias = "preco_compra")]
    pub purchase_price: i64,
    #[serde(alias = "preco_venda")]
    pub sale_price: i64,
    #[serde(alias = "quantidade_estoque")]
    pub stock_quantity: f64,
    #[serde(alias = "estoque_minimo")]
    pub minimum_stock: f64,
    #[serde(alias = "fornecedor")]
    pub supplier: Option<String>,
    #[serde(alias = "localizacao")]
    pub location: Option<String>,
    #[serde(alias = "data_ultima_compra")]
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(alias = "unidade_medida")]
    pub unit_of_measure: String,
    #[serde(alias = "data_validade")]
    pub expiry_date: NaiveDate,
    #[serde(alias = "imagem")]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateIngredientRequest {
    #[serde(alias = "codigo")]
    pub code: Option<String>,
    #[serde(alias = "nome")]
    pub name: Option<String>,
    #[serde(alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    #[serde(alias = "preco_compra")]
    pub purchase_price: Option<i64>,
    #[serde(alias = "preco_venda")]
    pub sale_price: Option<i64>,
    #[serde(alias = "quantidade_estoque")]
    pub stock_quantity: Option<f64>,
    #[serde(alias = "estoque_minimo")]
    pub minimum_stock: Option<f64>,
    #[serde(alias = "fornecedor")]
    pub supplier: Option<String>,
    #[serde(alias = "localizacao")]
    pub location: Option<String>,
    #[serde(alias = "data_ultima_compra")]
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(alias = "unidade_medida")]
    pub unit_of_measure: Option<String>,
    #[serde(alias = "data_validade")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(alias = "imagem")]
    pub image: Option<String>,
}

/// An ingredient together with its flags evaluated at response time.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientWithStatus {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    #[serde(flatten)]
    pub status: IngredientStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientList {
    pub items: Vec<IngredientWithStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_aliases_map_to_canonical_fields() {
        let payload = serde_json::json!({
            "codigo": "QUE-01",
            "nome": "Queijo",
            "categoria": "laticinios",
            "preco_compra": 1890,
            "preco_venda": 0,
            "quantidade_estoque": 12.5,
            "estoque_minimo": 4.0,
            "unidade_medida": "kg",
            "data_validade": "2025-09-30"
        });
        let req: CreateIngredientRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(req.code, "QUE-01");
        assert_eq!(req.name, "Queijo");
        assert_eq!(req.stock_quantity, 12.5);
        assert_eq!(req.unit_of_measure, "kg");
        assert_eq!(
            req.expiry_date,
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
    }

    #[test]
    fn canonical_field_names_still_work() {
        let payload = serde_json::json!({
            "code": "TOM-02",
            "name": "Tomato",
            "category": "produce",
            "purchase_price": 500,
            "sale_price": 0,
            "stock_quantity": 3.0,
            "minimum_stock": 1.0,
            "unit_of_measure": "kg",
            "expiry_date": "2025-08-15"
        });
        let req: CreateIngredientRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(req.code, "TOM-02");
        assert_eq!(req.minimum_stock, 1.0);
    }
}
