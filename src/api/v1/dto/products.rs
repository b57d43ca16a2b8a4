/*
 * Responsibility
 * - Products request/response DTOs
 * - cost >= 0, quantity >= 1
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::repos::product_repo::{NewProduct, ProductChanges, ProductFilter, ProductRow};

fn check_cost(cost: f64, fields: &mut Vec<FieldError>) {
    if !cost.is_finite() || cost < 0.0 {
        fields.push(FieldError::new("cost", "cost must be 0 or greater"));
    }
}

fn check_quantity(quantity: i32, fields: &mut Vec<FieldError>) {
    if quantity < 1 {
        fields.push(FieldError::new("quantity", "quantity must be 1 or greater"));
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub cost: f64,
    pub quantity: i32,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push(FieldError::new("name", "name is required"));
        }
        check_cost(self.cost, &mut fields);
        check_quantity(self.quantity, &mut fields);

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation("data validation error", fields))
        }
    }

    /// The caller becomes the owner.
    pub fn into_new(self, user_id: Uuid) -> NewProduct {
        NewProduct {
            user_id,
            name: self.name,
            cost: self.cost,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub quantity: Option<i32>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            fields.push(FieldError::new("name", "name cannot be empty"));
        }
        if let Some(cost) = self.cost {
            check_cost(cost, &mut fields);
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity, &mut fields);
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation("data validation error", fields))
        }
    }
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            cost: req.cost,
            quantity: req.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub name: String,
    pub cost: f64,
    pub quantity: i32,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            cost: row.cost,
            quantity: row.quantity,
            date_created: row.date_created,
            date_updated: row.date_updated,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilterParams {
    pub product_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub quantity: Option<i32>,
}

impl From<ProductFilterParams> for ProductFilter {
    fn from(p: ProductFilterParams) -> Self {
        Self {
            id: p.product_id,
            user_id: p.user_id,
            name: p.name,
            cost: p.cost,
            quantity: p.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_and_quantity_bounds() {
        let ok = CreateProductRequest {
            name: "Comic Books".into(),
            cost: 0.0,
            quantity: 1,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateProductRequest {
            name: " ".into(),
            cost: -1.0,
            quantity: 0,
        };
        match bad.validate() {
            Err(AppError::Validation { fields, .. }) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["name", "cost", "quantity"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateProductRequest::default().validate().is_ok());
        let bad = UpdateProductRequest {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
