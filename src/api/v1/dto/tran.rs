/*
 * Responsibility
 * - Body of POST /tranexample: one user and one product created together
 */
use serde::Deserialize;

use super::{products::CreateProductRequest, users::CreateUserRequest};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTranRequest {
    pub user: CreateUserRequest,
    pub product: CreateProductRequest,
}

impl CreateTranRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        self.user.validate()?;
        self.product.validate()
    }
}
