/*
 * Responsibility
 * - Homes request/response DTOs
 * - type is SINGLE | CONDO; address1, zip, city, state, country are required
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::repos::home_repo::{Address, HomeChanges, HomeFilter, HomeRow, HomeType, NewHome};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody {
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl AddressBody {
    fn check(&self, fields: &mut Vec<FieldError>) {
        let required = [
            ("address.address1", &self.address1),
            ("address.zipCode", &self.zip_code),
            ("address.city", &self.city),
            ("address.state", &self.state),
            ("address.country", &self.country),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                fields.push(FieldError::new(name, "is required"));
            }
        }
    }
}

impl From<AddressBody> for Address {
    fn from(a: AddressBody) -> Self {
        Self {
            address1: a.address1,
            address2: a.address2,
            zip_code: a.zip_code,
            city: a.city,
            state: a.state,
            country: a.country,
        }
    }
}

impl From<Address> for AddressBody {
    fn from(a: Address) -> Self {
        Self {
            address1: a.address1,
            address2: a.address2,
            zip_code: a.zip_code,
            city: a.city,
            state: a.state,
            country: a.country,
        }
    }
}

fn parse_type(value: &str, fields: &mut Vec<FieldError>) -> Option<HomeType> {
    match HomeType::parse(value) {
        Ok(t) => Some(t),
        Err(e) => {
            fields.push(FieldError::new("type", e.to_string()));
            None
        }
    }
}

fn finish<T>(fields: Vec<FieldError>, value: Option<T>) -> Result<T, AppError> {
    match value {
        Some(v) if fields.is_empty() => Ok(v),
        _ => Err(AppError::validation("data validation error", fields)),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHomeRequest {
    #[serde(rename = "type")]
    pub home_type: String,
    pub address: AddressBody,
}

impl CreateHomeRequest {
    /// Validates and builds the row to insert; the caller becomes the owner.
    pub fn into_new(self, user_id: Uuid) -> Result<NewHome, AppError> {
        let mut fields = Vec::new();
        let home_type = parse_type(&self.home_type, &mut fields);
        self.address.check(&mut fields);

        let home_type = finish(fields, home_type)?;
        Ok(NewHome {
            user_id,
            home_type,
            address: self.address.into(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHomeRequest {
    #[serde(rename = "type")]
    pub home_type: Option<String>,
    pub address: Option<AddressBody>,
}

impl UpdateHomeRequest {
    pub fn into_changes(self) -> Result<HomeChanges, AppError> {
        let mut fields = Vec::new();
        let home_type = match &self.home_type {
            Some(t) => parse_type(t, &mut fields).map(Some),
            None => Some(None),
        };
        if let Some(address) = &self.address {
            address.check(&mut fields);
        }

        let home_type = finish(fields, home_type)?;
        Ok(HomeChanges {
            home_type,
            address: self.address.map(Address::from),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub home_type: HomeType,
    pub address: AddressBody,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl From<HomeRow> for HomeResponse {
    fn from(row: HomeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            home_type: row.home_type,
            address: row.address.into(),
            date_created: row.date_created,
            date_updated: row.date_updated,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFilterParams {
    pub home_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub home_type: Option<String>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

impl TryFrom<HomeFilterParams> for HomeFilter {
    type Error = AppError;

    fn try_from(p: HomeFilterParams) -> Result<Self, Self::Error> {
        let home_type = match p.home_type.as_deref() {
            Some(t) => Some(HomeType::parse(t).map_err(|e| AppError::field("type", e.to_string()))?),
            None => None,
        };
        Ok(Self {
            id: p.home_id,
            user_id: p.user_id,
            home_type,
            start_created_date: p.start_created_date,
            end_created_date: p.end_created_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> AddressBody {
        AddressBody {
            address1: "123 Mocking Bird Lane".into(),
            address2: String::new(),
            zip_code: "35810".into(),
            city: "Huntsville".into(),
            state: "AL".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn create_sets_owner_and_parses_type() {
        let owner = Uuid::new_v4();
        let new = CreateHomeRequest {
            home_type: "condo".into(),
            address: address(),
        }
        .into_new(owner)
        .unwrap();

        assert_eq!(new.user_id, owner);
        assert_eq!(new.home_type, HomeType::Condo);
    }

    #[test]
    fn create_reports_every_bad_field() {
        let mut addr = address();
        addr.city.clear();
        let err = CreateHomeRequest {
            home_type: "castle".into(),
            address: addr,
        }
        .into_new(Uuid::nil())
        .unwrap_err();

        match err {
            AppError::Validation { fields, .. } => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["type", "address.city"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn update_without_type_keeps_it() {
        let changes = UpdateHomeRequest {
            home_type: None,
            address: Some(address()),
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.home_type, None);
        assert!(changes.address.is_some());
    }
}
