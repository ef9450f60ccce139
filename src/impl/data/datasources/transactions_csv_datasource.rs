use std::str::FromStr as _;

use fractic_server_error::ServerError;
use uuid::Uuid;

use crate::{
    data::models::{amount_model::AmountModel, iso_date_model::ISODateModel},
    entities::{BudgetId, NewTransaction, UserId, VendorId},
    errors::{InvalidCsv, InvalidCsvContent},
};

/// Reads expense submissions from CSV with a header row and the columns:
///
/// `date, description, amount, category, vendor_id, notes`
///
/// Only `date`, `description` and `amount` are required; empty optional cells
/// are treated as absent.
pub(crate) trait TransactionsCsvDatasource {
    fn from_string(
        &self,
        s: &str,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<NewTransaction>, ServerError>;
}

pub(crate) struct TransactionsCsvDatasourceImpl;

impl TransactionsCsvDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

impl TransactionsCsvDatasource for TransactionsCsvDatasourceImpl {
    fn from_string(
        &self,
        s: &str,
        budget_id: BudgetId,
        created_by: UserId,
    ) -> Result<Vec<NewTransaction>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .enumerate()
            .map(|(i, r)| {
                r.map_err(|e| InvalidCsv::with_debug(&e)).and_then(|r| {
                    // Extract from CSV record.
                    let raw_date = r.get(0).unwrap_or("");
                    let raw_description = non_empty(r.get(1));
                    let raw_amount = r.get(2).unwrap_or("");
                    let raw_category = non_empty(r.get(3));
                    let raw_vendor = non_empty(r.get(4));
                    let raw_notes = non_empty(r.get(5));

                    // Parse.
                    let created_at = ISODateModel::from_str(raw_date)?;
                    let description = raw_description.ok_or_else(|| {
                        InvalidCsvContent::new(&format!("row {} has no description", i + 1))
                    })?;
                    let amount = AmountModel::from_str(raw_amount)?;
                    let vendor_id = raw_vendor
                        .map(|v| {
                            Uuid::parse_str(v).map(VendorId::from).map_err(|e| {
                                InvalidCsvContent::with_debug(
                                    &format!("row {} has invalid vendor id '{}'", i + 1, v),
                                    &e,
                                )
                            })
                        })
                        .transpose()?;

                    // Build.
                    Ok(NewTransaction {
                        description: description.to_string(),
                        amount: amount.into(),
                        budget_id,
                        vendor_id,
                        project_id: None,
                        department_id: None,
                        created_by,
                        category: raw_category.map(Into::into),
                        notes: raw_notes.map(Into::into),
                        receipt: None,
                        created_at: Some(created_at.into()),
                    })
                })
            })
            .collect()
    }
}
