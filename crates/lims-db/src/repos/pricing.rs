//! Service price list.

use lims_core::entities::Price;
use lims_core::enums::{AuditAction, EntityType, PriceType};
use lims_core::errors::{require_non_blank, require_non_negative};
use lims_core::ids::PREFIX_PRICE;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_datetime, parse_enum, to_db_time};
use crate::service::LimsService;

const SELECT_COLS: &str = "id, name, code, price, price_type, created_at";

fn row_to_price(row: &libsql::Row) -> Result<Price, DatabaseError> {
    Ok(Price {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        price: row.get(3)?,
        price_type: parse_enum(&row.get::<String>(4)?)?,
        created_at: get_datetime(row, 5)?,
    })
}

impl LimsService {
    pub async fn create_price(
        &self,
        name: &str,
        code: &str,
        price: f64,
        price_type: PriceType,
    ) -> Result<Price, DatabaseError> {
        require_non_blank("name", name)?;
        require_non_blank("code", code)?;
        require_non_negative("price", price)?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_PRICE).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO prices ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![id.as_str(), name, code, price, price_type.as_str(), to_db_time(now)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("price code '{code}'")))?;

        self.record(EntityType::Price, &id, AuditAction::Created, None)
            .await?;

        Ok(Price {
            id,
            name: name.to_string(),
            code: code.to_string(),
            price,
            price_type,
            created_at: now,
        })
    }

    pub async fn get_price_by_code(&self, code: &str) -> Result<Price, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM prices WHERE code = ?1"), [code])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("price", code))?;
        row_to_price(&row)
    }

    pub async fn list_prices(&self, price_type: Option<PriceType>) -> Result<Vec<Price>, DatabaseError> {
        let rows = match price_type {
            Some(kind) => {
                self.db()
                    .conn()
                    .query(
                        &format!("SELECT {SELECT_COLS} FROM prices WHERE price_type = ?1 ORDER BY code"),
                        [kind.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(&format!("SELECT {SELECT_COLS} FROM prices ORDER BY code"), ())
                    .await?
            }
        };
        collect_rows(rows, row_to_price).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn create_and_lookup() {
        let svc = test_service().await;
        svc.create_price("Library prep", "LP-01", 120.0, PriceType::Internal)
            .await
            .unwrap();
        svc.create_price("Library prep (ext)", "LP-02", 180.0, PriceType::External)
            .await
            .unwrap();

        let price = svc.get_price_by_code("LP-02").await.unwrap();
        assert_eq!(price.price_type, PriceType::External);
        assert_eq!(svc.list_prices(None).await.unwrap().len(), 2);
        assert_eq!(
            svc.list_prices(Some(PriceType::Internal)).await.unwrap()[0].code,
            "LP-01"
        );
    }

    #[tokio::test]
    async fn duplicate_code_and_negative_price_rejected() {
        let svc = test_service().await;
        svc.create_price("QC", "QC-1", 10.0, PriceType::Internal).await.unwrap();
        assert!(matches!(
            svc.create_price("QC again", "QC-1", 12.0, PriceType::Internal).await,
            Err(DatabaseError::Conflict(_))
        ));
        assert!(matches!(
            svc.create_price("Refund", "RF-1", -1.0, PriceType::Internal).await,
            Err(DatabaseError::Validation(_))
        ));
    }
}
