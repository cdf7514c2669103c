//! Librarian renewal of a borrowed copy's due date
//!
//! GET proposes a date, POST validates and stores it. Nothing is kept
//! between the two requests: the form round-trip carries the state.
//! Two librarians renewing the same copy at once both succeed and the last
//! write wins.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    forms::{self, FormData, FormView},
    models::BookInstance,
    repository::CatalogStore,
};

/// What the renewal page shows
#[derive(Debug, Clone)]
pub struct RenewalPage {
    pub instance: BookInstance,
    pub form: FormView,
}

#[derive(Debug)]
pub enum RenewalOutcome {
    Renewed(BookInstance),
    Rejected(RenewalPage),
}

#[derive(Clone)]
pub struct RenewalService {
    store: Arc<dyn CatalogStore>,
}

impl RenewalService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Route token to instance id; anything that is not a UUID cannot exist
    fn parse_id(raw: &str) -> AppResult<Uuid> {
        Uuid::parse_str(raw)
            .map_err(|_| AppError::NotFound(format!("Book instance {} not found", raw)))
    }

    /// State A: the copy with a proposed date of today + 3 weeks
    pub async fn start(&self, raw_id: &str, today: NaiveDate) -> AppResult<RenewalPage> {
        let instance = self.store.get_instance(Self::parse_id(raw_id)?).await?;
        Ok(RenewalPage {
            instance,
            form: forms::renewal::initial(today),
        })
    }

    /// State B: validate the submitted date and store it
    pub async fn submit(
        &self,
        raw_id: &str,
        data: &FormData,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let mut instance = self.store.get_instance(Self::parse_id(raw_id)?).await?;

        match forms::renewal::bind(data, today) {
            Ok(due_back) => {
                self.store.set_due_back(instance.id, due_back).await?;
                tracing::info!("Renewed book instance {} until {}", instance.id, due_back);
                instance.due_back = Some(due_back);
                Ok(RenewalOutcome::Renewed(instance))
            }
            Err(errors) => {
                tracing::debug!("Rejected renewal of {}: {:?}", instance.id, errors);
                Ok(RenewalOutcome::Rejected(RenewalPage {
                    instance,
                    form: forms::renewal::rejected(data, errors),
                }))
            }
        }
    }
}
