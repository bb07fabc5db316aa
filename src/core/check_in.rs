//! Clinic check-in with single-use codes.
//!
//! A code is issued for a child and handed to the parent. When a healthcare
//! worker redeems it the code is spent and the child's next scheduled dose is
//! completed. Redeeming an unknown code fails with `NotFoundError`, a spent
//! one with `ValidationError`.

use crate::core::lifecycle::{authorize, LifecycleEngine};
use crate::domain::model::{ActingUser, ClinicCode, VaccinationRecord};
use crate::domain::ports::{Clock, CodeStore, Notifier, RecordStore};
use crate::utils::error::{ChronicleError, Result};
use crate::utils::validation;

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRedemption {
    pub code: ClinicCode,
    /// `None` when the child had no scheduled dose left.
    pub completed: Option<VaccinationRecord>,
}

pub struct CheckInDesk<K: CodeStore, S: RecordStore, N: Notifier, C: Clock> {
    codes: K,
    engine: LifecycleEngine<S, N, C>,
}

impl<K: CodeStore, S: RecordStore, N: Notifier, C: Clock> CheckInDesk<K, S, N, C> {
    pub fn new(codes: K, engine: LifecycleEngine<S, N, C>) -> Self {
        Self { codes, engine }
    }

    pub fn engine(&self) -> &LifecycleEngine<S, N, C> {
        &self.engine
    }

    pub fn codes(&self) -> &K {
        &self.codes
    }

    /// Issues a fresh code for a registered child.
    pub async fn issue_code(&self, child_id: &str) -> Result<ClinicCode> {
        validation::validate_non_empty_string("child_id", child_id)?;
        if self.engine.store().get_records_by_child(child_id).await?.is_empty() {
            return Err(ChronicleError::NotFoundError {
                entity: "child",
                id: child_id.to_string(),
            });
        }

        let code = self
            .codes
            .insert_code(child_id, self.engine.clock().now())
            .await?;
        tracing::info!(child_id, code_id = %code.id, "Issued clinic code");
        Ok(code)
    }

    /// Spends the code and completes the child's next scheduled dose.
    pub async fn redeem_code(&self, code_id: &str, actor: &ActingUser) -> Result<CodeRedemption> {
        authorize(actor, "redeem clinic codes")?;

        let code = self
            .codes
            .redeem_code(code_id, &actor.id, self.engine.clock().now())
            .await?;
        tracing::info!(
            code_id,
            child_id = %code.child_id,
            actor = %actor.id,
            "Clinic code redeemed"
        );

        let completed = self
            .engine
            .complete_next_scheduled(&code.child_id, actor)
            .await?;
        Ok(CodeRedemption { code, completed })
    }
}
