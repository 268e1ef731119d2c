//! Loyalty points, tiers and the points ledger.
//!
//! The balance lives in one `loyalty_points` row per user. Writes are a
//! compare-and-swap through the row filter: the PATCH only matches while
//! `points` still equals the value it was computed from. An empty result means
//! another write landed first, so the row is re-read and the change is
//! recomputed, up to [`MAX_ATTEMPTS`] times. The ledger row is appended only
//! after the balance write succeeds.

use tracing::instrument;

use eco_brews_core::{LoyaltyTier, Price, TransactionKind, UserId};

use crate::backend::types::{
    LoyaltyAccount, LoyaltyBalanceUpdate, LoyaltyTransaction, NewLoyaltyAccount,
    NewLoyaltyTransaction,
};
use crate::backend::{BackendClient, Credential, Order, Table};
use crate::models::CurrentUser;
use crate::site::CHECK_IN_POINTS;

use super::ServiceError;

/// Balance writes attempted before giving up with [`ServiceError::Conflict`].
pub const MAX_ATTEMPTS: usize = 3;

/// Ledger rows shown on the loyalty page.
const RECENT_TRANSACTIONS: usize = 10;

/// Loyalty operations for one member.
pub struct LoyaltyService<'a> {
    client: &'a BackendClient,
    user_id: UserId,
    credential: Credential,
}

impl<'a> LoyaltyService<'a> {
    /// Act as the signed-in member, under their row policies.
    #[must_use]
    pub fn for_user(client: &'a BackendClient, user: &CurrentUser) -> Self {
        Self {
            client,
            user_id: user.id,
            credential: Credential::User(user.access_token.clone()),
        }
    }

    /// Act on any member's account with the service-role key.
    #[must_use]
    pub const fn for_service(client: &'a BackendClient, user_id: UserId) -> Self {
        Self {
            client,
            user_id,
            credential: Credential::Service,
        }
    }

    /// The member's account, created at `Seed` with zero points if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn account(&self) -> Result<LoyaltyAccount, ServiceError> {
        if let Some(account) = self.read_account().await? {
            return Ok(account);
        }

        let created = self
            .client
            .from(Table::LoyaltyPoints)
            .with_credential(&self.credential)
            .insert(&NewLoyaltyAccount {
                user_id: self.user_id,
                points: 0,
                tier: LoyaltyTier::Seed.name().to_string(),
                total_spent: Price::default(),
                visits_this_month: 0,
                rewards_earned: 0,
            })
            .await;

        match created {
            Ok(account) => {
                tracing::info!(user_id = %self.user_id, "Created loyalty account");
                Ok(account)
            }
            // Created concurrently by another request.
            Err(e) if e.is_unique_violation() => self
                .read_account()
                .await?
                .ok_or(ServiceError::NotFound("Loyalty account")),
            Err(e) => Err(e.into()),
        }
    }

    /// The most recent ledger rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn transactions(&self) -> Result<Vec<LoyaltyTransaction>, ServiceError> {
        Ok(self
            .client
            .from(Table::LoyaltyTransactions)
            .select("*")
            .eq("user_id", self.user_id)
            .order("created_at", Order::Desc)
            .limit(RECENT_TRANSACTIONS)
            .with_credential(&self.credential)
            .fetch()
            .await?)
    }

    /// Raise the balance and record an `earned` entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive amount, `Conflict` when the
    /// balance kept changing, or a backend error.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn add_points(&self, points: i64, description: &str) -> Result<LoyaltyAccount, ServiceError> {
        require_positive(points)?;
        let account = self.apply(|account| Ok(earn(account, points))).await?;
        self.record(points, TransactionKind::Earned, description).await?;
        Ok(account)
    }

    /// Spend points on a reward and record a `redeemed` entry.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientPoints` when the balance is below `points`,
    /// `Conflict` when the balance kept changing, or a backend error.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn redeem(&self, points: i64, description: &str) -> Result<LoyaltyAccount, ServiceError> {
        require_positive(points)?;
        let account = self.apply(|account| spend(account, points)).await?;
        self.record(-points, TransactionKind::Redeemed, description).await?;
        Ok(account)
    }

    /// Award the in-store visit bonus and count the visit.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the balance kept changing, or a backend error.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn check_in(&self) -> Result<LoyaltyAccount, ServiceError> {
        let account = self
            .apply(|account| Ok(visit(account, CHECK_IN_POINTS)))
            .await?;
        self.record(CHECK_IN_POINTS, TransactionKind::Bonus, "In-store visit check-in")
            .await?;
        Ok(account)
    }

    async fn read_account(&self) -> Result<Option<LoyaltyAccount>, ServiceError> {
        Ok(self
            .client
            .from(Table::LoyaltyPoints)
            .eq("user_id", self.user_id)
            .with_credential(&self.credential)
            .fetch_optional()
            .await?)
    }

    /// Compute a balance update from the current row and write it only if the
    /// balance is unchanged since the read.
    async fn apply<F>(&self, change: F) -> Result<LoyaltyAccount, ServiceError>
    where
        F: Fn(&LoyaltyAccount) -> Result<LoyaltyBalanceUpdate, ServiceError>,
    {
        let mut account = self.account().await?;

        for attempt in 1..=MAX_ATTEMPTS {
            let update = change(&account)?;
            let written: Vec<LoyaltyAccount> = self
                .client
                .from(Table::LoyaltyPoints)
                .eq("id", account.id)
                .eq("user_id", self.user_id)
                .eq("points", account.points)
                .with_credential(&self.credential)
                .update(&update)
                .await?;

            if let Some(updated) = written.into_iter().next() {
                return Ok(updated);
            }

            tracing::warn!(
                user_id = %self.user_id,
                attempt,
                expected_points = account.points,
                "Loyalty balance changed during update, retrying"
            );
            account = self.account().await?;
        }

        Err(ServiceError::Conflict)
    }

    async fn record(&self, points: i64, kind: TransactionKind, description: &str) -> Result<(), ServiceError> {
        let _: LoyaltyTransaction = self
            .client
            .from(Table::LoyaltyTransactions)
            .with_credential(&self.credential)
            .insert(&NewLoyaltyTransaction {
                user_id: self.user_id,
                points,
                kind,
                description: description.to_string(),
            })
            .await?;
        Ok(())
    }
}

fn require_positive(points: i64) -> Result<(), ServiceError> {
    if points <= 0 {
        return Err(ServiceError::Validation(
            "Points must be a positive number".to_string(),
        ));
    }
    Ok(())
}

fn balance_update(points: i64) -> LoyaltyBalanceUpdate {
    LoyaltyBalanceUpdate {
        points,
        tier: LoyaltyTier::for_points(points).name().to_string(),
        rewards_earned: None,
        visits_this_month: None,
        total_spent: None,
    }
}

fn earn(account: &LoyaltyAccount, points: i64) -> LoyaltyBalanceUpdate {
    balance_update(account.points.saturating_add(points))
}

fn spend(account: &LoyaltyAccount, cost: i64) -> Result<LoyaltyBalanceUpdate, ServiceError> {
    if account.points < cost {
        return Err(ServiceError::InsufficientPoints {
            balance: account.points,
            needed: cost,
        });
    }
    Ok(LoyaltyBalanceUpdate {
        rewards_earned: Some(account.rewards_earned.unwrap_or(0).saturating_add(1)),
        ..balance_update(account.points - cost)
    })
}

fn visit(account: &LoyaltyAccount, points: i64) -> LoyaltyBalanceUpdate {
    LoyaltyBalanceUpdate {
        visits_this_month: Some(account.visits_this_month.unwrap_or(0).saturating_add(1)),
        ..earn(account, points)
    }
}

/// Tier progress for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyStatus {
    pub points: i64,
    pub tier: LoyaltyTier,
    pub next_tier: Option<LoyaltyTier>,
    pub points_to_next: Option<i64>,
    pub progress_percent: u8,
}

impl LoyaltyStatus {
    /// Status derived from the balance. The stored `tier` column is ignored
    /// since it may lag a balance written by an older client.
    #[must_use]
    pub fn of(account: &LoyaltyAccount) -> Self {
        let tier = LoyaltyTier::for_points(account.points);
        Self {
            points: account.points,
            tier,
            next_tier: tier.next(),
            points_to_next: LoyaltyTier::points_to_next(account.points),
            progress_percent: LoyaltyTier::progress_percent(account.points),
        }
    }
}
