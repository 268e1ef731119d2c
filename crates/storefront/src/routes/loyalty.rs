//! Loyalty program route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::{LoyaltyTier, TransactionKind};

use crate::backend::types::LoyaltyTransaction;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{Flash, session_keys};
use crate::services::LoyaltyService;
use crate::services::loyalty::LoyaltyStatus;
use crate::site::{CHECK_IN_POINTS, REWARDS, Reward};
use crate::state::AppState;

/// A reward card with whether the balance covers it.
pub struct RewardView {
    pub reward: &'static Reward,
    pub affordable: bool,
}

/// A tier row in the tier ladder.
pub struct TierView {
    pub name: &'static str,
    pub threshold: i64,
    pub perk: &'static str,
    pub reached: bool,
    pub current: bool,
}

/// A ledger row.
pub struct TransactionView {
    pub description: String,
    pub date: String,
    /// Signed display value, e.g. `+10` or `-150`.
    pub points: String,
    pub kind: &'static str,
    pub credit: bool,
}

impl From<&LoyaltyTransaction> for TransactionView {
    fn from(tx: &LoyaltyTransaction) -> Self {
        Self {
            description: tx.description.clone(),
            date: tx
                .created_at
                .map(|at| at.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            points: if tx.points > 0 {
                format!("+{}", tx.points)
            } else {
                tx.points.to_string()
            },
            kind: tx.kind.as_str(),
            credit: tx.kind != TransactionKind::Redeemed && tx.points >= 0,
        }
    }
}

/// Loyalty page template.
#[derive(Template, WebTemplate)]
#[template(path = "loyalty/show.html")]
pub struct LoyaltyTemplate {
    pub ctx: PageContext,
    /// `None` when the account could not be read.
    pub status: Option<LoyaltyStatus>,
    pub visits_this_month: i32,
    pub rewards_earned: i32,
    pub rewards: Vec<RewardView>,
    pub tiers: Vec<TierView>,
    pub transactions: Vec<TransactionView>,
    pub can_check_in: bool,
    pub check_in_points: i64,
}

fn tier_ladder(current: LoyaltyTier) -> Vec<TierView> {
    LoyaltyTier::ALL
        .into_iter()
        .map(|tier| TierView {
            name: tier.name(),
            threshold: tier.threshold(),
            perk: tier.perk(),
            reached: tier <= current,
            current: tier == current,
        })
        .collect()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whether this session already checked in today.
async fn checked_in_today(session: &Session) -> bool {
    session
        .get::<NaiveDate>(session_keys::LAST_CHECK_IN)
        .await
        .ok()
        .flatten()
        .is_some_and(|last| last == today())
}

/// Record today's check-in before the backend write so a second submit in
/// flight sees it. Returns `false` when the session already checked in today.
async fn claim_check_in(session: &Session) -> bool {
    if checked_in_today(session).await {
        return false;
    }
    if let Err(e) = session.insert(session_keys::LAST_CHECK_IN, today()).await {
        tracing::warn!(error = %e, "Failed to record check-in date");
    }
    true
}

/// Undo a claim after the backend write failed.
async fn release_check_in(session: &Session) {
    if let Err(e) = session.remove_value(session_keys::LAST_CHECK_IN).await {
        tracing::warn!(error = %e, "Failed to clear check-in date");
    }
}

/// Display the member's balance, tier, rewards and recent activity.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
) -> impl IntoResponse {
    let service = LoyaltyService::for_user(state.backend(), &user);

    let account = match service.account().await {
        Ok(account) => Some(account),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load loyalty account");
            ctx.flashes
                .push(Flash::error("Error loading rewards", e.user_message()));
            None
        }
    };

    let transactions = if account.is_some() {
        match service.transactions().await {
            Ok(rows) => rows.iter().map(TransactionView::from).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load loyalty transactions");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let status = account.as_ref().map(LoyaltyStatus::of);
    let points = status.as_ref().map_or(0, |s| s.points);

    LoyaltyTemplate {
        tiers: tier_ladder(status.as_ref().map_or_else(LoyaltyTier::default, |s| s.tier)),
        rewards: REWARDS
            .iter()
            .map(|reward| RewardView {
                reward,
                affordable: account.is_some() && points >= reward.cost,
            })
            .collect(),
        visits_this_month: account
            .as_ref()
            .and_then(|a| a.visits_this_month)
            .unwrap_or(0),
        rewards_earned: account.as_ref().and_then(|a| a.rewards_earned).unwrap_or(0),
        status,
        transactions,
        can_check_in: account.is_some() && !checked_in_today(&session).await,
        check_in_points: CHECK_IN_POINTS,
        ctx,
    }
}

/// Redeem form data.
#[derive(Debug, Deserialize)]
pub struct RedeemForm {
    pub reward_id: String,
}

/// Redeem a reward from the catalog.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn redeem(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RedeemForm>,
) -> Redirect {
    let Some(reward) = crate::site::reward(&form.reward_id) else {
        return super::flash_redirect(
            &session,
            Flash::error("Redemption failed", "That reward isn't available"),
            "/loyalty",
        )
        .await;
    };

    match LoyaltyService::for_user(state.backend(), &user)
        .redeem(reward.cost, reward.name)
        .await
    {
        Ok(account) => {
            add_breadcrumb("loyalty", "Redeemed reward", Some(&[("reward", reward.id)]));
            super::flash_redirect(
                &session,
                Flash::success(
                    "Reward redeemed!",
                    format!(
                        "{} is yours. Show this to your barista. {} points left.",
                        reward.name, account.points
                    ),
                ),
                "/loyalty",
            )
            .await
        }
        Err(e) => {
            super::flash_failure(&session, "Redemption failed", &e).await;
            Redirect::to("/loyalty")
        }
    }
}

/// In-store visit check-in, once per session per day.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn check_in(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Redirect {
    if !claim_check_in(&session).await {
        return super::flash_redirect(
            &session,
            Flash::info("Already checked in", "Come back tomorrow for more points"),
            "/loyalty",
        )
        .await;
    }

    match LoyaltyService::for_user(state.backend(), &user)
        .check_in()
        .await
    {
        Ok(account) => {
            add_breadcrumb("loyalty", "Checked in", None);
            super::flash_redirect(
                &session,
                Flash::success(
                    "Thanks for visiting!",
                    format!(
                        "You earned {CHECK_IN_POINTS} points. Balance: {}",
                        account.points
                    ),
                ),
                "/loyalty",
            )
            .await
        }
        Err(e) => {
            release_check_in(&session).await;
            super::flash_failure(&session, "Check-in failed", &e).await;
            Redirect::to("/loyalty")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[test]
    fn test_tier_ladder_marks_progress() {
        let ladder = tier_ladder(LoyaltyTier::Sapling);
        let reached: Vec<&str> = ladder.iter().filter(|t| t.reached).map(|t| t.name).collect();
        assert_eq!(reached, vec!["Seed", "Sprout", "Sapling"]);
        assert_eq!(ladder.iter().filter(|t| t.current).count(), 1);
    }

    #[test]
    fn test_transaction_view_signs_points() {
        let tx: LoyaltyTransaction = serde_json::from_value(serde_json::json!({
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "user_id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "points": 10,
            "type": "bonus",
            "description": "In-store visit check-in",
            "created_at": "2024-05-01T10:00:00+00:00"
        }))
        .unwrap();
        let view = TransactionView::from(&tx);
        assert_eq!(view.points, "+10");
        assert_eq!(view.date, "May 1, 2024");
        assert!(view.credit);
    }

    #[tokio::test]
    async fn test_check_in_is_once_per_day() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(!checked_in_today(&session).await);

        session
            .insert(session_keys::LAST_CHECK_IN, today())
            .await
            .unwrap();
        assert!(checked_in_today(&session).await);

        session
            .insert(
                session_keys::LAST_CHECK_IN,
                today() - chrono::Duration::days(1),
            )
            .await
            .unwrap();
        assert!(!checked_in_today(&session).await);
    }

    #[tokio::test]
    async fn test_check_in_claim_is_released_on_failure() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(claim_check_in(&session).await);
        assert!(!claim_check_in(&session).await);

        release_check_in(&session).await;
        assert!(!checked_in_today(&session).await);
        assert!(claim_check_in(&session).await);
    }
}
