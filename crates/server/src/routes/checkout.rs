//! Checkout route handler.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use replay_core::UserId;

use crate::db::games::GameRepository;
use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Address, Order, PaymentCard};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Checkout request body: where to ship and how to pay.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: Address,
    pub payment: PaymentCard,
}

/// `POST /api/users/{id}/checkout` (owner or admin)
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    current.ensure_owner_or_admin(id)?;

    let svc = CheckoutService::new(
        UserRepository::new(state.pool()),
        GameRepository::new(state.pool()),
        OrderRepository::new(state.pool()),
    );
    let order = svc.checkout(id, body.shipping, &body.payment).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
