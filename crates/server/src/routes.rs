//! HTTP routes for the loyalty handlers

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use loyalty_core::{
    ClaimReceipt, Currency, DailyRewardState, LedgerEntry, PlayerId, Raffle, RaffleEntryReceipt,
    RaffleView, ReferralStats, RegistrationOutcome, SpinOutcome,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let player_routes = Router::new()
        .route("/api/players", post(create_player))
        .route("/api/rewards/state", get(reward_state))
        .route("/api/rewards/claim", post(claim_reward))
        .route("/api/referrals/register", post(register_referral))
        .route("/api/referrals/stats", get(referral_stats))
        .route("/api/wheel/spin", post(spin_wheel))
        .route("/api/raffle/current", get(current_raffle))
        .route("/api/raffle/enter", post(enter_raffle))
        .route("/api/user/transactions", get(transactions));

    // Invoked by other reward flows and operators, not by players
    let internal_routes = Router::new()
        .route("/api/referrals/commission", post(distribute_commission))
        .route("/api/admin/raffle", post(open_raffle))
        .route("/api/admin/raffle/end", post(end_raffle));

    Router::new()
        .route("/api/status", get(status))
        .merge(player_routes)
        .merge(internal_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request / response bodies ─────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuery {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBody {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[serde(default)]
    pub player_id: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBody {
    pub referee_id: String,
    pub amount_earned: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionResponse {
    pub commission: i64,
    pub referrer_id: Option<PlayerId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub message: String,
    pub reward_amount: i64,
    pub currency: Currency,
    pub streak: u32,
    pub balance: i64,
}

impl From<ClaimReceipt> for ClaimResponse {
    fn from(receipt: ClaimReceipt) -> Self {
        Self {
            message: receipt.message(),
            reward_amount: receipt.reward_amount,
            currency: receipt.currency,
            streak: receipt.streak,
            balance: receipt.balance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterRaffleBody {
    #[serde(default)]
    pub player_id: String,
    pub raffle_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRaffleBody {
    pub raffle_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub player_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRaffleResponse {
    pub raffle: Option<RaffleView>,
}

// ─── Route Handlers ────────────────────────────────────────────────

/// GET /api/status: server health check
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "app": "Loyalty Portal",
        "version": env!("CARGO_PKG_VERSION"),
        "startedAt": state.started_at.to_rfc3339(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /api/players: create the account the other handlers expect to exist
pub async fn create_player(
    State(state): State<AppState>,
    Json(body): Json<PlayerBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let player = PlayerId::parse(&body.player_id)?;
    let created = loyalty_persistence::create_player(state.db.pool(), &player).await?;
    let status = if created {
        info!(player = %player, "player account created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(serde_json::json!({ "playerId": player, "created": created })),
    ))
}

/// GET /api/rewards/state?playerId=
///
/// A malformed id is 400. A well-formed id with no account is 404.
pub async fn reward_state(
    State(state): State<AppState>,
    Query(query): Query<PlayerQuery>,
) -> ApiResult<DailyRewardState> {
    Ok(Json(
        state
            .service
            .get_daily_reward_state(&query.player_id)
            .await?,
    ))
}

/// POST /api/rewards/claim
pub async fn claim_reward(
    State(state): State<AppState>,
    Json(body): Json<PlayerBody>,
) -> ApiResult<ClaimResponse> {
    let receipt = state.service.claim_daily_reward(&body.player_id).await?;
    Ok(Json(receipt.into()))
}

/// POST /api/referrals/register
pub async fn register_referral(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<RegistrationOutcome> {
    Ok(Json(
        state
            .service
            .post_registration_setup(&body.player_id, body.referral_code.as_deref())
            .await?,
    ))
}

/// GET /api/referrals/stats?playerId=
pub async fn referral_stats(
    State(state): State<AppState>,
    Query(query): Query<PlayerQuery>,
) -> ApiResult<ReferralStats> {
    Ok(Json(
        state.service.get_referral_stats(&query.player_id).await?,
    ))
}

/// POST /api/referrals/commission: best-effort, always 200
pub async fn distribute_commission(
    State(state): State<AppState>,
    Json(body): Json<CommissionBody>,
) -> Json<CommissionResponse> {
    let grant = state
        .service
        .distribute_referral_commission(&body.referee_id, body.amount_earned)
        .await;
    Json(CommissionResponse {
        commission: grant.as_ref().map_or(0, |g| g.commission),
        referrer_id: grant.map(|g| g.referrer_id),
    })
}

/// POST /api/wheel/spin
pub async fn spin_wheel(
    State(state): State<AppState>,
    Json(body): Json<PlayerBody>,
) -> ApiResult<SpinOutcome> {
    Ok(Json(state.service.wheel().spin(&body.player_id).await?))
}

/// GET /api/raffle/current
pub async fn current_raffle(State(state): State<AppState>) -> ApiResult<CurrentRaffleResponse> {
    let raffle = state.service.raffles().current().await?;
    Ok(Json(CurrentRaffleResponse { raffle }))
}

/// POST /api/raffle/enter
pub async fn enter_raffle(
    State(state): State<AppState>,
    Json(body): Json<EnterRaffleBody>,
) -> ApiResult<RaffleEntryReceipt> {
    Ok(Json(
        state
            .service
            .raffles()
            .enter(&body.player_id, &body.raffle_id)
            .await?,
    ))
}

/// POST /api/admin/raffle: open a new current raffle
pub async fn open_raffle(
    State(state): State<AppState>,
    Json(raffle): Json<Raffle>,
) -> Result<(StatusCode, Json<RaffleView>), ApiError> {
    let view = state.service.raffles().open(raffle).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/admin/raffle/end
pub async fn end_raffle(
    State(state): State<AppState>,
    Json(body): Json<EndRaffleBody>,
) -> ApiResult<RaffleView> {
    Ok(Json(state.service.raffles().end(&body.raffle_id).await?))
}

/// GET /api/user/transactions?playerId=&limit=
pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<LedgerEntry>> {
    Ok(Json(
        state
            .service
            .history()
            .transactions(&query.player_id, query.limit)
            .await?,
    ))
}
