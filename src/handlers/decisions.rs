use actix_web::{HttpResponse, Result, web};

use crate::config::Config;
use crate::database::repositories::DecisionFilter;
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, PageQuery};
use crate::services::auth::Claims;
use crate::services::ledger::DecisionLedger;

async fn decision_page(
    ledger: web::Data<DecisionLedger>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
    filter: DecisionFilter,
) -> Result<HttpResponse> {
    let page = query.resolve(config.max_page_size);
    let decisions = ledger.page(filter, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(decisions)))
}

/// Decisions the caller made
pub async fn get_my_decisions(
    claims: Claims,
    ledger: web::Data<DecisionLedger>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    decision_page(ledger, config, query, DecisionFilter::Actor(claims.employee_id())).await
}

/// Decisions taken on the caller's own requests
pub async fn get_requested_decisions(
    claims: Claims,
    ledger: web::Data<DecisionLedger>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    decision_page(
        ledger,
        config,
        query,
        DecisionFilter::Requester(claims.employee_id()),
    )
    .await
}

pub async fn get_all_decisions(
    claims: Claims,
    ledger: web::Data<DecisionLedger>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    if !claims.is_final_authority() {
        return Err(AppError::Forbidden(
            "Only the final authority may read the organisation-wide ledger".to_string(),
        )
        .into());
    }

    decision_page(ledger, config, query, DecisionFilter::All).await
}
