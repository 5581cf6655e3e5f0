use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    access,
    auth::extractors::CurrentUser,
    error::{ApiError, ApiResult},
    expenses::{
        dto::{
            CreateExpenseRequest, ExpenseFilter, ExpensePublic, ExpensesResponse, Message,
            UpdateExpenseRequest,
        },
        repo::Expense,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

#[instrument(skip(state, actor))]
async fn list_expenses(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<ExpensesResponse>> {
    let resolved = filter.resolve(OffsetDateTime::now_utc())?;
    let scope = access::list_scope(&actor);

    let (items, count) = Expense::search(&state.db, scope, &resolved).await?;
    Ok(Json(ExpensesResponse {
        data: items.into_iter().map(ExpensePublic::from).collect(),
        count,
    }))
}

#[instrument(skip(state, actor, payload))]
async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<Json<ExpensePublic>> {
    payload.validate()?;

    let expense = Expense::create(
        &state.db,
        actor.id,
        &payload.title,
        payload.description.as_deref(),
        payload.amount,
        payload.category,
    )
    .await?;

    info!(expense_id = %expense.id, owner_id = %actor.id, "expense created");
    Ok(Json(ExpensePublic::from(expense)))
}

#[instrument(skip(state, actor))]
async fn get_expense(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(expense_id): Path<Uuid>,
) -> ApiResult<Json<ExpensePublic>> {
    let expense = Expense::find_by_id(&state.db, expense_id)
        .await?
        .ok_or(ApiError::NotFound("expense"))?;
    access::ensure_owner(&actor, expense.owner_id)?;
    Ok(Json(ExpensePublic::from(expense)))
}

#[instrument(skip(state, actor, payload))]
async fn update_expense(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> ApiResult<Json<ExpensePublic>> {
    payload.validate()?;

    let expense = Expense::find_by_id(&state.db, expense_id)
        .await?
        .ok_or(ApiError::NotFound("expense"))?;
    access::ensure_owner(&actor, expense.owner_id)?;

    // Only provided fields change; the rest keep their stored values.
    let title = payload.title.as_deref().unwrap_or(&expense.title);
    let description = payload
        .description
        .as_deref()
        .or(expense.description.as_deref());
    let amount = payload.amount.unwrap_or(expense.amount);
    let category = payload.category.unwrap_or(expense.category);

    let updated = Expense::update(&state.db, expense.id, title, description, amount, category).await?;

    info!(expense_id = %updated.id, owner_id = %actor.id, "expense updated");
    Ok(Json(ExpensePublic::from(updated)))
}

#[instrument(skip(state, actor))]
async fn delete_expense(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(expense_id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    let expense = Expense::find_by_id(&state.db, expense_id)
        .await?
        .ok_or(ApiError::NotFound("expense"))?;
    access::ensure_owner(&actor, expense.owner_id)?;

    Expense::delete(&state.db, expense.id).await?;
    info!(expense_id = %expense.id, owner_id = %actor.id, "expense deleted");
    Ok(Json(Message {
        message: "expense deleted successfully",
    }))
}
