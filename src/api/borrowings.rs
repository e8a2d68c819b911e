//! Borrowing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{BorrowingDetails, CreateBorrowing, UpdateBorrowing},
        user::AccessClaims,
    },
};

use super::AuthenticatedUser;

/// Members may only touch their own borrowings; librarians may touch any
fn check_ownership(claims: &AccessClaims, details: &BorrowingDetails) -> AppResult<()> {
    if !claims.is_librarian() && details.user_id != claims.user_id()? {
        return Err(AppError::Authorization(
            "You may only access your own borrowings".to_string(),
        ));
    }
    Ok(())
}

/// List borrowings: all of them for librarians, the caller's own otherwise
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of borrowings", body = Vec<BorrowingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    let borrowings = if claims.is_librarian() {
        state.services.borrowings.list_all().await?
    } else {
        state
            .services
            .borrowings
            .list_for_user(claims.user_id()?)
            .await?
    };
    Ok(Json(borrowings))
}

/// Get borrowing details by ID
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing details", body = BorrowingDetails),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let details = state.services.borrowings.get(id).await?;
    check_ownership(&claims, &details)?;
    Ok(Json(details))
}

/// Borrow a book for the authenticated user
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Borrowing created", body = BorrowingDetails),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No available copies")
    )
)]
pub async fn create_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowing>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    let created = state
        .services
        .borrowings
        .create(claims.user_id()?, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a borrowing's status and return date
#[utoipa::path(
    put,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    request_body = UpdateBorrowing,
    responses(
        (status = 200, description = "Borrowing updated", body = BorrowingDetails),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn update_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBorrowing>,
) -> AppResult<Json<BorrowingDetails>> {
    let existing = state.services.borrowings.get(id).await?;
    check_ownership(&claims, &existing)?;

    let updated = state.services.borrowings.update(id, request).await?;
    Ok(Json(updated))
}

/// Delete a borrowing
#[utoipa::path(
    delete,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 204, description = "Borrowing deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn delete_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let existing = state.services.borrowings.get(id).await?;
    check_ownership(&claims, &existing)?;

    if state.services.borrowings.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "Borrowing with id {} not found",
            id
        )))
    }
}
