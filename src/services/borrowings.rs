//! Borrowing lifecycle service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails, CreateBorrowing, UpdateBorrowing},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
}

impl BorrowingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all borrowings with their books
    pub async fn list_all(&self) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.get_all_details().await
    }

    /// List borrowings belonging to one user
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.get_details_by_user(user_id).await
    }

    /// Get a borrowing by ID
    pub async fn get(&self, id: i32) -> AppResult<BorrowingDetails> {
        self.repository
            .borrowings
            .get_details(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Borrow a book for a user, consuming one available copy
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateBorrowing,
    ) -> AppResult<BorrowingDetails> {
        let (borrowing, book_title) = self
            .repository
            .borrowings
            .create(request.book_id, user_id, request.due_date)
            .await?;

        self.enrich(borrowing, book_title).await
    }

    /// Update a borrowing; the borrowed -> returned transition restores one
    /// available copy to the book
    pub async fn update(&self, id: i32, request: UpdateBorrowing) -> AppResult<BorrowingDetails> {
        let (borrowing, book_title) = self.repository.borrowings.update(id, &request).await?;
        self.enrich(borrowing, book_title).await
    }

    /// Delete a borrowing without touching the book's inventory
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        self.repository.borrowings.delete(id).await
    }

    /// Attach the borrower's display name from the identity store
    async fn enrich(&self, borrowing: Borrowing, book_title: String) -> AppResult<BorrowingDetails> {
        let user_name = self
            .repository
            .users
            .get_by_id(borrowing.user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(BorrowingDetails {
            id: borrowing.id,
            book_id: borrowing.book_id,
            book_title,
            user_id: borrowing.user_id,
            user_name,
            borrow_date: borrowing.borrow_date,
            due_date: borrowing.due_date,
            return_date: borrowing.return_date,
            status: borrowing.status,
        })
    }
}
