//! Borrowings repository for database operations.
//!
//! The inventory side effects (decrement on borrow, increment on return) run
//! inside a transaction with the book row locked, so concurrent requests for
//! the same book cannot drive `available_copies` negative or over-credit it.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrowing::{Borrowing, BorrowingDetails, BorrowingStatus, UpdateBorrowing},
    },
};

const SELECT_DETAILS: &str = r#"
    SELECT bw.id, bw.book_id, b.title AS book_title, bw.user_id,
           u.username AS user_name, bw.borrow_date, bw.due_date,
           bw.return_date, bw.status
    FROM borrowings bw
    JOIN books b ON bw.book_id = b.id
    JOIN users u ON bw.user_id = u.id
"#;

fn details_from_row(row: sqlx::postgres::PgRow) -> Result<BorrowingDetails, sqlx::Error> {
    Ok(BorrowingDetails {
        id: row.try_get("id")?,
        book_id: row.try_get("book_id")?,
        book_title: row.try_get("book_title")?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        borrow_date: row.try_get("borrow_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        status: row.try_get("status")?,
    })
}

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all borrowings with their book eagerly loaded
    pub async fn get_all_details(&self) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(&format!("{} ORDER BY bw.id", SELECT_DETAILS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| details_from_row(row).map_err(AppError::from))
            .collect()
    }

    /// List borrowings belonging to one user
    pub async fn get_details_by_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(&format!("{} WHERE bw.user_id = $1 ORDER BY bw.id", SELECT_DETAILS))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| details_from_row(row).map_err(AppError::from))
            .collect()
    }

    /// Get one borrowing with its book eagerly loaded
    pub async fn get_details(&self, id: i32) -> AppResult<Option<BorrowingDetails>> {
        let row = sqlx::query(&format!("{} WHERE bw.id = $1", SELECT_DETAILS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| details_from_row(r).map_err(AppError::from))
            .transpose()
    }

    /// Create a borrowing and decrement the book's inventory, atomically.
    ///
    /// Returns the created record together with the book title.
    pub async fn create(
        &self,
        book_id: i32,
        user_id: Uuid,
        due_date: chrono::DateTime<Utc>,
    ) -> AppResult<(Borrowing, String)> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row: the check-then-decrement must be serialized
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if book.available_copies <= 0 {
            return Err(AppError::Conflict(
                "No available copies of this book".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (book_id, user_id, borrow_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, book_id, user_id, borrow_date, due_date, return_date, status
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(due_date)
        .bind(BorrowingStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((borrowing, book.title))
    }

    /// Update a borrowing's return date and status.
    ///
    /// Exactly the borrowed -> returned transition credits one copy back to the
    /// book; any other transition touches the record's fields only.
    pub async fn update(&self, id: i32, update: &UpdateBorrowing) -> AppResult<(Borrowing, String)> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        let was_returned = existing.status == BorrowingStatus::Borrowed
            && update.status == BorrowingStatus::Returned;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET return_date = COALESCE($1, return_date), status = $2
            WHERE id = $3
            RETURNING id, book_id, user_id, borrow_date, due_date, return_date, status
            "#,
        )
        .bind(update.return_date)
        .bind(update.status)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if was_returned {
            sqlx::query(
                "UPDATE books SET available_copies = available_copies + 1, updated_at = $1 WHERE id = $2",
            )
            .bind(Utc::now())
            .bind(existing.book_id)
            .execute(&mut *tx)
            .await?;
        }

        let book_title: String = sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
            .bind(existing.book_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((borrowing, book_title))
    }

    /// Delete a borrowing.
    ///
    /// No inventory compensation: deleting a borrowed record does not restore
    /// the copy, only a proper returned transition does.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM borrowings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
