//! Database seeding: roles, default librarian account, sample books.
//!
//! Every step is idempotent; failures are logged by the caller and must not
//! prevent the server from starting.

use crate::{
    error::AppResult,
    models::book::CreateBook,
    models::user::{ROLE_LIBRARIAN, ROLE_MEMBER},
    repository::Repository,
    services::auth::AuthService,
};

const LIBRARIAN_EMAIL: &str = "librarian@library.com";
const LIBRARIAN_PASSWORD: &str = "Librarian123!";

pub async fn run(repository: &Repository, auth: &AuthService) -> AppResult<()> {
    repository.users.ensure_role(ROLE_LIBRARIAN).await?;
    repository.users.ensure_role(ROLE_MEMBER).await?;

    if repository.users.get_by_email(LIBRARIAN_EMAIL).await?.is_none() {
        let password_hash = auth.hash_password(LIBRARIAN_PASSWORD)?;
        let librarian = repository
            .users
            .create(LIBRARIAN_EMAIL, LIBRARIAN_EMAIL, &password_hash)
            .await?;
        repository
            .users
            .add_to_role(librarian.id, ROLE_LIBRARIAN)
            .await?;
        tracing::info!("Seeded default librarian account");
    }

    if repository.books.count().await? == 0 {
        for book in sample_books() {
            repository.books.create(&book).await?;
        }
        tracing::info!("Seeded sample books");
    }

    Ok(())
}

fn sample_books() -> Vec<CreateBook> {
    vec![
        CreateBook {
            title: "The Great Gatsby".to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            isbn: "978-0743273565".to_string(),
            published_year: 1925,
            available_copies: 5,
        },
        CreateBook {
            title: "To Kill a Mockingbird".to_string(),
            author: "Harper Lee".to_string(),
            isbn: "978-0061120084".to_string(),
            published_year: 1960,
            available_copies: 3,
        },
        CreateBook {
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            isbn: "978-0451524935".to_string(),
            published_year: 1949,
            available_copies: 4,
        },
        CreateBook {
            title: "Pride and Prejudice".to_string(),
            author: "Jane Austen".to_string(),
            isbn: "978-0141439518".to_string(),
            published_year: 1813,
            available_copies: 6,
        },
        CreateBook {
            title: "The Catcher in the Rye".to_string(),
            author: "J.D. Salinger".to_string(),
            isbn: "978-0316769174".to_string(),
            published_year: 1951,
            available_copies: 2,
        },
    ]
}
