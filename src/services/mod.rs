//! Business logic services

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod tokens;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub borrowings: borrowings::BorrowingsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let token_service = tokens::TokenService::new(auth_config);
        Self {
            auth: auth::AuthService::new(repository.clone(), token_service),
            books: books::BooksService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(repository),
        }
    }
}
