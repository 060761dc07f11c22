//! Route handlers, one module per resource
//!
//! - `health`: liveness and database connectivity
//! - `auth`: registration, login, logout, token refresh, role list
//! - `password`: `POST /api/update-password`
//! - `users`: own and public profiles
//! - `locations`: saved addresses
//! - `listings`: material catalog and listings
//! - `ratings`: listing ratings
//! - `conversations`: JSON messaging API
//! - `notifications`, `history`: per-user feeds
//! - `pages`: page view models and form posts

pub mod auth;
pub mod conversations;
pub mod health;
pub mod history;
pub mod listings;
pub mod locations;
pub mod notifications;
pub mod pages;
pub mod password;
pub mod ratings;
pub mod users;

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?limit=&offset=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)` with the limit in `1..=100` and a non-negative offset
    pub fn clamp(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(Pagination::default().clamp(), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_pagination_bounds() {
        let page = Pagination {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(page.clamp(), (MAX_PAGE_SIZE, 0));

        let page = Pagination {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(page.clamp(), (1, 40));
    }
}
