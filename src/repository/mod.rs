//! Repository layer for database operations
//!
//! Services never see the connection pool: they talk to the catalog through
//! [`CatalogStore`] and to accounts through [`UserStore`]. [`Repository`] is
//! the PostgreSQL implementation of both.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod users;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Author, AuthorDetail, AuthorInput, Book, BookDetail, BookInput, BookInstance, BookShort,
        Genre, LoanStatus, LoanedInstance, User,
    },
};

/// Record counts shown on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogCounts {
    pub books: i64,
    pub instances: i64,
    pub instances_available: i64,
    pub authors: i64,
}

/// Catalog records: genres, authors, books and their copies.
///
/// Lookups by primary key fail with `AppError::NotFound` when the record is
/// absent; list methods take an offset/limit over a total ordering.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    async fn ping(&self) -> AppResult<()>;

    async fn counts(&self) -> AppResult<CatalogCounts>;

    async fn count_books(&self) -> AppResult<i64>;
    async fn list_books(&self, offset: i64, limit: i64) -> AppResult<Vec<BookShort>>;
    async fn get_book(&self, id: i32) -> AppResult<Book>;
    async fn get_book_detail(&self, id: i32) -> AppResult<BookDetail>;
    async fn create_book(&self, input: &BookInput) -> AppResult<Book>;
    async fn update_book(&self, id: i32, input: &BookInput) -> AppResult<Book>;
    async fn delete_book(&self, id: i32) -> AppResult<()>;

    async fn count_authors(&self) -> AppResult<i64>;
    async fn list_authors(&self, offset: i64, limit: i64) -> AppResult<Vec<Author>>;
    async fn all_authors(&self) -> AppResult<Vec<Author>>;
    async fn get_author(&self, id: i32) -> AppResult<Author>;
    async fn get_author_detail(&self, id: i32) -> AppResult<AuthorDetail>;
    async fn create_author(&self, input: &AuthorInput) -> AppResult<Author>;
    async fn update_author(&self, id: i32, input: &AuthorInput) -> AppResult<Author>;
    async fn delete_author(&self, id: i32) -> AppResult<()>;

    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    async fn book_genre_ids(&self, book_id: i32) -> AppResult<Vec<i32>>;

    /// On-loan copies, all of them or only those of `borrower_id`
    async fn count_on_loan(&self, borrower_id: Option<i32>) -> AppResult<i64>;
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<LoanedInstance>>;

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance>;
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
}

/// Accounts used for login
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
    pub genres: genres::GenresRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CatalogStore for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            books: self.books.count().await?,
            instances: self.book_instances.count().await?,
            instances_available: self
                .book_instances
                .count_with_status(LoanStatus::Available)
                .await?,
            authors: self.authors.count().await?,
        })
    }

    async fn count_books(&self) -> AppResult<i64> {
        self.books.count().await
    }

    async fn list_books(&self, offset: i64, limit: i64) -> AppResult<Vec<BookShort>> {
        self.books.list(offset, limit).await
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn get_book_detail(&self, id: i32) -> AppResult<BookDetail> {
        self.books.get_detail(id).await
    }

    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        self.books.create(input).await
    }

    async fn update_book(&self, id: i32, input: &BookInput) -> AppResult<Book> {
        self.books.update(id, input).await
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.books.delete(id).await
    }

    async fn count_authors(&self) -> AppResult<i64> {
        self.authors.count().await
    }

    async fn list_authors(&self, offset: i64, limit: i64) -> AppResult<Vec<Author>> {
        self.authors.list(offset, limit).await
    }

    async fn all_authors(&self) -> AppResult<Vec<Author>> {
        self.authors.list_all().await
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.authors.get_by_id(id).await
    }

    async fn get_author_detail(&self, id: i32) -> AppResult<AuthorDetail> {
        self.authors.get_detail(id).await
    }

    async fn create_author(&self, input: &AuthorInput) -> AppResult<Author> {
        self.authors.create(input).await
    }

    async fn update_author(&self, id: i32, input: &AuthorInput) -> AppResult<Author> {
        self.authors.update(id, input).await
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.authors.delete(id).await
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.genres.list().await
    }

    async fn book_genre_ids(&self, book_id: i32) -> AppResult<Vec<i32>> {
        self.genres.ids_for_book(book_id).await
    }

    async fn count_on_loan(&self, borrower_id: Option<i32>) -> AppResult<i64> {
        self.book_instances.count_on_loan(borrower_id).await
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<LoanedInstance>> {
        self.book_instances
            .list_on_loan(borrower_id, offset, limit)
            .await
    }

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.book_instances.get_by_id(id).await
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        self.book_instances.set_due_back(id, due_back).await
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.get_by_username(username).await
    }
}
