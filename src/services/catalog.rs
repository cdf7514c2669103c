//! Catalog browsing and record management

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    forms::{self, book::BookChoices, FormData, FormView},
    models::{
        Author, AuthorDetail, Book, BookDetail, BookShort, Genre, LoanedInstance, PageWindow,
        PAGE_SIZE,
    },
    repository::{CatalogCounts, CatalogStore},
};

/// One page of records plus where it sits in the whole list
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

/// Result of a create/update submission
#[derive(Debug)]
pub enum Submission<T> {
    Saved(T),
    Rejected(FormView),
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        self.store.counts().await
    }

    pub async fn list_books(&self, page: Option<&str>) -> AppResult<Listing<BookShort>> {
        let window = PageWindow::resolve(page, self.store.count_books().await?, PAGE_SIZE)?;
        let items = self
            .store
            .list_books(window.offset(), window.limit())
            .await?;
        Ok(Listing { items, window })
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        self.store.get_book_detail(id).await
    }

    pub async fn list_authors(&self, page: Option<&str>) -> AppResult<Listing<Author>> {
        let window = PageWindow::resolve(page, self.store.count_authors().await?, PAGE_SIZE)?;
        let items = self
            .store
            .list_authors(window.offset(), window.limit())
            .await?;
        Ok(Listing { items, window })
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        self.store.get_author_detail(id).await
    }

    /// On-loan copies, ordered by due date; only `borrower_id`'s when given
    pub async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        page: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<Listing<LoanedInstance>> {
        let count = self.store.count_on_loan(borrower_id).await?;
        let window = PageWindow::resolve(page, count, PAGE_SIZE)?;
        let mut items = self
            .store
            .list_on_loan(borrower_id, window.offset(), window.limit())
            .await?;
        for item in &mut items {
            item.flag_overdue(today);
        }
        Ok(Listing { items, window })
    }

    // --- authors ---

    pub fn new_author_form(&self) -> FormView {
        forms::author::initial_create()
    }

    pub async fn edit_author_form(&self, id: i32) -> AppResult<(Author, FormView)> {
        let author = self.store.get_author(id).await?;
        let form = forms::author::initial_update(&author);
        Ok((author, form))
    }

    pub async fn create_author(&self, data: &FormData) -> AppResult<Submission<Author>> {
        let allowed = forms::author::AUTHOR_CREATE_FIELDS;
        match forms::author::bind(data, allowed) {
            Ok(input) => {
                let author = self.store.create_author(&input).await?;
                tracing::info!("Created author {} ({})", author.id, author.display_name());
                Ok(Submission::Saved(author))
            }
            Err(errors) => Ok(Submission::Rejected(FormView::resubmitted(
                data, allowed, errors,
            ))),
        }
    }

    pub async fn update_author(&self, id: i32, data: &FormData) -> AppResult<Submission<Author>> {
        // 404 before validation, as with the GET
        self.store.get_author(id).await?;

        let allowed = forms::author::AUTHOR_UPDATE_FIELDS;
        match forms::author::bind(data, allowed) {
            Ok(input) => {
                let author = self.store.update_author(id, &input).await?;
                tracing::info!("Updated author {}", id);
                Ok(Submission::Saved(author))
            }
            Err(errors) => Ok(Submission::Rejected(FormView::resubmitted(
                data, allowed, errors,
            ))),
        }
    }

    pub async fn author_for_delete(&self, id: i32) -> AppResult<Author> {
        self.store.get_author(id).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.store.delete_author(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    // --- books ---

    async fn book_choices(&self) -> AppResult<(Vec<Author>, Vec<Genre>)> {
        let authors = self.store.all_authors().await?;
        let genres = self.store.list_genres().await?;
        Ok((authors, genres))
    }

    pub async fn new_book_form(&self) -> AppResult<FormView> {
        let (authors, genres) = self.book_choices().await?;
        let choices = BookChoices {
            authors: &authors,
            genres: &genres,
        };
        Ok(forms::book::initial_create(&choices))
    }

    pub async fn edit_book_form(&self, id: i32) -> AppResult<(Book, FormView)> {
        let book = self.store.get_book(id).await?;
        let genre_ids = self.store.book_genre_ids(id).await?;
        let (authors, genres) = self.book_choices().await?;
        let choices = BookChoices {
            authors: &authors,
            genres: &genres,
        };
        let form = forms::book::initial_update(&book, &genre_ids, &choices);
        Ok((book, form))
    }

    pub async fn create_book(&self, data: &FormData) -> AppResult<Submission<Book>> {
        let allowed = forms::book::BOOK_CREATE_FIELDS;
        let (authors, genres) = self.book_choices().await?;
        let choices = BookChoices {
            authors: &authors,
            genres: &genres,
        };

        match forms::book::bind(data, allowed, &choices) {
            Ok(input) => {
                let book = self.store.create_book(&input).await?;
                tracing::info!("Created book {} ({})", book.id, book.title);
                Ok(Submission::Saved(book))
            }
            Err(errors) => Ok(Submission::Rejected(forms::book::rejected(
                data, allowed, errors, &choices,
            ))),
        }
    }

    pub async fn update_book(&self, id: i32, data: &FormData) -> AppResult<Submission<Book>> {
        self.store.get_book(id).await?;

        let allowed = forms::book::BOOK_UPDATE_FIELDS;
        let (authors, genres) = self.book_choices().await?;
        let choices = BookChoices {
            authors: &authors,
            genres: &genres,
        };

        match forms::book::bind(data, allowed, &choices) {
            Ok(input) => {
                let book = self.store.update_book(id, &input).await?;
                tracing::info!("Updated book {}", id);
                Ok(Submission::Saved(book))
            }
            Err(errors) => Ok(Submission::Rejected(forms::book::rejected(
                data, allowed, errors, &choices,
            ))),
        }
    }

    pub async fn book_for_delete(&self, id: i32) -> AppResult<Book> {
        self.store.get_book(id).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.store.delete_book(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}
