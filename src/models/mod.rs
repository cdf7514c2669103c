//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorInput};
pub use book::{Book, BookDetail, BookInput, BookShort};
pub use book_instance::{BookInstance, LoanStatus, LoanedInstance};
pub use genre::Genre;
pub use pagination::{PageQuery, PageWindow, PAGE_SIZE};
pub use user::{User, UserClaims, CAN_MARK_RETURNED};
