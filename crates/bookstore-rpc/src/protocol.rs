//! Request and response messages for every RPC method.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bookstore_core::model::{Author, Book, BookFilter, User};

/// Registry name of the catalog service (authors and books).
pub const BOOKS_SERVICE: &str = "books";

/// Registry name of the authentication service.
pub const AUTH_SERVICE: &str = "auth";

/// An RPC request message bound to the service that answers it.
pub trait RpcMethod: Serialize + DeserializeOwned + Send + Sync {
    /// Registry name of the service hosting the method.
    const SERVICE: &'static str;

    /// `<Service>/<Method>`, e.g. `BookService/GetBooks`.
    const METHOD: &'static str;

    /// Response message.
    type Response: Serialize + DeserializeOwned + Send;

    /// HTTP path the method is served on.
    #[must_use]
    fn path() -> String {
        format!("/rpc/{}", Self::METHOD)
    }
}

/// Lists every author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAuthors {}

impl RpcMethod for GetAuthors {
    const SERVICE: &'static str = BOOKS_SERVICE;
    const METHOD: &'static str = "AuthorService/GetAuthors";
    type Response = Vec<Author>;
}

/// Fetches one author by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAuthor {
    /// Author id.
    pub id: String,
}

impl RpcMethod for GetAuthor {
    const SERVICE: &'static str = BOOKS_SERVICE;
    const METHOD: &'static str = "AuthorService/GetAuthor";
    type Response = Author;
}

/// Lists books matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBooks {
    /// Query; blank fields are ignored.
    #[serde(flatten)]
    pub filter: BookFilter,
}

impl RpcMethod for GetBooks {
    const SERVICE: &'static str = BOOKS_SERVICE;
    const METHOD: &'static str = "BookService/GetBooks";
    type Response = Vec<Book>;
}

/// Fetches one book by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBook {
    /// Book id.
    pub id: String,
}

impl RpcMethod for GetBook {
    const SERVICE: &'static str = BOOKS_SERVICE;
    const METHOD: &'static str = "BookService/GetBook";
    type Response = Book;
}

/// Checks credentials and returns the user they belong to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl std::fmt::Debug for LoginUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RpcMethod for LoginUser {
    const SERVICE: &'static str = AUTH_SERVICE;
    const METHOD: &'static str = "UserService/LoginUser";
    type Response = User;
}

/// Fetches one user by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUser {
    /// User id.
    pub id: String,
}

impl RpcMethod for GetUser {
    const SERVICE: &'static str = AUTH_SERVICE;
    const METHOD: &'static str = "UserService/GetUser";
    type Response = User;
}

/// Asks whether a username is still free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateUsernameUnique {
    /// Candidate login name.
    pub username: String,
}

/// Answer to [`ValidateUsernameUnique`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameAvailability {
    /// `true` if no user holds the name.
    pub unique: bool,
}

impl RpcMethod for ValidateUsernameUnique {
    const SERVICE: &'static str = AUTH_SERVICE;
    const METHOD: &'static str = "UserService/ValidateUsernameUnique";
    type Response = UsernameAvailability;
}
