//! Request resource — photo submissions and their CRUD endpoints.

pub mod model;
pub mod routes;

pub use model::{NewRequest, Request, RequestChanges};
pub use routes::request_routes;
