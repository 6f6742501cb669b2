pub mod app;
pub mod gamelog;
