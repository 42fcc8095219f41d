// Presentation layer - HTTP routes, handlers and the page template
pub mod app_state;
pub mod handlers;
pub mod page;
pub mod router;
