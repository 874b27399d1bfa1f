pub mod charts;
pub mod handlers;
pub mod page;
pub mod router;
pub mod state;
