pub mod categories;
pub mod clone;
pub mod containers;
pub mod contents;
pub mod factors;
pub mod health;
pub mod spreadsheet;
pub mod topics;

use serde::Deserialize;

/// Body of the `reorder` endpoints: every row of the level, in the new order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i32>,
}
