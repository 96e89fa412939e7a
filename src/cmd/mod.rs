pub mod evaluate;
pub mod search;
pub mod state;
