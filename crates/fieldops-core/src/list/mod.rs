pub mod controller;

pub use controller::{
    DEFAULT_SEARCH_DEBOUNCE, DeleteGate, Dialog, FetchOutcome, ListContext, ListController,
    ListOptions, ListState,
};
