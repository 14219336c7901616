pub mod models;
pub mod utils;

// Data models and formatting helpers shared by the engine and whatever
// presentation layer consumes its tables. No pipeline logic lives here.
