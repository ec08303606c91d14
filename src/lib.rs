pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod movegen;
pub mod save;
pub mod session;
pub mod store;
pub mod web;

pub use board::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use history::*;
pub use movegen::*;
pub use save::*;
pub use session::*;
pub use store::*;
