//! Request handlers.

pub mod health;
pub mod history;
pub mod outputs;
pub mod progress;
pub mod upload;

pub use health::*;
pub use history::*;
pub use outputs::*;
pub use progress::*;
pub use upload::*;
