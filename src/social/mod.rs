//! The social graph and engagement model: users, follow edges, messages and
//! likes. Every query returns a snapshot; nothing here holds a live view.

pub mod engagement;
pub mod graph;
pub mod users;

pub use engagement::LikeState;
