//! Xiangqi (Chinese chess) variant support: board geometry, material signatures, move
//! generation, the index codec and the retrograde generator, mirroring the orthodox-chess
//! modules at the crate root. The key/data verifier and the stats report live in `cli`, exactly
//! where their chess counterparts do.

pub mod board;
pub mod file_handler;
pub mod generation;
pub mod indexer;
pub mod material;
pub mod moves;
pub mod position;

pub use board::Square;
pub use file_handler::{XqDescendants, XqFileHandler, XqMaterialWinner};
pub use generation::{XqOutcomeStats, XqTableBaseBuilder};
pub use indexer::XqIndexer;
pub use material::{XqMaterial, XqMaterialSide, XqNameError, XqRole};
pub use moves::{XqBoard, XqPiece};
pub use position::XqPosition;
