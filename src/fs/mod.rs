pub mod node;
pub mod operations;
pub mod tree;
pub mod watcher;
