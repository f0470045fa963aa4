pub mod classifier;
pub mod config;
pub mod dataset;
pub mod decision_tree;
pub mod error;
pub mod features;
pub mod functions;
pub mod heart_data;
pub mod model;
pub mod node;
pub mod page;
pub mod pipeline;
pub mod random_forest;
pub mod scaler;
pub mod server;
pub mod training;
