pub mod gridsearchlog;
pub mod hyperparamgrid;
