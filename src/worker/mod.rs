mod worker;

pub use worker::run_task;
