pub mod current_caller;

pub use current_caller::CurrentCaller;
