pub mod dispatcher;
pub mod stream;
