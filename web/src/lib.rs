pub mod env;
pub mod handler;
pub mod request;
pub mod response;
pub mod testing;

pub use env::{Data, Env};
pub use handler::{
    cases, chain, endpoint, handler, match_path, method, run, Cases, Chain, HandlerResult, Next,
    WebHandler,
};
pub use request::Request;
pub use response::{encode_location, Response};
