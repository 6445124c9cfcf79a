//! Concrete [`RemoteApi`](crate::remote::RemoteApi) transports

mod http;

pub use http::HttpRemote;
