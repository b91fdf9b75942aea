/// REST APIサーバーモジュール
pub mod http;
pub mod router;

pub use http::{bind, serve};
pub use router::{dispatch, ApiResponse};
