// Interface adapters: wire protocol, sockets, remote clients and the render sink.

pub mod clients;
pub mod http;
pub mod net;
pub mod protocol;
pub mod render;
pub mod state;
pub mod utils;
