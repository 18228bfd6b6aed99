//! Proxy handling
//!
//! - Loading and normalizing the proxy list file
//! - The shared rotating pool workers draw proxies from

mod list;
mod pool;

pub use list::{load_proxy_list, parse_proxy_list};
pub use pool::{ProxyLease, ProxyPool};
