//! Process-wide interceptor slots.
//!
//! Dispatchers built with [`make_handler`](crate::routing::make_handler) read a
//! snapshot of these slots on every request. Writes are expected at startup;
//! concurrent writers race and the last one wins.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use url::Url;

use crate::http::request::RouteRequest;
use crate::interceptors::{Interceptors, ResponseInterceptor};

static GLOBAL: LazyLock<ArcSwap<Interceptors>> =
    LazyLock::new(|| ArcSwap::from_pointee(Interceptors::default()));

/// Current process-wide interceptors.
pub fn global() -> Arc<Interceptors> {
    GLOBAL.load_full()
}

fn update(apply: impl Fn(&mut Interceptors)) {
    GLOBAL.rcu(|current| {
        let mut next = Interceptors::clone(current);
        apply(&mut next);
        next
    });
}

pub fn set_error_interceptor<F>(f: F)
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    let f: Arc<dyn Fn(&str, &str) + Send + Sync> = Arc::new(f);
    update(|slots| slots.set_error(Arc::clone(&f)));
}

pub fn set_request_interceptor<F>(f: F)
where
    F: Fn(&RouteRequest, &Url) + Send + Sync + 'static,
{
    let f: Arc<dyn Fn(&RouteRequest, &Url) + Send + Sync> = Arc::new(f);
    update(|slots| slots.set_request(Arc::clone(&f)));
}

/// Replace the process-wide response interceptor, e.g. with [`enable_cors`](super::enable_cors).
pub fn set_response_interceptor(f: ResponseInterceptor) {
    update(|slots| slots.set_response(Arc::clone(&f)));
}
