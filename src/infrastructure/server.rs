use crate::application::SharedContext;
use crate::handlers::handle_request;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;

/// Serve HTTP on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, ctx: SharedContext, shutdown: F) -> Result<(), hyper::Error>
where
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_conn| {
        let ctx = ctx.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(ctx.clone(), req)))
        }
    });

    let server = Server::from_tcp(listener)?.serve(make_svc);
    tracing::info!(addr = %server.local_addr(), "Listening");

    server.with_graceful_shutdown(shutdown).await
}
