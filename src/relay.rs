use crate::error::Result;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// forward splices the client and target streams.
///
/// Client -> target runs on its own task, target -> client on the caller,
/// and the caller's direction decides when the relay ends. Once the client
/// reaches EOF the target's write half is shut down and its answer is still
/// delivered until the target closes. If the target side ends first the
/// client -> target task is cancelled. Both connections are closed when this
/// returns.
pub async fn forward<C, T>(client: C, target: T) -> Result<()>
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut client_rd, mut client_wr) = tokio::io::split(client);
    let (mut target_rd, mut target_wr) = tokio::io::split(target);

    let mut upstream = tokio::spawn(async move {
        let copied = tokio::io::copy(&mut client_rd, &mut target_wr).await;
        let _ = target_wr.shutdown().await;
        copied
    });

    let outcome: io::Result<u64> = {
        let downstream = tokio::io::copy(&mut target_rd, &mut client_wr);
        tokio::pin!(downstream);

        tokio::select! {
            copied = &mut downstream => {
                upstream.abort();
                let _ = (&mut upstream).await;
                copied
            }
            joined = &mut upstream => {
                match joined {
                    Ok(Ok(n)) => {
                        debug!("client -> target finished: {n} bytes");
                        downstream.await
                    }
                    // A broken client side ends the relay
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(io::Error::other(e)),
                }
            }
        }
    };

    let _ = client_wr.shutdown().await;
    let n = outcome?;
    debug!("target -> client finished: {n} bytes");

    Ok(())
}
