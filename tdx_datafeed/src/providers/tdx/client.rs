//! TCP session with the TDX quote service.

use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use snafu::ResultExt;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tracing::debug;

use crate::{
    models::bar::RawBarRow,
    providers::{
        BarQuery, ConnectSnafu, ConnectTimeoutSnafu, ProtocolSnafu, ProviderError, QuoteSession,
        SessionConnector, TransportSnafu,
        tdx::protocol::{self, RESPONSE_HEADER_LEN, ResponseHeader, SETUP_PACKETS},
    },
};

/// Opens [`TdxSession`]s against one `host:port`.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    connect_timeout: Duration,
    requests_per_second: NonZeroU32,
}

impl TcpConnector {
    pub fn new(
        address: impl Into<String>,
        connect_timeout: Duration,
        requests_per_second: NonZeroU32,
    ) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            requests_per_second,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl SessionConnector for TcpConnector {
    type Session = TdxSession;

    async fn connect(&self) -> Result<TdxSession, ProviderError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                ConnectTimeoutSnafu {
                    address: self.address.clone(),
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                }
                .build()
            })?
            .context(ConnectSnafu {
                address: self.address.clone(),
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "could not disable Nagle on quote session");
        }

        let mut session = TdxSession {
            stream,
            rate_limiter: RateLimiter::direct(Quota::per_second(self.requests_per_second)),
        };
        session.handshake().await?;
        debug!(address = %self.address, "quote session established");
        Ok(session)
    }
}

/// One live connection. Requests go out one at a time, each waiting for the
/// rate limiter and then for its complete response.
pub struct TdxSession {
    stream: TcpStream,
    rate_limiter: DefaultDirectRateLimiter,
}

impl TdxSession {
    async fn handshake(&mut self) -> Result<(), ProviderError> {
        for packet in SETUP_PACKETS {
            self.call(packet).await?;
        }
        Ok(())
    }

    /// Send one packet and read back its (decompressed) response body.
    async fn call(&mut self, packet: &[u8]) -> Result<Vec<u8>, ProviderError> {
        self.rate_limiter.until_ready().await;
        self.stream.write_all(packet).await.context(TransportSnafu)?;

        let mut head = [0u8; RESPONSE_HEADER_LEN];
        self.stream
            .read_exact(&mut head)
            .await
            .context(TransportSnafu)?;
        let header = ResponseHeader::parse(&head).context(ProtocolSnafu)?;

        let mut body = vec![0u8; usize::from(header.zip_size)];
        self.stream
            .read_exact(&mut body)
            .await
            .context(TransportSnafu)?;
        protocol::inflate_body(&header, body).context(ProtocolSnafu)
    }
}

#[async_trait]
impl QuoteSession for TdxSession {
    async fn get_security_bars(
        &mut self,
        query: &BarQuery,
        offset: u32,
        count: u32,
    ) -> Result<Vec<RawBarRow>, ProviderError> {
        let packet = protocol::encode_bars_request(query, offset, count).context(ProtocolSnafu)?;
        let body = self.call(&packet).await?;
        let rows = protocol::decode_bars(&body, query.category).context(ProtocolSnafu)?;
        debug!(
            code = %query.code,
            market = query.market,
            category = query.category,
            offset,
            count,
            received = rows.len(),
            "fetched bar page"
        );
        Ok(rows)
    }

    async fn disconnect(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "quote session shutdown failed");
        }
    }
}
